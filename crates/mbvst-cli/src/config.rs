//! Run configuration for `mbvst solve`.
//!
//! All sections are optional; missing keys take the library defaults:
//!
//! ```toml
//! backend = "microlp"
//!
//! [formulation]
//! time_limit_secs = 60.0
//! max_subset_vertices = 16
//!
//! [cycles]
//! time_limit_secs = 300.0
//! iteration_time_limit_secs = 10.0
//! max_iterations = 50
//! ```

use crate::cli::SolveArgs;
use anyhow::{Context, Result};
use mbvst_algo::{CycleSolverConfig, FormulationConfig, MilpBackendKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// MILP back-end name
    pub backend: Option<String>,
    pub formulation: FormulationConfig,
    pub cycles: CycleSolverConfig,
}

impl RunConfig {
    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// File values (if any) with command-line flags applied on top.
    pub fn resolve(args: &SolveArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(backend) = &args.backend {
            config.backend = Some(backend.clone());
        }
        if let Some(limit) = args.time_limit {
            config.formulation.time_limit_secs = limit;
            config.cycles.time_limit_secs = limit;
        }
        if let Some(limit) = args.iteration_time_limit {
            config.cycles.iteration_time_limit_secs = limit;
        }
        if let Some(max) = args.max_iterations {
            config.cycles.max_iterations = Some(max);
        }
        if let Some(max) = args.max_subset_vertices {
            config.formulation.max_subset_vertices = max;
        }
        Ok(config)
    }

    pub fn backend_kind(&self) -> Result<MilpBackendKind> {
        match &self.backend {
            Some(name) => name.parse::<MilpBackendKind>(),
            None => Ok(MilpBackendKind::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(config: Option<String>) -> SolveArgs {
        SolveArgs {
            instance: "g.txt".into(),
            method: "cycles".into(),
            backend: None,
            time_limit: None,
            iteration_time_limit: None,
            max_iterations: None,
            max_subset_vertices: None,
            config,
            out: None,
            write_lp: None,
            dot: None,
        }
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[cycles]\nmax_iterations = 7\n").unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.cycles.max_iterations, Some(7));
        assert_eq!(config.cycles.iteration_time_limit_secs, 10.0);
        assert_eq!(config.formulation, FormulationConfig::default());
        assert_eq!(config.backend_kind().unwrap(), MilpBackendKind::MicroLp);
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "backend = \"microlp\"\n[formulation]\ntime_limit_secs = 5.0\n[cycles]\ntime_limit_secs = 20.0\n",
        )
        .unwrap();
        let mut args = args(Some(path.to_string_lossy().into_owned()));
        args.time_limit = Some(1.5);
        args.max_subset_vertices = Some(8);
        let config = RunConfig::resolve(&args).unwrap();
        assert_eq!(config.formulation.time_limit_secs, 1.5);
        assert_eq!(config.cycles.time_limit_secs, 1.5);
        assert_eq!(config.formulation.max_subset_vertices, 8);
        assert_eq!(config.backend.as_deref(), Some("microlp"));
    }

    #[test]
    fn unknown_backend_is_reported() {
        let mut args = args(None);
        args.backend = Some("gurobi".into());
        let config = RunConfig::resolve(&args).unwrap();
        let err = config.backend_kind().unwrap_err().to_string();
        assert!(err.contains("gurobi"));
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[cycles\n").unwrap();
        let err = format!("{:#}", RunConfig::load(&path).unwrap_err());
        assert!(err.contains("bad.toml"));
    }
}
