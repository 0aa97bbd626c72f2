use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueHint};
use mbvst_algo::FormulationKind;
use std::fmt;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about = "Minimum branch vertices spanning trees via MILP", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve an instance with one formulation or the cycle-relaxation loop
    Solve(SolveArgs),
    /// Graph utilities
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Path to the instance file (header `n m`, then one `u v` edge per line)
    #[arg(value_hint = ValueHint::FilePath)]
    pub instance: String,
    /// Method: exponential, flow, multi-flow, martin, cycles
    #[arg(long, default_value = "cycles")]
    pub method: String,
    /// MILP back-end (microlp, highs, coin_cbc); overrides the config file
    #[arg(long)]
    pub backend: Option<String>,
    /// Overall time limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Per-iteration oracle budget in seconds (cycles only)
    #[arg(long)]
    pub iteration_time_limit: Option<f64>,
    /// Stop the cycle loop after this many iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,
    /// Largest graph accepted by the exponential formulation
    #[arg(long)]
    pub max_subset_vertices: Option<usize>,
    /// TOML file with [formulation], [cycles] and `backend`
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,
    /// Write the result as JSON
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: Option<String>,
    /// Write the submitted model in LP format
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub write_lp: Option<String>,
    /// Write a Graphviz rendering with the selected edges highlighted
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub dot: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Graph stats summary
    Stats {
        /// Path to the instance file
        instance: String,
    },
    /// List connected components
    Components {
        /// Path to the instance file
        instance: String,
    },
    /// Export graph to various formats
    Export {
        /// Path to the instance file
        instance: String,
        /// Output format (e.g., graphviz)
        #[arg(long, default_value = "graphviz")]
        format: String,
        /// Optional output file path
        #[arg(short, long)]
        out: Option<String>,
    },
}

/// What `mbvst solve` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    Formulation(FormulationKind),
    Cycles,
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveMethod::Formulation(kind) => write!(f, "{kind}"),
            SolveMethod::Cycles => f.write_str("cycles"),
        }
    }
}

impl FromStr for SolveMethod {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        if normalized == "cycles" || normalized == "cycle-relaxation" {
            return Ok(SolveMethod::Cycles);
        }
        normalized
            .parse::<FormulationKind>()
            .map(SolveMethod::Formulation)
            .map_err(|_| {
                anyhow!(
                    "unknown method '{}'; supported values: {}, cycles",
                    value,
                    FormulationKind::available().join(", ")
                )
            })
    }
}
