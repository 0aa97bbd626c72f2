//! Unified error type for the MBVST crates.
//!
//! Domain errors (graph invariants, formulation and repair-loop failures)
//! convert into [`MbvstError`] so callers can propagate them with `?` at API
//! boundaries.
//!
//! # Example
//!
//! ```ignore
//! use mbvst_core::{MbvstResult, io::read_instance};
//!
//! fn count_edges(path: &str) -> MbvstResult<usize> {
//!     let graph = read_instance(path)?;
//!     Ok(graph.edge_count())
//! }
//! ```

use crate::graph::GraphError;
use thiserror::Error;

/// Unified error type for all MBVST operations.
#[derive(Error, Debug)]
pub enum MbvstError {
    /// I/O errors (instance files, output files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Instance or configuration parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Graph invariant violations
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Input validation errors (disconnected or empty instances)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using MbvstError.
pub type MbvstResult<T> = Result<T, MbvstError>;

impl From<anyhow::Error> for MbvstError {
    fn from(err: anyhow::Error) -> Self {
        MbvstError::Other(err.to_string())
    }
}

impl From<String> for MbvstError {
    fn from(s: String) -> Self {
        MbvstError::Other(s)
    }
}

impl From<&str> for MbvstError {
    fn from(s: &str) -> Self {
        MbvstError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for MbvstError {
    fn from(err: serde_json::Error) -> Self {
        MbvstError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::VertexId;

    #[test]
    fn test_error_display() {
        let err = MbvstError::Solver("no integer solution".into());
        assert!(err.to_string().contains("Solver error"));
        assert!(err.to_string().contains("no integer solution"));
    }

    #[test]
    fn test_graph_error_conversion() {
        let err: MbvstError = GraphError::SelfLoop(VertexId::new(4)).into();
        assert!(matches!(err, MbvstError::Graph(_)));
        assert!(err.to_string().contains("self-loop on vertex 4"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MbvstError = io_err.into();
        assert!(matches!(err, MbvstError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> MbvstResult<()> {
            Err(MbvstError::Validation("test".into()))
        }

        fn outer() -> MbvstResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
