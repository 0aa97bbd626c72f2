//! # mbvst-core: graph model for the Minimum Branch Vertices Spanning Tree engine
//!
//! Provides the vertex/edge identifiers, the petgraph-backed [`Graph`] with the
//! queries the solvers rely on (degree, induced edges, connected components,
//! cycle basis, forest and tree tests), graph statistics and DOT export, the
//! instance-file reader and the unified [`MbvstError`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mbvst_core::{EdgeKey, Graph};
//!
//! let graph = Graph::from_edges(4, [(1, 2), (2, 3), (3, 4), (4, 1)]).unwrap();
//! assert_eq!(graph.cycle_basis().len(), 1);
//! assert!(graph.contains_edge(EdgeKey::from_pair(4, 1)));
//! assert!(!graph.is_tree());
//! ```

pub mod error;
pub mod graph;
pub mod graph_utils;
pub mod io;

pub use error::{MbvstError, MbvstResult};
pub use graph::{ArcKey, Cycle, EdgeKey, Graph, GraphError, VertexId};
pub use graph_utils::*;
