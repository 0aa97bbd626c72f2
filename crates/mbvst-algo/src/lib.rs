//! # mbvst-algo: solvers for the Minimum Branch Vertices Spanning Tree problem
//!
//! A branch vertex is a vertex of degree at least 3 in a spanning tree. This
//! crate searches for spanning trees with as few branch vertices as possible,
//! two ways:
//!
//! | Entry point | Description |
//! |-------------|-------------|
//! | [`solve_formulation`] | One exact MILP solve with one of four encodings ([`FormulationKind`]) |
//! | [`solve_by_cycles`] | Cycle-relaxation repair loop: small relaxations plus graph repair under a time budget |
//!
//! ## Architecture
//!
//! - **[`milp::MilpModel`]**: solver-independent model (variables, constraints, objective)
//! - **[`milp::MilpOracle`]**: the solver boundary; [`milp::GoodLpOracle`] runs `good_lp`
//!   back-ends selected by [`milp::MilpBackendKind`]
//! - **[`formulations::MbvstFormulation`]**: strategy trait implemented by each encoding
//! - **[`cycles`]**: Relax → Check → Repair state machine
//!
//! ## Example
//!
//! ```no_run
//! use mbvst_algo::{solve_by_cycles, CycleSolverConfig, GoodLpOracle};
//! use mbvst_core::Graph;
//!
//! let graph = Graph::from_edges(4, [(1, 2), (2, 3), (3, 4), (4, 1)])?;
//! let report = solve_by_cycles(&graph, &GoodLpOracle::default(), &CycleSolverConfig::default())?;
//! assert!(report.is_tree());
//! println!("{}", report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cycles;
pub mod formulations;
pub mod milp;
pub mod solution;
pub mod test_utils;
pub mod validation;

pub use cycles::{
    solve_by_cycles, CycleReport, CycleSolveError, CycleSolverConfig, IterationRecord, LoopStatus,
};
pub use formulations::{
    solve_formulation, FormulationConfig, FormulationError, FormulationKind, MbvstFormulation,
};
pub use milp::{GoodLpOracle, MilpBackendKind, MilpOracle, OracleOutcome, OracleStatus};
pub use solution::MbvstSolution;
pub use validation::{check_solution, TreeCheck};
