//! Cycle-relaxation repair loop.
//!
//! Instead of forbidding every subtour up front, the loop repeatedly solves a
//! small model that only constrains the cycle basis of the current working
//! graph, then repairs what the relaxation left disconnected:
//!
//! ```text
//! Init ─▶ Relax ─▶ Check ──connected──▶ Tree
//!           ▲        │
//!           │        ├──budget spent──▶ BudgetExhausted
//!           │        ├──max iterations─▶ IterationLimit
//!           └─Repair◀┘
//! ```
//!
//! - **Relax** builds [`Relaxation`] for the working graph, submits it with a
//!   per-iteration budget and removes every edge whose `x` is exactly 0.
//! - **Check** tests whether the working graph is a single component.
//! - **Repair** re-adds every original edge joining two different components
//!   (see [`repair`]).
//!
//! The working graph is a private copy of the caller's graph. A non-optimal
//! oracle answer ends the loop with [`LoopStatus::OracleFailed`]. Degraded
//! outcomes are ordinary results; only [`LoopStatus::Tree`] guarantees a
//! spanning tree.

mod relax;
mod repair;

pub use relax::{Relaxation, RELAXATION_ID};
pub use repair::{plan_repair, repair};

use crate::milp::{MilpOracle, OracleStatus};
use crate::solution::MbvstSolution;
use mbvst_core::{EdgeKey, Graph, GraphError, MbvstError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Repair loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleSolverConfig {
    /// Overall wall-clock budget (seconds)
    pub time_limit_secs: f64,
    /// Oracle budget per Relax step (seconds), capped by what is left overall
    pub iteration_time_limit_secs: f64,
    /// Stop after this many Relax steps
    pub max_iterations: Option<usize>,
}

impl Default for CycleSolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 300.0,
            iteration_time_limit_secs: 10.0,
            max_iterations: None,
        }
    }
}

impl CycleSolverConfig {
    pub fn validate(&self) -> Result<(), CycleSolveError> {
        self.budgets().map(|_| ())
    }

    fn budgets(&self) -> Result<(Duration, Duration), CycleSolveError> {
        let overall = Duration::try_from_secs_f64(self.time_limit_secs).map_err(|err| {
            CycleSolveError::InvalidConfig(format!("time_limit_secs = {}: {err}", self.time_limit_secs))
        })?;
        let per_iteration = Duration::try_from_secs_f64(self.iteration_time_limit_secs).map_err(|err| {
            CycleSolveError::InvalidConfig(format!(
                "iteration_time_limit_secs = {}: {err}",
                self.iteration_time_limit_secs
            ))
        })?;
        if self.max_iterations == Some(0) {
            return Err(CycleSolveError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        Ok((overall, per_iteration))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CycleSolveError {
    #[error("invalid repair loop configuration: {0}")]
    InvalidConfig(String),
    #[error("graph has no vertices")]
    EmptyGraph,
    #[error("instance cannot be reconnected: {components} components share no edge in the input graph")]
    Unreachable { components: usize },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<CycleSolveError> for MbvstError {
    fn from(err: CycleSolveError) -> Self {
        match err {
            CycleSolveError::InvalidConfig(_) => MbvstError::Config(err.to_string()),
            CycleSolveError::EmptyGraph | CycleSolveError::Unreachable { .. } => {
                MbvstError::Validation(err.to_string())
            }
            CycleSolveError::Graph(inner) => MbvstError::Graph(inner),
        }
    }
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    /// The working graph is a spanning tree.
    Tree,
    /// The overall budget ran out before a tree emerged.
    BudgetExhausted,
    /// `max_iterations` Relax steps ran without producing a tree.
    IterationLimit,
    /// The oracle returned no optimal assignment.
    OracleFailed,
}

impl LoopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopStatus::Tree => "tree",
            LoopStatus::BudgetExhausted => "budget_exhausted",
            LoopStatus::IterationLimit => "iteration_limit",
            LoopStatus::OracleFailed => "oracle_failed",
        }
    }
}

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one Relax (and possibly Repair) step did.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    /// 1-based
    pub index: usize,
    pub basis_cycles: usize,
    pub removed_edges: Vec<EdgeKey>,
    pub selected_edges: usize,
    pub components_after_relax: usize,
    pub added_edges: Vec<EdgeKey>,
    pub components_after_repair: usize,
    pub objective: f64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub status: LoopStatus,
    /// Working graph after the last Relax step, or a copy of the input if no
    /// assignment was ever obtained
    pub graph: Graph,
    /// Last assignment obtained
    pub solution: Option<MbvstSolution>,
    pub iterations: Vec<IterationRecord>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn is_tree(&self) -> bool {
        self.status == LoopStatus::Tree
    }

    pub fn objective(&self) -> Option<f64> {
        self.solution.as_ref().map(|s| s.objective)
    }

    /// Selected-edge assignment, objective value and resulting graph.
    pub fn into_parts(self) -> (Option<BTreeMap<EdgeKey, f64>>, Option<f64>, Graph) {
        let objective = self.objective();
        (self.solution.map(|s| s.edge_values), objective, self.graph)
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str("Cycle-relaxation repair loop\n");
        s.push_str(&format!("  Status:          {}\n", self.status));
        s.push_str(&format!("  Iterations:      {}\n", self.iterations.len()));
        match self.objective() {
            Some(objective) => s.push_str(&format!("  Branch vertices: {}\n", objective.round())),
            None => s.push_str("  Branch vertices: n/a\n"),
        }
        s.push_str(&format!(
            "  Graph:           {} vertices, {} edges, {} component(s)\n",
            self.graph.vertex_count(),
            self.graph.edge_count(),
            self.graph.component_count()
        ));
        s.push_str(&format!("  Elapsed:         {:.3}s\n", self.elapsed.as_secs_f64()));
        s
    }
}

/// Run Relax → Check → Repair on a private copy of `original`.
///
/// Empty or disconnected inputs and invalid configurations fail before the
/// oracle is called. The loop checks the overall budget only between oracle
/// calls; a call that overruns its own budget is waited for.
pub fn solve_by_cycles(
    original: &Graph,
    oracle: &dyn MilpOracle,
    config: &CycleSolverConfig,
) -> Result<CycleReport, CycleSolveError> {
    let (budget, per_iteration) = config.budgets()?;
    if original.vertex_count() == 0 {
        return Err(CycleSolveError::EmptyGraph);
    }
    let components = original.component_count();
    if components > 1 {
        return Err(CycleSolveError::Unreachable { components });
    }

    let start = Instant::now();
    let n = original.vertex_count();
    let mut working = original.clone();
    let mut last_relaxed: Option<Graph> = None;
    let mut last_solution: Option<MbvstSolution> = None;
    let mut iterations: Vec<IterationRecord> = Vec::new();
    info!(
        vertices = n,
        edges = original.edge_count(),
        oracle = oracle.id(),
        "starting cycle-relaxation repair loop"
    );

    let finish = |status: LoopStatus,
                  graph: Graph,
                  solution: Option<MbvstSolution>,
                  iterations: Vec<IterationRecord>| CycleReport {
        status,
        graph,
        solution,
        iterations,
        elapsed: start.elapsed(),
    };

    let mut index = 0;
    loop {
        index += 1;
        let span = info_span!("cycle_iteration", iteration = index);
        let _guard = span.enter();

        let call_budget = per_iteration.min(budget.saturating_sub(start.elapsed()));
        let relaxation = Relaxation::build(&working, original);
        debug!(
            basis = relaxation.basis_len(),
            edges = working.edge_count(),
            budget_secs = call_budget.as_secs_f64(),
            "relax"
        );

        let outcome = oracle.solve(relaxation.model(), call_budget);
        let assignment = match (outcome.status(), outcome.assignment()) {
            (OracleStatus::Optimal, Some(assignment)) => assignment,
            (status, _) => {
                warn!(
                    %status,
                    message = outcome.message().unwrap_or(""),
                    "oracle returned no usable assignment"
                );
                let graph = last_relaxed.unwrap_or_else(|| original.clone());
                return Ok(finish(LoopStatus::OracleFailed, graph, last_solution, iterations));
            }
        };

        let solution = relaxation.solution(assignment, outcome.solve_time(), n);
        let removed = relaxation.apply(&mut working, assignment);
        let components_after_relax = working.component_count();
        let mut record = IterationRecord {
            index,
            basis_cycles: relaxation.basis_len(),
            removed_edges: removed,
            selected_edges: solution.selected_edges().len(),
            components_after_relax,
            added_edges: Vec::new(),
            components_after_repair: components_after_relax,
            objective: solution.objective,
            elapsed: Duration::ZERO,
        };
        debug!(
            removed = record.removed_edges.len(),
            selected = record.selected_edges,
            components = components_after_relax,
            objective = solution.objective,
            "check"
        );
        last_solution = Some(solution);

        if components_after_relax == 1 {
            record.elapsed = start.elapsed();
            iterations.push(record);
            info!(iterations = index, "spanning tree found");
            return Ok(finish(LoopStatus::Tree, working, last_solution, iterations));
        }

        let degraded = if start.elapsed() >= budget {
            Some(LoopStatus::BudgetExhausted)
        } else if config.max_iterations.is_some_and(|max| index >= max) {
            Some(LoopStatus::IterationLimit)
        } else {
            None
        };
        if let Some(status) = degraded {
            record.elapsed = start.elapsed();
            iterations.push(record);
            warn!(%status, components = components_after_relax, "stopping before a tree was found");
            return Ok(finish(status, working, last_solution, iterations));
        }

        last_relaxed = Some(working.clone());
        record.added_edges = repair(&mut working, original)?;
        record.components_after_repair = working.component_count();
        record.elapsed = start.elapsed();
        debug!(
            added = record.added_edges.len(),
            components = record.components_after_repair,
            "repair"
        );
        iterations.push(record);
    }
}
