//! MILP encodings of the minimum branch vertices spanning tree problem.
//!
//! Every formulation shares the same skeleton:
//!
//! - a binary edge-selection variable per edge (or per arc for the directed
//!   encodings) and a binary branch flag per vertex,
//! - the objective `min Σ flag[v]`,
//! - `Σ x = n - 1`,
//! - the branch constraint `Σ x(incident to v) - degree(v) · flag[v] ≤ 2`,
//!   where `degree` is the vertex degree in the input graph. It forces a flag
//!   to 1 once the tree-degree exceeds 2 and never forces it to 0.
//!
//! They differ in how acyclicity and connectivity are enforced:
//!
//! | Formulation | Mechanism | Size |
//! |-------------|-----------|------|
//! | [`SubsetFormulation`] | `Σ x[e ⊆ S] ≤ |S| - 1` for every vertex subset | O(2^n) constraints |
//! | [`SingleFlowFormulation`] | `n - 1` units of flow out of vertex 1 | O(n + m) |
//! | [`MultiFlowFormulation`] | one commodity per destination | O(n · m) |
//! | [`MartinFormulation`] | precedence variables `p[(i,k),j]` | O(n · m) binaries |
//!
//! A formulation builds its model once and [`solve_formulation`] submits it to
//! the oracle once. Oracle failures are reported untouched.

mod martin;
mod multi_flow;
mod single_flow;
mod subset;

pub use martin::MartinFormulation;
pub use multi_flow::MultiFlowFormulation;
pub use single_flow::SingleFlowFormulation;
pub use subset::SubsetFormulation;

use crate::milp::{
    Assignment, ConstraintSense, LinearExpr, MilpModel, MilpOracle, OracleStatus, VarId, VarMap,
};
use crate::solution::MbvstSolution;
use anyhow::anyhow;
use mbvst_core::{ArcKey, EdgeKey, Graph, MbvstError, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Subset enumeration never goes beyond this many vertices, whatever the
/// configuration says.
pub const SUBSET_VERTEX_CEILING: usize = 24;

/// Formulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulationConfig {
    /// Oracle time budget for the single solve (seconds)
    pub time_limit_secs: f64,
    /// Largest graph the exponential subset formulation accepts
    pub max_subset_vertices: usize,
}

impl Default for FormulationConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 60.0,
            max_subset_vertices: 16,
        }
    }
}

impl FormulationConfig {
    pub fn time_budget(&self) -> Result<Duration, FormulationError> {
        Duration::try_from_secs_f64(self.time_limit_secs).map_err(|err| {
            FormulationError::InvalidConfig(format!(
                "time_limit_secs = {}: {err}",
                self.time_limit_secs
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulationError {
    #[error("graph has no vertices")]
    EmptyGraph,
    #[error("{formulation} formulation accepts at most {max} vertices, graph has {vertices}")]
    TooManyVertices {
        formulation: String,
        vertices: usize,
        max: usize,
    },
    #[error("invalid formulation configuration: {0}")]
    InvalidConfig(String),
    #[error("{formulation}: oracle returned {status}: {message}")]
    NoSolution {
        formulation: String,
        status: OracleStatus,
        message: String,
    },
}

impl From<FormulationError> for MbvstError {
    fn from(err: FormulationError) -> Self {
        match err {
            FormulationError::EmptyGraph | FormulationError::TooManyVertices { .. } => {
                MbvstError::Validation(err.to_string())
            }
            FormulationError::InvalidConfig(_) => MbvstError::Config(err.to_string()),
            FormulationError::NoSolution { .. } => MbvstError::Solver(err.to_string()),
        }
    }
}

/// Edge-selection variables of a built model.
#[derive(Debug, Clone)]
pub enum EdgeVariables {
    Undirected(VarMap<EdgeKey>),
    /// Both orientations of every edge; an edge's value is the sum of its arcs.
    Directed(VarMap<ArcKey>),
}

impl EdgeVariables {
    pub fn edge_values(&self, assignment: &Assignment) -> BTreeMap<EdgeKey, f64> {
        let mut values = BTreeMap::new();
        match self {
            EdgeVariables::Undirected(map) => {
                for (edge, var) in map {
                    values.insert(*edge, assignment.value(*var));
                }
            }
            EdgeVariables::Directed(map) => {
                for (arc, var) in map {
                    *values.entry(arc.edge()).or_insert(0.0) += assignment.value(*var);
                }
            }
        }
        values
    }
}

/// A model ready for the oracle, with the handles needed to read it back.
#[derive(Debug, Clone)]
pub struct FormulationModel {
    pub model: MilpModel,
    pub selection: EdgeVariables,
    pub branch: VarMap<VertexId>,
}

impl FormulationModel {
    pub fn solution(
        &self,
        formulation: &str,
        status: OracleStatus,
        assignment: &Assignment,
        solve_time: Duration,
        vertex_count: usize,
    ) -> MbvstSolution {
        MbvstSolution {
            formulation: formulation.to_string(),
            status,
            objective: assignment.objective(),
            edge_values: self.selection.edge_values(assignment),
            branch_values: self
                .branch
                .iter()
                .map(|(vertex, var)| (*vertex, assignment.value(*var)))
                .collect(),
            solve_time,
            vertex_count,
        }
    }
}

/// Defines one MILP encoding of the problem (what to solve).
pub trait MbvstFormulation: Send + Sync {
    /// Unique identifier (e.g., "exponential", "flow")
    fn id(&self) -> &str;

    /// Build the complete model for `graph`.
    fn build(&self, graph: &Graph, config: &FormulationConfig) -> Result<FormulationModel, FormulationError>;
}

/// Build the model, submit it once, and read the assignment back.
pub fn solve_formulation(
    formulation: &dyn MbvstFormulation,
    graph: &Graph,
    oracle: &dyn MilpOracle,
    config: &FormulationConfig,
) -> Result<MbvstSolution, FormulationError> {
    let budget = config.time_budget()?;
    let built = formulation.build(graph, config)?;
    info!(
        formulation = formulation.id(),
        oracle = oracle.id(),
        variables = built.model.variable_count(),
        constraints = built.model.constraint_count(),
        "submitting model"
    );

    let outcome = oracle.solve(&built.model, budget);
    match outcome.assignment() {
        Some(assignment) => {
            let solution = built.solution(
                formulation.id(),
                outcome.status(),
                assignment,
                outcome.solve_time(),
                graph.vertex_count(),
            );
            info!(
                formulation = formulation.id(),
                status = %outcome.status(),
                objective = solution.objective,
                "model solved"
            );
            Ok(solution)
        }
        None => Err(FormulationError::NoSolution {
            formulation: formulation.id().to_string(),
            status: outcome.status(),
            message: outcome.message().unwrap_or("no assignment").to_string(),
        }),
    }
}

/// Registry of the built-in formulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulationKind {
    Exponential,
    SingleFlow,
    MultiFlow,
    Martin,
}

impl FormulationKind {
    pub const ALL: [FormulationKind; 4] = [
        FormulationKind::Exponential,
        FormulationKind::SingleFlow,
        FormulationKind::MultiFlow,
        FormulationKind::Martin,
    ];

    pub fn available() -> &'static [&'static str] {
        &["exponential", "flow", "multi-flow", "martin"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormulationKind::Exponential => "exponential",
            FormulationKind::SingleFlow => "flow",
            FormulationKind::MultiFlow => "multi-flow",
            FormulationKind::Martin => "martin",
        }
    }

    pub fn formulation(&self) -> Box<dyn MbvstFormulation> {
        match self {
            FormulationKind::Exponential => Box::new(SubsetFormulation),
            FormulationKind::SingleFlow => Box::new(SingleFlowFormulation),
            FormulationKind::MultiFlow => Box::new(MultiFlowFormulation),
            FormulationKind::Martin => Box::new(MartinFormulation),
        }
    }
}

impl fmt::Display for FormulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulationKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "exponential" | "subset" => Ok(FormulationKind::Exponential),
            "flow" | "single-flow" => Ok(FormulationKind::SingleFlow),
            "multi-flow" | "multiflow" => Ok(FormulationKind::MultiFlow),
            "martin" => Ok(FormulationKind::Martin),
            other => Err(anyhow!(
                "unknown formulation '{}'; supported values: {}",
                other,
                FormulationKind::available().join(", ")
            )),
        }
    }
}

// Building blocks shared by the four encodings and the cycle relaxation.

pub(crate) fn require_vertices(graph: &Graph) -> Result<(), FormulationError> {
    if graph.vertex_count() == 0 {
        Err(FormulationError::EmptyGraph)
    } else {
        Ok(())
    }
}

pub(crate) fn add_branch_flags(model: &mut MilpModel, graph: &Graph, prefix: &str) -> VarMap<VertexId> {
    let mut flags = VarMap::new();
    for vertex in graph.vertices() {
        flags.insert(vertex, model.add_binary(format!("{prefix}_{vertex}")));
    }
    flags
}

pub(crate) fn edge_variable_name(prefix: &str, edge: EdgeKey) -> String {
    format!("{}_{}_{}", prefix, edge.u(), edge.v())
}

pub(crate) fn arc_variable_name(prefix: &str, arc: ArcKey) -> String {
    format!("{}_{}_{}", prefix, arc.tail, arc.head)
}

/// `Σ x[incident] - degree · flag ≤ 2`
pub(crate) fn add_branch_constraint(
    model: &mut MilpModel,
    vertex: VertexId,
    incident: LinearExpr,
    degree: usize,
    flag: VarId,
) {
    model.add_constraint(
        format!("branch_{vertex}"),
        incident.with_term(-(degree as f64), flag),
        ConstraintSense::LessEq,
        2.0,
    );
}

pub(crate) fn add_edge_count(model: &mut MilpModel, selection: LinearExpr, vertex_count: usize) {
    model.add_constraint(
        "edge_count",
        selection,
        ConstraintSense::Eq,
        vertex_count.saturating_sub(1) as f64,
    );
}

pub(crate) fn minimise_branch_flags(model: &mut MilpModel, flags: &VarMap<VertexId>) {
    model.minimise(flags.values().collect());
}

/// Binary arc variables for both orientations of every edge.
pub(crate) fn add_arc_selection(model: &mut MilpModel, graph: &Graph) -> VarMap<ArcKey> {
    let mut arcs = VarMap::new();
    for arc in graph.arcs() {
        arcs.insert(arc, model.add_binary(arc_variable_name("x", arc)));
    }
    arcs
}

/// Branch constraints over arc variables: a vertex's tree-degree is the sum of
/// its incoming and outgoing selected arcs.
pub(crate) fn add_arc_branch_constraints(
    model: &mut MilpModel,
    graph: &Graph,
    arcs: &VarMap<ArcKey>,
    flags: &VarMap<VertexId>,
) {
    for vertex in graph.vertices() {
        let incident: LinearExpr = graph
            .incident_edges(vertex)
            .into_iter()
            .flat_map(|edge| edge.arcs())
            .map(|arc| arcs[&arc])
            .collect();
        add_branch_constraint(model, vertex, incident, graph.degree(vertex), flags[&vertex]);
    }
}

/// Every vertex other than `source` has exactly one selected incoming arc.
pub(crate) fn add_single_parent(
    model: &mut MilpModel,
    graph: &Graph,
    arcs: &VarMap<ArcKey>,
    source: VertexId,
) {
    for vertex in graph.vertices().filter(|v| *v != source) {
        let incoming: LinearExpr = graph
            .neighbors(vertex)
            .into_iter()
            .map(|tail| arcs[&ArcKey::new(tail, vertex)])
            .collect();
        model.add_constraint(
            format!("in_degree_{vertex}"),
            incoming,
            ConstraintSense::Eq,
            1.0,
        );
    }
}

/// `Σ f(out of v) - Σ f(into v)` for flow variables keyed by arc.
pub(crate) fn net_outflow<F>(graph: &Graph, vertex: VertexId, flow: F) -> LinearExpr
where
    F: Fn(ArcKey) -> VarId,
{
    let mut expr = LinearExpr::new();
    for other in graph.neighbors(vertex) {
        expr.add_term(1.0, flow(ArcKey::new(vertex, other)));
        expr.add_term(-1.0, flow(ArcKey::new(other, vertex)));
    }
    expr
}
