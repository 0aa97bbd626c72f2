//! Relax step: the cycle-basis model of the current working graph.

use crate::formulations::{
    add_arc_selection, add_branch_constraint, add_branch_flags, add_edge_count,
    minimise_branch_flags, EdgeVariables, FormulationModel,
};
use crate::milp::{Assignment, ConstraintSense, LinearExpr, MilpModel, OracleStatus};
use crate::solution::MbvstSolution;
use mbvst_core::{EdgeKey, Graph};
use std::time::Duration;

pub const RELAXATION_ID: &str = "cycle-relaxation";

/// Model built from one snapshot of the working graph.
///
/// Arc variables come in pairs constrained equal; every sum below runs over
/// the canonical orientation of each edge. Only the cycles of a fundamental
/// basis are constrained, each to drop exactly one of its edges, so the
/// selection may still contain a cycle outside the basis and be disconnected.
#[derive(Debug, Clone)]
pub struct Relaxation {
    built: FormulationModel,
    basis_len: usize,
}

impl Relaxation {
    /// Build the model for `working`. Branch constraints use vertex degrees
    /// in `original`.
    pub fn build(working: &Graph, original: &Graph) -> Self {
        let n = working.vertex_count();
        let basis = working.cycle_basis();

        let mut model = MilpModel::new("mbvst_cycle_relaxation");
        let arcs = add_arc_selection(&mut model, working);
        let flags = add_branch_flags(&mut model, working, "y");
        minimise_branch_flags(&mut model, &flags);

        let canonical = |edge: EdgeKey| arcs[&edge.canonical_arc()];

        for edge in working.edges() {
            let [forward, backward] = edge.arcs();
            model.add_constraint(
                format!("pair_{}_{}", edge.u(), edge.v()),
                LinearExpr::from(arcs[&forward]).with_term(-1.0, arcs[&backward]),
                ConstraintSense::Eq,
                0.0,
            );
        }

        for (idx, cycle) in basis.iter().enumerate() {
            model.add_constraint(
                format!("cycle_{idx}"),
                cycle.edges().map(canonical).collect(),
                ConstraintSense::Eq,
                (cycle.len() - 1) as f64,
            );
        }

        add_edge_count(&mut model, working.edges().into_iter().map(canonical).collect(), n);

        for vertex in working.vertices() {
            let incident: LinearExpr = working.incident_edges(vertex).into_iter().map(canonical).collect();
            add_branch_constraint(&mut model, vertex, incident, original.degree(vertex), flags[&vertex]);
        }

        Relaxation {
            built: FormulationModel {
                model,
                selection: EdgeVariables::Directed(arcs),
                branch: flags,
            },
            basis_len: basis.len(),
        }
    }

    pub fn model(&self) -> &MilpModel {
        &self.built.model
    }

    /// Number of basis cycles constrained.
    pub fn basis_len(&self) -> usize {
        self.basis_len
    }

    /// Canonical-orientation value of every working edge.
    fn canonical_values(&self, assignment: &Assignment) -> Vec<(EdgeKey, f64)> {
        let EdgeVariables::Directed(arcs) = &self.built.selection else {
            return Vec::new();
        };
        arcs.iter()
            .filter(|(arc, _)| arc.tail < arc.head)
            .map(|(arc, var)| (arc.edge(), assignment.value(*var)))
            .collect()
    }

    pub fn solution(
        &self,
        assignment: &Assignment,
        solve_time: Duration,
        vertex_count: usize,
    ) -> MbvstSolution {
        MbvstSolution {
            formulation: RELAXATION_ID.to_string(),
            status: OracleStatus::Optimal,
            objective: assignment.objective(),
            edge_values: self.canonical_values(assignment).into_iter().collect(),
            branch_values: self
                .built
                .branch
                .iter()
                .map(|(vertex, var)| (*vertex, assignment.value(*var)))
                .collect(),
            solve_time,
            vertex_count,
        }
    }

    /// Remove every edge whose value is exactly zero; returns the removed edges.
    pub fn apply(&self, working: &mut Graph, assignment: &Assignment) -> Vec<EdgeKey> {
        let mut removed = Vec::new();
        for (edge, value) in self.canonical_values(assignment) {
            if value == 0.0 && working.remove_edge(edge) {
                removed.push(edge);
            }
        }
        removed
    }
}
