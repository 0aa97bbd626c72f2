//! Martin's compact reformulation.
//!
//! `p[(i,k),j] = 1` reads "edge `ik` is in the tree and `j` lies on `k`'s side
//! of it". Two families pin the tree down without flow columns:
//!
//! - `p[(i,k),j] + p[(k,i),j] = x[ik]` for every edge `ik` and `j ∉ {i, k}`:
//!   a selected edge splits every other vertex to exactly one side;
//! - `Σ_{k ∈ N(i) \ {j}} p[(i,k),j] + x[ij] = 1` for every ordered pair
//!   `i ≠ j` (the `x` term only when `ij` is an edge): from `i` there is
//!   exactly one first step towards `j`.
//!
//! The second family ranges over all ordered pairs, not only over edges, so
//! that a component can never be separated from the rest of the graph.

use super::{
    add_branch_constraint, add_branch_flags, add_edge_count, edge_variable_name,
    minimise_branch_flags, require_vertices, EdgeVariables, FormulationConfig, FormulationError,
    FormulationModel, MbvstFormulation,
};
use crate::milp::{ConstraintSense, LinearExpr, MilpModel, VarMap};
use mbvst_core::{ArcKey, EdgeKey, Graph, VertexId};

#[derive(Debug, Clone, Copy, Default)]
pub struct MartinFormulation;

impl MbvstFormulation for MartinFormulation {
    fn id(&self) -> &str {
        "martin"
    }

    fn build(&self, graph: &Graph, _config: &FormulationConfig) -> Result<FormulationModel, FormulationError> {
        require_vertices(graph)?;
        let n = graph.vertex_count();

        let mut model = MilpModel::new("mbvst_martin");
        let mut x = VarMap::new();
        for edge in graph.edges() {
            x.insert(edge, model.add_binary(edge_variable_name("x", edge)));
        }
        let mut p: VarMap<(ArcKey, VertexId)> = VarMap::new();
        for arc in graph.arcs() {
            for j in graph.vertices().filter(|j| *j != arc.tail && *j != arc.head) {
                let name = format!("p_{}_{}_{}", arc.tail, arc.head, j);
                p.insert((arc, j), model.add_binary(name));
            }
        }
        let flags = add_branch_flags(&mut model, graph, "z");
        minimise_branch_flags(&mut model, &flags);
        add_edge_count(&mut model, x.values().collect(), n);

        for (edge, xv) in &x {
            let [forward, backward] = edge.arcs();
            for j in graph.vertices().filter(|j| !edge.contains(*j)) {
                model.add_constraint(
                    format!("side_{}_{}_{}", edge.u(), edge.v(), j),
                    LinearExpr::from(p[&(forward, j)])
                        .with_term(1.0, p[&(backward, j)])
                        .with_term(-1.0, *xv),
                    ConstraintSense::Eq,
                    0.0,
                );
            }
        }

        for i in graph.vertices() {
            let neighbors = graph.neighbors(i);
            for j in graph.vertices().filter(|j| *j != i) {
                let mut expr: LinearExpr = neighbors
                    .iter()
                    .filter(|k| **k != j)
                    .map(|k| p[&(ArcKey::new(i, *k), j)])
                    .collect();
                if let Some(direct) = x.get(&EdgeKey::new(i, j)) {
                    expr.add_term(1.0, direct);
                }
                model.add_constraint(format!("route_{i}_{j}"), expr, ConstraintSense::Eq, 1.0);
            }
        }

        for vertex in graph.vertices() {
            let incident: LinearExpr = graph.incident_edges(vertex).iter().map(|e| x[e]).collect();
            add_branch_constraint(&mut model, vertex, incident, graph.degree(vertex), flags[&vertex]);
        }

        Ok(FormulationModel {
            model,
            selection: EdgeVariables::Undirected(x),
            branch: flags,
        })
    }
}
