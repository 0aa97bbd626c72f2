//! Exponential subset formulation.
//!
//! Subtours are forbidden by one packing constraint per vertex subset. The
//! constraint family grows as `2^n`, so the graph size is checked against
//! [`FormulationConfig::max_subset_vertices`] before anything is generated.

use super::{
    add_branch_constraint, add_branch_flags, add_edge_count, edge_variable_name,
    minimise_branch_flags, require_vertices, EdgeVariables, FormulationConfig, FormulationError,
    FormulationModel, MbvstFormulation, SUBSET_VERTEX_CEILING,
};
use crate::milp::{ConstraintSense, LinearExpr, MilpModel, VarMap};
use mbvst_core::{EdgeKey, Graph};

#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetFormulation;

impl MbvstFormulation for SubsetFormulation {
    fn id(&self) -> &str {
        "exponential"
    }

    fn build(&self, graph: &Graph, config: &FormulationConfig) -> Result<FormulationModel, FormulationError> {
        require_vertices(graph)?;
        let n = graph.vertex_count();
        let max = config.max_subset_vertices.min(SUBSET_VERTEX_CEILING);
        if n > max {
            return Err(FormulationError::TooManyVertices {
                formulation: self.id().to_string(),
                vertices: n,
                max,
            });
        }

        let mut model = MilpModel::new("mbvst_exponential");
        let mut x = VarMap::new();
        for edge in graph.edges() {
            x.insert(edge, model.add_binary(edge_variable_name("x", edge)));
        }
        let flags = add_branch_flags(&mut model, graph, "y");
        minimise_branch_flags(&mut model, &flags);
        add_edge_count(&mut model, x.values().collect(), n);

        // bit i of a mask stands for vertex i + 1
        let edges: Vec<(EdgeKey, u32)> = graph
            .edges()
            .into_iter()
            .map(|edge| {
                let bits = (1u32 << (edge.u().value() - 1)) | (1u32 << (edge.v().value() - 1));
                (edge, bits)
            })
            .collect();
        for mask in 1u32..(1u32 << n) {
            let size = mask.count_ones();
            if size < 2 {
                continue;
            }
            let inside: LinearExpr = edges
                .iter()
                .filter(|(_, bits)| mask & bits == *bits)
                .map(|(edge, _)| x[edge])
                .collect();
            if inside.is_empty() {
                continue;
            }
            model.add_constraint(
                format!("subset_{mask:x}"),
                inside,
                ConstraintSense::LessEq,
                f64::from(size - 1),
            );
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
