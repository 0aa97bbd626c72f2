//! Single-commodity flow formulation.
//!
//! Vertex 1 ships one unit of flow to every other vertex over the selected
//! arcs. Each non-source vertex has exactly one selected incoming arc, and
//! flow may only use selected arcs (`x ≤ f ≤ (n - 1) · x`).

use super::{
    add_arc_branch_constraints, add_arc_selection, add_branch_flags, add_edge_count,
    add_single_parent, arc_variable_name, minimise_branch_flags, net_outflow, require_vertices,
    EdgeVariables, FormulationConfig, FormulationError, FormulationModel, MbvstFormulation,
};
use crate::milp::{ConstraintSense, LinearExpr, MilpModel, VarMap};
use mbvst_core::{Graph, VertexId};

/// Flow source.
pub(crate) const SOURCE: usize = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleFlowFormulation;

impl MbvstFormulation for SingleFlowFormulation {
    fn id(&self) -> &str {
        "flow"
    }

    fn build(&self, graph: &Graph, _config: &FormulationConfig) -> Result<FormulationModel, FormulationError> {
        require_vertices(graph)?;
        let n = graph.vertex_count();
        let source = VertexId::new(SOURCE);
        let capacity = (n - 1) as f64;

        let mut model = MilpModel::new("mbvst_single_flow");
        let x = add_arc_selection(&mut model, graph);
        let mut f = VarMap::new();
        for arc in graph.arcs() {
            f.insert(arc, model.add_continuous(arc_variable_name("f", arc), 0.0, None));
        }
        let flags = add_branch_flags(&mut model, graph, "y");
        minimise_branch_flags(&mut model, &flags);

        add_single_parent(&mut model, graph, &x, source);
        add_edge_count(&mut model, x.values().collect(), n);

        for vertex in graph.vertices() {
            let (label, rhs) = if vertex == source {
                ("source_supply".to_string(), capacity)
            } else {
                (format!("demand_{vertex}"), -1.0)
            };
            model.add_constraint(
                label,
                net_outflow(graph, vertex, |arc| f[&arc]),
                ConstraintSense::Eq,
                rhs,
            );
        }

        for (arc, xv) in &x {
            let fv = f[arc];
            model.add_constraint(
                format!("flow_floor_{}_{}", arc.tail, arc.head),
                LinearExpr::from(*xv).with_term(-1.0, fv),
                ConstraintSense::LessEq,
                0.0,
            );
            model.add_constraint(
                format!("flow_cap_{}_{}", arc.tail, arc.head),
                LinearExpr::from(fv).with_term(-capacity, *xv),
                ConstraintSense::LessEq,
                0.0,
            );
        }

        add_arc_branch_constraints(&mut model, graph, &x, &flags);

        Ok(FormulationModel {
            model,
            selection: EdgeVariables::Directed(x),
            branch: flags,
        })
    }
}
