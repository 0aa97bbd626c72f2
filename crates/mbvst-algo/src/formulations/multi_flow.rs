//! Multi-commodity flow formulation.
//!
//! One commodity per destination `k ≠ 1`: vertex 1 sends a unit of commodity
//! `k` to `k`, every other vertex conserves it, and each commodity may only
//! travel on selected arcs (`f[a, k] ≤ x[a]`). Tighter LP relaxation than the
//! single-commodity model at the price of `2m · (n - 1)` flow columns.

use super::single_flow::SOURCE;
use super::{
    add_arc_branch_constraints, add_arc_selection, add_branch_flags, add_edge_count,
    add_single_parent, minimise_branch_flags, net_outflow, require_vertices, EdgeVariables,
    FormulationConfig, FormulationError, FormulationModel, MbvstFormulation,
};
use crate::milp::{ConstraintSense, LinearExpr, MilpModel, VarMap};
use mbvst_core::{ArcKey, Graph, VertexId};

#[derive(Debug, Clone, Copy, Default)]
pub struct MultiFlowFormulation;

impl MbvstFormulation for MultiFlowFormulation {
    fn id(&self) -> &str {
        "multi-flow"
    }

    fn build(&self, graph: &Graph, _config: &FormulationConfig) -> Result<FormulationModel, FormulationError> {
        require_vertices(graph)?;
        let n = graph.vertex_count();
        let source = VertexId::new(SOURCE);
        let arcs = graph.arcs();

        let mut model = MilpModel::new("mbvst_multi_flow");
        let x = add_arc_selection(&mut model, graph);
        let mut f: VarMap<(ArcKey, VertexId)> = VarMap::new();
        for commodity in graph.vertices().filter(|k| *k != source) {
            for arc in &arcs {
                let name = format!("f_{}_{}_k{}", arc.tail, arc.head, commodity);
                f.insert((*arc, commodity), model.add_continuous(name, 0.0, None));
            }
        }
        let flags = add_branch_flags(&mut model, graph, "y");
        minimise_branch_flags(&mut model, &flags);

        add_single_parent(&mut model, graph, &x, source);
        add_edge_count(&mut model, x.values().collect(), n);

        for commodity in graph.vertices().filter(|k| *k != source) {
            for vertex in graph.vertices() {
                let rhs = if vertex == source {
                    1.0
                } else if vertex == commodity {
                    -1.0
                } else {
                    0.0
                };
                model.add_constraint(
                    format!("balance_{vertex}_k{commodity}"),
                    net_outflow(graph, vertex, |arc| f[&(arc, commodity)]),
                    ConstraintSense::Eq,
                    rhs,
                );
            }
            for arc in &arcs {
                model.add_constraint(
                    format!("capacity_{}_{}_k{}", arc.tail, arc.head, commodity),
                    LinearExpr::from(f[&(*arc, commodity)]).with_term(-1.0, x[arc]),
                    ConstraintSense::LessEq,
                    0.0,
                );
            }
        }

        add_arc_branch_constraints(&mut model, graph, &x, &flags);

        Ok(FormulationModel {
            model,
            selection: EdgeVariables::Directed(x),
            branch: flags,
        })
    }
}
