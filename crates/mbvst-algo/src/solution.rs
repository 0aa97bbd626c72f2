//! Solution types shared by the formulations and the repair loop.

use crate::milp::OracleStatus;
use mbvst_core::{EdgeKey, Graph, GraphError, VertexId};
use std::collections::BTreeMap;
use std::time::Duration;

/// Edge selection and branch flags read back from an oracle assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct MbvstSolution {
    /// Identifier of the model that produced this solution
    pub formulation: String,
    pub status: OracleStatus,
    /// Objective value reported for the assignment (number of branch flags set)
    pub objective: f64,
    /// Value of `x` per undirected edge of the solved graph
    pub edge_values: BTreeMap<EdgeKey, f64>,
    /// Value of the branch flag per vertex
    pub branch_values: BTreeMap<VertexId, f64>,
    pub solve_time: Duration,
    pub vertex_count: usize,
}

impl MbvstSolution {
    /// Edges whose value is not exactly zero.
    pub fn selected_edges(&self) -> Vec<EdgeKey> {
        self.edge_values
            .iter()
            .filter(|(_, value)| **value != 0.0)
            .map(|(edge, _)| *edge)
            .collect()
    }

    /// Vertices whose branch flag is not exactly zero.
    pub fn branch_vertices(&self) -> Vec<VertexId> {
        self.branch_values
            .iter()
            .filter(|(_, value)| **value != 0.0)
            .map(|(vertex, _)| *vertex)
            .collect()
    }

    /// Number of selected edges incident to `vertex`.
    pub fn tree_degree(&self, vertex: VertexId) -> usize {
        self.selected_edges()
            .into_iter()
            .filter(|edge| edge.contains(vertex))
            .count()
    }

    /// Graph over the same vertex set holding only the selected edges.
    pub fn to_graph(&self) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(self.vertex_count);
        for edge in self.selected_edges() {
            graph.add_edge(edge.u(), edge.v())?;
        }
        Ok(graph)
    }

    /// Generate a human-readable summary of the solution
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("MBVST solution ({})\n", self.formulation));
        s.push_str(&format!("  Status:          {}\n", self.status));
        s.push_str(&format!("  Branch vertices: {}\n", self.objective.round()));
        s.push_str(&format!(
            "  Selected edges:  {} of {}\n",
            self.selected_edges().len(),
            self.edge_values.len()
        ));
        s.push_str(&format!("  Solve time:      {:.3}s\n", self.solve_time.as_secs_f64()));
        let branches = self.branch_vertices();
        if !branches.is_empty() {
            let ids: Vec<String> = branches.iter().map(|v| v.to_string()).collect();
            s.push_str(&format!("  Flagged:         {}\n", ids.join(", ")));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_solution() -> MbvstSolution {
        let edge_values = [((1, 2), 1.0), ((1, 3), 1.0), ((1, 4), 1.0), ((2, 3), 0.0)]
            .into_iter()
            .map(|((a, b), value)| (EdgeKey::from_pair(a, b), value))
            .collect();
        let branch_values = [(1, 1.0), (2, 0.0), (3, 0.0), (4, 0.0)]
            .into_iter()
            .map(|(v, value)| (VertexId::new(v), value))
            .collect();
        MbvstSolution {
            formulation: "test".into(),
            status: OracleStatus::Optimal,
            objective: 1.0,
            edge_values,
            branch_values,
            solve_time: Duration::from_millis(3),
            vertex_count: 4,
        }
    }

    #[test]
    fn selection_and_degrees() {
        let solution = star_solution();
        assert_eq!(solution.selected_edges().len(), 3);
        assert_eq!(solution.branch_vertices(), vec![VertexId::new(1)]);
        assert_eq!(solution.tree_degree(VertexId::new(1)), 3);
        assert_eq!(solution.tree_degree(VertexId::new(3)), 1);
        assert!(solution.to_graph().unwrap().is_tree());
    }

    #[test]
    fn summary_mentions_flagged_vertices() {
        let summary = star_solution().summary();
        assert!(summary.contains("Branch vertices: 1"));
        assert!(summary.contains("Selected edges:  3 of 4"));
        assert!(summary.contains("Flagged:         1"));
    }
}
