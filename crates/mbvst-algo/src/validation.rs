//! Independent check of a solution against the input graph.

use crate::solution::MbvstSolution;
use mbvst_core::{EdgeKey, Graph, VertexId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeCheck {
    pub selected_edges: usize,
    /// The selection is a spanning tree of the input vertex set
    pub spanning_tree: bool,
    /// Selected edges absent from the input graph
    pub foreign_edges: Vec<EdgeKey>,
    /// Vertices with tree-degree above 2
    pub branch_vertices: Vec<VertexId>,
    /// Branch vertices whose flag is 0
    pub unflagged_branch_vertices: Vec<VertexId>,
}

impl TreeCheck {
    pub fn is_valid(&self) -> bool {
        self.spanning_tree && self.foreign_edges.is_empty() && self.unflagged_branch_vertices.is_empty()
    }
}

/// Verify that `solution` selects a spanning tree of `original` and flags
/// every vertex of tree-degree above 2. The converse (a flag on a vertex of
/// tree-degree at most 2) is allowed.
pub fn check_solution(original: &Graph, solution: &MbvstSolution) -> TreeCheck {
    let selected = solution.selected_edges();
    let foreign_edges: Vec<EdgeKey> = selected
        .iter()
        .copied()
        .filter(|edge| !original.contains_edge(*edge))
        .collect();

    let mut tree = Graph::new(original.vertex_count());
    for edge in &selected {
        // ids outside the vertex set make the selection invalid
        if tree.add_edge(edge.u(), edge.v()).is_err() {
            return TreeCheck {
                selected_edges: selected.len(),
                spanning_tree: false,
                foreign_edges,
                branch_vertices: Vec::new(),
                unflagged_branch_vertices: Vec::new(),
            };
        }
    }

    let branch_vertices: Vec<VertexId> = tree.vertices().filter(|v| tree.degree(*v) > 2).collect();
    let unflagged_branch_vertices = branch_vertices
        .iter()
        .copied()
        .filter(|v| solution.branch_values.get(v).copied().unwrap_or(0.0) == 0.0)
        .collect();

    TreeCheck {
        selected_edges: selected.len(),
        spanning_tree: tree.is_tree(),
        foreign_edges,
        branch_vertices,
        unflagged_branch_vertices,
    }
}
