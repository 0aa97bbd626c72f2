use crate::graph::{EdgeKey, Graph, VertexId};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Summary statistics produced by `graph stats` (density/degree/connected components).
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub density: f64,
    /// `m - n + c`: size of any cycle basis.
    pub cyclomatic_number: usize,
}

/// Component summary used in `graph components`.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSummary {
    pub component_id: usize,
    pub vertex_count: usize,
    pub members: Vec<VertexId>,
}

/// Calculates graph-level statistics such as density, degree distribution and component counts.
pub fn graph_stats(graph: &Graph) -> GraphStats {
    let vertex_count = graph.vertex_count();
    let edge_count = graph.edge_count();
    let degrees: Vec<usize> = graph.vertices().map(|v| graph.degree(v)).collect();
    let min_degree = degrees.iter().copied().min().unwrap_or(0);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let avg_degree = if vertex_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / vertex_count as f64
    };
    let density = if vertex_count < 2 {
        0.0
    } else {
        2.0 * edge_count as f64 / (vertex_count as f64 * (vertex_count as f64 - 1.0))
    };
    let connected_components = graph.component_count();
    GraphStats {
        vertex_count,
        edge_count,
        connected_components,
        min_degree,
        avg_degree,
        max_degree,
        density,
        cyclomatic_number: (edge_count + connected_components).saturating_sub(vertex_count),
    }
}

pub fn component_summary(graph: &Graph) -> Vec<ComponentSummary> {
    graph
        .connected_components()
        .into_iter()
        .enumerate()
        .map(|(component_id, members)| ComponentSummary {
            component_id,
            vertex_count: members.len(),
            members: members.into_iter().collect(),
        })
        .collect()
}

/// Export the graph to a DOT string (Graphviz). Edges in `highlight` are drawn bold.
pub fn export_graph(
    graph: &Graph,
    format: &str,
    highlight: Option<&BTreeSet<EdgeKey>>,
) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(graph, highlight)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(graph: &Graph, highlight: Option<&BTreeSet<EdgeKey>>) -> String {
    let mut buffer = String::new();
    buffer.push_str("graph mbvst {\n");
    for vertex in graph.vertices() {
        buffer.push_str(&format!("  v{vertex} [label=\"{vertex}\"];\n"));
    }
    for edge in graph.edges() {
        let (u, v) = edge.endpoints();
        match highlight {
            Some(selected) if selected.contains(&edge) => {
                buffer.push_str(&format!("  v{u} -- v{v} [penwidth=3];\n"));
            }
            Some(_) => buffer.push_str(&format!("  v{u} -- v{v} [style=dashed];\n")),
            None => buffer.push_str(&format!("  v{u} -- v{v};\n")),
        }
    }
    buffer.push('}');
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_for_triangle_with_pendant() {
        let graph = Graph::from_edges(4, [(1, 2), (2, 3), (1, 3), (3, 4)]).unwrap();
        let stats = graph_stats(&graph);
        assert_eq!(stats.vertex_count, 4);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.connected_components, 1);
        assert_eq!(stats.min_degree, 1);
        assert_eq!(stats.max_degree, 3);
        assert!((stats.avg_degree - 2.0).abs() < 1e-12);
        assert_eq!(stats.cyclomatic_number, 1);
    }

    #[test]
    fn component_summary_lists_members() {
        let graph = Graph::from_edges(5, [(1, 2), (4, 5)]).unwrap();
        let summary = component_summary(&graph);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[2].members, vec![VertexId::new(4), VertexId::new(5)]);
    }

    #[test]
    fn dot_export_marks_highlighted_edges() {
        let graph = Graph::from_edges(3, [(1, 2), (2, 3), (1, 3)]).unwrap();
        let tree: BTreeSet<EdgeKey> = [EdgeKey::from_pair(1, 2), EdgeKey::from_pair(2, 3)]
            .into_iter()
            .collect();
        let dot = export_graph(&graph, "dot", Some(&tree)).unwrap();
        assert!(dot.starts_with("graph mbvst {"));
        assert!(dot.contains("v1 -- v2 [penwidth=3];"));
        assert!(dot.contains("v1 -- v3 [style=dashed];"));
        assert!(export_graph(&graph, "gexf", None).is_err());
    }
}
