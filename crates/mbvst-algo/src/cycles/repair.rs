//! Repair step: reconnect the components of the working graph.

use super::CycleSolveError;
use mbvst_core::{EdgeKey, Graph};
use petgraph::unionfind::UnionFind;
use std::collections::BTreeSet;

/// Edges of `original` whose endpoints lie in different components of
/// `working`: for every pair of components, every original edge between them.
///
/// Fails with [`CycleSolveError::Unreachable`] when those edges cannot join
/// all components into one.
pub fn plan_repair(working: &Graph, original: &Graph) -> Result<Vec<EdgeKey>, CycleSolveError> {
    let components = working.connected_components();
    if components.len() <= 1 {
        return Ok(Vec::new());
    }

    let mut label = vec![0usize; working.vertex_count() + 1];
    for (id, members) in components.iter().enumerate() {
        for vertex in members {
            label[vertex.value()] = id;
        }
    }

    let planned: Vec<EdgeKey> = original
        .edges()
        .into_iter()
        .filter(|edge| label[edge.u().value()] != label[edge.v().value()])
        .collect();

    let mut joined = UnionFind::<usize>::new(components.len());
    for edge in &planned {
        joined.union(label[edge.u().value()], label[edge.v().value()]);
    }
    let groups: BTreeSet<usize> = joined.into_labeling().into_iter().collect();
    if groups.len() > 1 {
        return Err(CycleSolveError::Unreachable {
            components: groups.len(),
        });
    }
    Ok(planned)
}

/// Apply [`plan_repair`] to `working`; returns the edges added.
pub fn repair(working: &mut Graph, original: &Graph) -> Result<Vec<EdgeKey>, CycleSolveError> {
    let planned = plan_repair(working, original)?;
    for edge in &planned {
        working.add_edge(edge.u(), edge.v())?;
    }
    Ok(planned)
}
