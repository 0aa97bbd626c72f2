//! Simple undirected graphs over the vertex set `1..=n`.
//!
//! [`Graph`] wraps a petgraph [`UnGraphMap`] keyed by [`VertexId`] and adds the
//! queries the solving engine needs: degrees, induced edge sets, connected
//! components, a deterministic fundamental cycle basis and forest/tree tests.
//! All iteration orders are ascending by vertex id so that models built from
//! the same graph are identical from run to run.

use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use thiserror::Error;

/// 1-based vertex identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(usize);

impl VertexId {
    #[inline]
    pub fn new(value: usize) -> Self {
        VertexId(value)
    }

    #[inline]
    pub fn value(self) -> usize {
        self.0
    }
}

impl From<usize> for VertexId {
    fn from(value: usize) -> Self {
        VertexId(value)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unordered vertex pair. The smaller endpoint is always stored first, so two
/// keys built from `(a, b)` and `(b, a)` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeKey {
    u: VertexId,
    v: VertexId,
}

impl EdgeKey {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            EdgeKey { u: a, v: b }
        } else {
            EdgeKey { u: b, v: a }
        }
    }

    pub fn from_pair(a: usize, b: usize) -> Self {
        Self::new(VertexId::new(a), VertexId::new(b))
    }

    #[inline]
    pub fn u(self) -> VertexId {
        self.u
    }

    #[inline]
    pub fn v(self) -> VertexId {
        self.v
    }

    pub fn endpoints(self) -> (VertexId, VertexId) {
        (self.u, self.v)
    }

    pub fn contains(self, vertex: VertexId) -> bool {
        self.u == vertex || self.v == vertex
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint.
    pub fn other(self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.u {
            Some(self.v)
        } else if vertex == self.v {
            Some(self.u)
        } else {
            None
        }
    }

    /// The orientation from the smaller to the larger endpoint.
    pub fn canonical_arc(self) -> ArcKey {
        ArcKey::new(self.u, self.v)
    }

    /// Both orientations, canonical first.
    pub fn arcs(self) -> [ArcKey; 2] {
        [ArcKey::new(self.u, self.v), ArcKey::new(self.v, self.u)]
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.u, self.v)
    }
}

/// Ordered vertex pair used by the directed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArcKey {
    pub tail: VertexId,
    pub head: VertexId,
}

impl ArcKey {
    pub fn new(tail: VertexId, head: VertexId) -> Self {
        ArcKey { tail, head }
    }

    pub fn edge(self) -> EdgeKey {
        EdgeKey::new(self.tail, self.head)
    }
}

impl fmt::Display for ArcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.tail, self.head)
    }
}

/// Violations of the graph invariants (simple graph, ids in `1..=n`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("self-loop on vertex {0}")]
    SelfLoop(VertexId),
    #[error("vertex {vertex} is outside 1..={vertex_count}")]
    UnknownVertex {
        vertex: VertexId,
        vertex_count: usize,
    },
}

/// A simple cycle given as its cyclic vertex sequence; the closing edge runs
/// from the last vertex back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(Vec<VertexId>);

impl Cycle {
    pub fn vertices(&self) -> &[VertexId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edges of the cycle, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| EdgeKey::new(self.0[i], self.0[(i + 1) % n]))
    }
}

/// Undirected simple graph with vertex set `1..=n`.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: UnGraphMap<VertexId, ()>,
    vertex_count: usize,
}

impl Graph {
    /// Graph with vertices `1..=vertex_count` and no edges.
    pub fn new(vertex_count: usize) -> Self {
        let mut inner = UnGraphMap::with_capacity(vertex_count, 0);
        for id in 1..=vertex_count {
            inner.add_node(VertexId::new(id));
        }
        Graph {
            inner,
            vertex_count,
        }
    }

    pub fn from_edges<I>(vertex_count: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Graph::new(vertex_count);
        for (a, b) in edges {
            graph.add_edge(VertexId::new(a), VertexId::new(b))?;
        }
        Ok(graph)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        (1..=self.vertex_count).contains(&vertex.value())
    }

    fn check_vertex(&self, vertex: VertexId) -> Result<(), GraphError> {
        if self.contains_vertex(vertex) {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex {
                vertex,
                vertex_count: self.vertex_count,
            })
        }
    }

    /// Adds the edge `a-b`. Returns `Ok(false)` if it was already present.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Result<bool, GraphError> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        if self.inner.contains_edge(a, b) {
            return Ok(false);
        }
        self.inner.add_edge(a, b, ());
        Ok(true)
    }

    /// Removes `edge`, returning whether it was present.
    pub fn remove_edge(&mut self, edge: EdgeKey) -> bool {
        self.inner.remove_edge(edge.u(), edge.v()).is_some()
    }

    pub fn contains_edge(&self, edge: EdgeKey) -> bool {
        self.inner.contains_edge(edge.u(), edge.v())
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (1..=self.vertex_count).map(VertexId::new)
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<EdgeKey> {
        let mut edges: Vec<EdgeKey> = self
            .inner
            .all_edges()
            .map(|(a, b, _)| EdgeKey::new(a, b))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Both orientations of every edge, sorted.
    pub fn arcs(&self) -> Vec<ArcKey> {
        let mut arcs: Vec<ArcKey> = self.edges().into_iter().flat_map(EdgeKey::arcs).collect();
        arcs.sort_unstable();
        arcs
    }

    pub fn degree(&self, vertex: VertexId) -> usize {
        self.inner.neighbors(vertex).count()
    }

    /// Neighbours of `vertex` in ascending order.
    pub fn neighbors(&self, vertex: VertexId) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = self.inner.neighbors(vertex).collect();
        out.sort_unstable();
        out
    }

    pub fn incident_edges(&self, vertex: VertexId) -> Vec<EdgeKey> {
        self.neighbors(vertex)
            .into_iter()
            .map(|other| EdgeKey::new(vertex, other))
            .collect()
    }

    /// Edges of the subgraph induced by `vertices`, sorted.
    pub fn induced_edges(&self, vertices: &BTreeSet<VertexId>) -> Vec<EdgeKey> {
        self.edges()
            .into_iter()
            .filter(|edge| vertices.contains(&edge.u()) && vertices.contains(&edge.v()))
            .collect()
    }

    /// Same vertex set, keeping only the edges induced by `vertices`.
    pub fn subgraph(&self, vertices: &BTreeSet<VertexId>) -> Graph {
        let mut sub = Graph::new(self.vertex_count);
        for edge in self.induced_edges(vertices) {
            sub.inner.add_edge(edge.u(), edge.v(), ());
        }
        sub
    }

    /// Connected components labelled by breadth-first search, ordered by their
    /// smallest vertex.
    pub fn connected_components(&self) -> Vec<BTreeSet<VertexId>> {
        let mut visited = vec![false; self.vertex_count + 1];
        let mut components = Vec::new();
        for start in self.vertices() {
            if visited[start.value()] {
                continue;
            }
            let mut members = BTreeSet::new();
            let mut queue = VecDeque::new();
            visited[start.value()] = true;
            queue.push_back(start);
            while let Some(node) = queue.pop_front() {
                members.insert(node);
                for neighbor in self.inner.neighbors(node) {
                    if !visited[neighbor.value()] {
                        visited[neighbor.value()] = true;
                        queue.push_back(neighbor);
                    }
                }
            }
            components.push(members);
        }
        components
    }

    pub fn component_count(&self) -> usize {
        self.connected_components().len()
    }

    /// True for a non-empty graph with a single component.
    pub fn is_connected(&self) -> bool {
        self.vertex_count > 0 && self.component_count() == 1
    }

    /// A graph is a forest iff `m = n - c`.
    pub fn is_forest(&self) -> bool {
        self.edge_count() + self.component_count() == self.vertex_count
    }

    pub fn is_tree(&self) -> bool {
        self.is_connected() && self.is_forest()
    }

    /// Fundamental cycle basis of a breadth-first spanning forest.
    ///
    /// Roots and neighbours are visited in ascending order; every non-tree
    /// edge, taken in sorted order, closes exactly one cycle with the forest
    /// path between its endpoints. The basis has `m - n + c` cycles.
    pub fn cycle_basis(&self) -> Vec<Cycle> {
        let n = self.vertex_count;
        let mut parent: Vec<usize> = vec![0; n + 1];
        let mut depth: Vec<usize> = vec![0; n + 1];
        let mut visited = vec![false; n + 1];

        for root in self.vertices() {
            if visited[root.value()] {
                continue;
            }
            visited[root.value()] = true;
            parent[root.value()] = root.value();
            let mut queue = VecDeque::new();
            queue.push_back(root);
            while let Some(node) = queue.pop_front() {
                for next in self.neighbors(node) {
                    if !visited[next.value()] {
                        visited[next.value()] = true;
                        parent[next.value()] = node.value();
                        depth[next.value()] = depth[node.value()] + 1;
                        queue.push_back(next);
                    }
                }
            }
        }

        let is_tree_edge = |edge: EdgeKey| {
            let (a, b) = (edge.u().value(), edge.v().value());
            parent[a] == b || parent[b] == a
        };

        self.edges()
            .into_iter()
            .filter(|edge| !is_tree_edge(*edge))
            .map(|edge| {
                let (u, v) = (edge.u().value(), edge.v().value());
                let mut left = vec![u];
                let mut right = vec![v];
                let (mut a, mut b) = (u, v);
                while depth[a] > depth[b] {
                    a = parent[a];
                    left.push(a);
                }
                while depth[b] > depth[a] {
                    b = parent[b];
                    right.push(b);
                }
                while a != b {
                    a = parent[a];
                    left.push(a);
                    b = parent[b];
                    right.push(b);
                }
                // both walks end on the common ancestor
                right.pop();
                right.reverse();
                left.extend(right);
                Cycle(left.into_iter().map(VertexId::new).collect())
            })
            .collect()
    }
}
