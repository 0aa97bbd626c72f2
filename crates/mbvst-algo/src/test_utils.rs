//! Small graphs with known optima, shared by unit and integration tests.

use mbvst_core::Graph;

fn build(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Graph {
    match Graph::from_edges(n, edges) {
        Ok(graph) => graph,
        Err(err) => panic!("invalid fixture: {err}"),
    }
}

/// Cycle `1-2-..-n-1`.
pub fn cycle(n: usize) -> Graph {
    build(n, (1..=n).map(|i| (i, i % n + 1)))
}

/// Path `1-2-..-n`.
pub fn path(n: usize) -> Graph {
    build(n, (1..n).map(|i| (i, i + 1)))
}

/// Star with centre 1 and leaves `2..=n`.
pub fn star(n: usize) -> Graph {
    build(n, (2..=n).map(|i| (1, i)))
}

/// Complete graph on `n` vertices.
pub fn complete(n: usize) -> Graph {
    build(n, (1..=n).flat_map(|i| (i + 1..=n).map(move |j| (i, j))))
}

/// Two triangles `1-2-3` and `1-4-5` sharing vertex 1. Hamiltonian path
/// `2-3-1-4-5` gives a tree without branch vertices.
pub fn bowtie() -> Graph {
    build(5, [(1, 2), (2, 3), (1, 3), (1, 4), (4, 5), (1, 5)])
}

/// Friendship graph: `k` triangles sharing vertex 1. For `k ≥ 3` every
/// spanning tree has vertex 1 as its only branch vertex.
pub fn friendship(k: usize) -> Graph {
    let n = 2 * k + 1;
    build(
        n,
        (0..k).flat_map(|t| {
            let a = 2 * t + 2;
            let b = 2 * t + 3;
            [(1, a), (1, b), (a, b)]
        }),
    )
}

/// Disjoint triangles `1-2-3` and `4-5-6`.
pub fn two_triangles() -> Graph {
    build(6, [(1, 2), (2, 3), (1, 3), (4, 5), (5, 6), (4, 6)])
}

/// `rows × cols` grid numbered row by row from 1.
pub fn grid(rows: usize, cols: usize) -> Graph {
    let id = |r: usize, c: usize| r * cols + c + 1;
    let mut edges = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                edges.push((id(r, c), id(r, c + 1)));
            }
            if r + 1 < rows {
                edges.push((id(r, c), id(r + 1, c)));
            }
        }
    }
    build(rows * cols, edges)
}
