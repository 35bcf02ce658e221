//! Asteroidal-triple search for chordal graphs that are not interval graphs.
//!
//! For every vertex `p` the vertices of `p`'s component outside `N[p]` are split into the
//! connected components of `G - N[p]`. Three vertices form an asteroidal triple exactly when each
//! of them sees the other two inside one such component.

use crate::error::{Error, Result};
use crate::graph::{Graph, VertexId};
use crate::lexbfs;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsteroidalTriple {
    pub triple: [VertexId; 3],
    /// `triple[0] .. triple[1]`, `triple[1] .. triple[2]` and `triple[2] .. triple[0]`, each
    /// avoiding the closed neighborhood of the remaining vertex. Empty when paths were not
    /// requested.
    pub paths: Vec<Vec<VertexId>>,
}

/// Component labels of `G - N[p]` for every `p`, over a dense renumbering of the live vertices.
struct Reach {
    ids: Vec<VertexId>,
    dense: Vec<usize>,
    labels: Vec<u32>,
}

impl Reach {
    fn build(graph: &Graph) -> Self {
        let ids: Vec<VertexId> = graph.vertices().collect();
        let n = ids.len();
        let mut dense = vec![usize::MAX; graph.id_bound()];
        for (i, v) in ids.iter().enumerate() {
            dense[v.index()] = i;
        }

        let mut labels = vec![0u32; n * n];
        let mut blocked = vec![false; n];
        let mut queue = VecDeque::new();
        for (p, &pv) in ids.iter().enumerate() {
            let row = &mut labels[p * n..(p + 1) * n];
            blocked.fill(false);
            blocked[p] = true;
            for nb in graph.neighbors(pv) {
                blocked[dense[nb.index()]] = true;
            }

            // Only p's own component is explored; everything else keeps label 0.
            let mut component = vec![p];
            let mut seen = vec![false; n];
            seen[p] = true;
            queue.push_back(p);
            while let Some(x) = queue.pop_front() {
                for nb in graph.neighbors(ids[x]) {
                    let y = dense[nb.index()];
                    if !seen[y] {
                        seen[y] = true;
                        component.push(y);
                        queue.push_back(y);
                    }
                }
            }

            let mut next_label = 0u32;
            for &start in &component {
                if blocked[start] || row[start] != 0 {
                    continue;
                }
                next_label += 1;
                row[start] = next_label;
                queue.push_back(start);
                while let Some(x) = queue.pop_front() {
                    for nb in graph.neighbors(ids[x]) {
                        let y = dense[nb.index()];
                        if !blocked[y] && row[y] == 0 {
                            row[y] = next_label;
                            queue.push_back(y);
                        }
                    }
                }
            }
        }

        Self { ids, dense, labels }
    }

    fn label(&self, p: usize, q: usize) -> u32 {
        self.labels[p * self.ids.len() + q]
    }

    fn sees_both(&self, p: usize, q: usize, r: usize) -> bool {
        let l = self.label(p, q);
        l != 0 && l == self.label(p, r)
    }

    fn is_asteroidal(&self, a: usize, b: usize, c: usize) -> bool {
        self.sees_both(a, b, c) && self.sees_both(b, a, c) && self.sees_both(c, a, b)
    }
}

/// Finds an asteroidal triple, preferring one that contains `x`.
///
/// Errors with [`Error::Internal`] when the graph has none.
pub fn find(graph: &Graph, x: VertexId, with_paths: bool) -> Result<AsteroidalTriple> {
    let reach = Reach::build(graph);
    let n = reach.ids.len();

    let mut found = None;
    if let Some(&xi) = reach.dense.get(x.index()).filter(|&&i| i != usize::MAX) {
        'outer: for y in 0..n {
            for z in y + 1..n {
                if y != xi && z != xi && reach.is_asteroidal(xi, y, z) {
                    found = Some([xi, y, z]);
                    break 'outer;
                }
            }
        }
    }
    if found.is_none() {
        'all: for a in 0..n {
            for b in a + 1..n {
                for c in b + 1..n {
                    if reach.is_asteroidal(a, b, c) {
                        found = Some([a, b, c]);
                        break 'all;
                    }
                }
            }
        }
    }
    let Some(dense) = found else {
        return Err(Error::internal("no asteroidal triple found"));
    };
    let triple = dense.map(|i| reach.ids[i]);
    debug!(triple = ?triple, "asteroidal triple found");

    let paths = if with_paths {
        let [a, b, c] = triple;
        vec![
            lexbfs::shortest_avoiding_path(graph, [c, a, b])?,
            lexbfs::shortest_avoiding_path(graph, [a, b, c])?,
            lexbfs::shortest_avoiding_path(graph, [b, c, a])?,
        ]
    } else {
        Vec::new()
    };

    Ok(AsteroidalTriple { triple, paths })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(n: usize, edges: &[(usize, usize)]) -> (Graph, Vec<VertexId>) {
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        for &(a, b) in edges {
            g.add_edge(v[a], v[b]).unwrap();
        }
        (g, v)
    }

    fn net() -> (Graph, Vec<VertexId>) {
        build(6, &[(0, 1), (1, 2), (2, 0), (0, 3), (1, 4), (2, 5)])
    }

    #[test]
    fn net_has_its_pendant_vertices_as_triple() {
        let (g, v) = net();
        let at = find(&g, v[5], true).unwrap();
        let mut triple = at.triple.to_vec();
        triple.sort();
        assert_eq!(triple, vec![v[3], v[4], v[5]]);
        assert_eq!(at.triple[0], v[5]);

        assert_eq!(at.paths.len(), 3);
        for (i, path) in at.paths.iter().enumerate() {
            let (from, to, third) = (at.triple[i], at.triple[(i + 1) % 3], at.triple[(i + 2) % 3]);
            assert_eq!(path.first(), Some(&from));
            assert_eq!(path.last(), Some(&to));
            assert_eq!(path.len(), 4);
            assert!(path.iter().all(|&p| !g.has_edge(p, third) && p != third));
        }
    }

    #[test]
    fn search_falls_back_when_x_is_not_in_a_triple() {
        // A triangle vertex never belongs to the net's triple.
        let (g, v) = net();
        let at = find(&g, v[0], false).unwrap();
        assert!(at.paths.is_empty());
        assert_eq!(at.triple, [v[3], v[4], v[5]]);
    }

    #[test]
    fn triangle_and_separate_components_are_not_triples() {
        // A triangle plus two isolated vertices: no AT anywhere.
        let (g, v) = build(5, &[(0, 1), (1, 2), (2, 0)]);
        assert!(matches!(find(&g, v[0], true), Err(Error::Internal { .. })));
    }

    #[test]
    fn path_graph_has_no_triple() {
        let (g, v) = build(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert!(find(&g, v[2], false).is_err());
    }
}
