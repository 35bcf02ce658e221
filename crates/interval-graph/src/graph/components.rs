//! Connected components by union-find.

use super::{Graph, VertexId};

/// Follows anchor links up to the representative of `v`, then points every vertex on the way
/// straight at it.
fn find_anchor(anchors: &mut [usize], v: usize) -> usize {
    let mut root = v;
    while anchors[root] != root {
        root = anchors[root];
    }
    let mut cursor = v;
    while anchors[cursor] != root {
        let next = anchors[cursor];
        anchors[cursor] = root;
        cursor = next;
    }
    root
}

impl Graph {
    /// Partitions the live vertices into connected components.
    ///
    /// When two components merge, the anchor with the lower id wins, so every component is
    /// represented by its smallest vertex. Components come out ordered by that vertex, and the
    /// members of each component in ascending id order.
    pub fn connected_components(&self) -> Vec<Vec<VertexId>> {
        let bound = self.id_bound();
        let mut anchors: Vec<usize> = (0..bound).collect();

        for u in self.vertices() {
            for &v in self.neighbors(u) {
                if v < u {
                    continue;
                }
                let a = find_anchor(&mut anchors, u.index());
                let b = find_anchor(&mut anchors, v.index());
                if a < b {
                    anchors[b] = a;
                } else if b < a {
                    anchors[a] = b;
                }
            }
        }

        let mut slot: Vec<Option<usize>> = vec![None; bound];
        let mut out: Vec<Vec<VertexId>> = Vec::new();
        for v in self.vertices() {
            let anchor = find_anchor(&mut anchors, v.index());
            let idx = *slot[anchor].get_or_insert_with(|| {
                out.push(Vec::new());
                out.len() - 1
            });
            out[idx].push(v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_anchored_at_their_lowest_vertex() {
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..6).map(|_| g.add_vertex()).collect();
        g.add_edge(v[5], v[3]).unwrap();
        g.add_edge(v[3], v[1]).unwrap();
        g.add_edge(v[2], v[4]).unwrap();

        let comps = g.connected_components();
        assert_eq!(
            comps,
            vec![vec![v[0]], vec![v[1], v[3], v[5]], vec![v[2], v[4]]]
        );
    }

    #[test]
    fn find_anchor_compresses_the_whole_chain() {
        // 4 -> 3 -> 2 -> 1 -> 0
        let mut anchors: Vec<usize> = vec![0, 0, 1, 2, 3];
        assert_eq!(find_anchor(&mut anchors, 4), 0);
        assert_eq!(anchors, vec![0; 5]);
    }

    #[test]
    fn long_descending_chain_is_one_component() {
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..2_000).map(|_| g.add_vertex()).collect();
        for i in (1..v.len()).rev() {
            g.add_edge(v[i], v[i - 1]).unwrap();
        }
        let comps = g.connected_components();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0], v);
    }

    #[test]
    fn removed_vertices_do_not_appear() {
        let mut g = Graph::complete(3);
        g.remove_vertex(VertexId::new(0)).unwrap();
        let comps = g.connected_components();
        assert_eq!(comps, vec![vec![VertexId::new(1), VertexId::new(2)]]);
    }
}
