use super::MpqTree;
use super::arena::{Kind, NodeId, Slot};
use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::interval::Interval;
use indexmap::IndexMap;
use tracing::debug;

/// First and last clique position below each node, plus the leaves in clique order.
struct Layout {
    range: Vec<Option<(u32, u32)>>,
    leaves: Vec<NodeId>,
}

impl MpqTree {
    fn layout(&self) -> Result<Layout> {
        let mut layout = Layout {
            range: vec![None; self.arena.len()],
            leaves: Vec::new(),
        };
        let Some(root) = self.arena.root else {
            return Ok(layout);
        };

        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            let below: Vec<NodeId> = match &self.arena.node(id).kind {
                Kind::Leaf => {
                    let position = layout.leaves.len() as u32 + 1;
                    layout.range[id] = Some((position, position));
                    layout.leaves.push(id);
                    continue;
                }
                Kind::P { children } => children.clone(),
                Kind::Q { .. } => self.arena.sections(id)?,
                Kind::Section { son, .. } => vec![*son],
            };
            if expanded {
                let mut span: Option<(u32, u32)> = None;
                for child in below {
                    let Some((lo, hi)) = layout.range[child] else {
                        return Err(Error::internal(format!("node {child} was never laid out")));
                    };
                    span = Some(match span {
                        None => (lo, hi),
                        Some((a, b)) => (a.min(lo), b.max(hi)),
                    });
                }
                layout.range[id] = span;
            } else {
                stack.push((id, true));
                stack.extend(below.into_iter().rev().map(|c| (c, false)));
            }
        }
        Ok(layout)
    }

    /// Interval of every inserted vertex, ordered by vertex id. Each leaf is one clique
    /// position, counted from 1 in depth-first order.
    pub fn materialize_intervals(&self) -> Result<IndexMap<VertexId, Interval>> {
        let layout = self.layout()?;
        let range = |id: NodeId| {
            layout.range[id]
                .ok_or_else(|| Error::internal(format!("node {id} has no clique range")))
        };

        let mut out = IndexMap::with_capacity(self.placed);
        for (index, slot) in self.slots.iter().enumerate() {
            let (start, last) = match *slot {
                Slot::Absent => continue,
                Slot::Node(n) => range(n)?,
                Slot::Span(a, b) => {
                    let (a, b) = (range(a)?, range(b)?);
                    (a.0.min(b.0), a.1.max(b.1))
                }
            };
            out.insert(VertexId::new(index), Interval::new(start, last + 1));
        }
        debug!(cliques = layout.leaves.len(), vertices = out.len(), "intervals materialized");
        Ok(out)
    }

    /// Maximal cliques in left-to-right order, each sorted by vertex id.
    pub fn cliques(&self) -> Result<Vec<Vec<VertexId>>> {
        let layout = self.layout()?;
        let mut out = Vec::with_capacity(layout.leaves.len());
        for leaf in layout.leaves {
            let mut clique = Vec::new();
            let mut cursor = Some(leaf);
            while let Some(id) = cursor {
                let node = self.arena.node(id);
                clique.extend(node.vertices.iter().copied());
                cursor = node.parent;
            }
            clique.sort_unstable();
            out.push(clique);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn empty_tree_has_no_intervals() {
        let tree = MpqTree::new(0);
        assert!(tree.materialize_intervals().unwrap().is_empty());
        assert!(tree.cliques().unwrap().is_empty());
    }

    #[test]
    fn cliques_follow_the_section_order() {
        // Path 0 - 1 - 2 inserted in order.
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..3).map(|_| g.add_vertex()).collect();
        g.add_edge(v[0], v[1]).unwrap();
        g.add_edge(v[1], v[2]).unwrap();

        let mut tree = MpqTree::new(g.id_bound());
        for &x in &v {
            tree.insert(&g, x).unwrap();
        }
        let cliques = tree.cliques().unwrap();
        assert_eq!(cliques.len(), 2);
        assert!(cliques.contains(&vec![v[0], v[1]]));
        assert!(cliques.contains(&vec![v[1], v[2]]));

        let intervals = tree.materialize_intervals().unwrap();
        assert_eq!(intervals[&v[1]].len(), 2);
        assert_eq!(intervals.keys().copied().collect::<Vec<_>>(), v);
    }
}
