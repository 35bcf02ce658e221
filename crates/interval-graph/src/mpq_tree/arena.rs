use crate::error::{Error, Result};
use crate::graph::VertexId;

pub(crate) type NodeId = usize;

/// Rank distance between neighboring sections after a renumbering.
const RANK_GAP: i64 = 1 << 16;

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Leaf,
    P {
        children: Vec<NodeId>,
    },
    /// `flipped` mirrors the stored section order, so a reversal does not touch the sections.
    Q {
        leftmost: NodeId,
        rightmost: NodeId,
        flipped: bool,
    },
    /// Ordered child slot of a Q-node. `left`, `right` and `rank` are stored in the Q-node's
    /// unflipped orientation; read them through [`Arena::links`].
    Section {
        son: NodeId,
        left: Option<NodeId>,
        right: Option<NodeId>,
        rank: i64,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: Kind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) vertices: Vec<VertexId>,
    pub(crate) alive: bool,
}

/// Where a placed vertex lives: in one leaf or P-node, or in every section between two sections
/// of the same Q-node (stored unordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Absent,
    Node(NodeId),
    Span(NodeId, NodeId),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SectionLinks {
    pub(crate) son: NodeId,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) rank: i64,
}

/// Node storage addressed by index. Discarded nodes stay in place with `alive == false`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    pub(crate) root: Option<NodeId>,
}

impl Arena {
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    fn alloc(&mut self, kind: Kind, vertices: Vec<VertexId>) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            vertices,
            alive: true,
        });
        self.nodes.len() - 1
    }

    pub(crate) fn leaf(&mut self, vertices: Vec<VertexId>) -> NodeId {
        self.alloc(Kind::Leaf, vertices)
    }

    pub(crate) fn p_node(&mut self, vertices: Vec<VertexId>) -> NodeId {
        self.alloc(
            Kind::P {
                children: Vec::new(),
            },
            vertices,
        )
    }

    fn section(&mut self, son: NodeId, vertices: Vec<VertexId>) -> NodeId {
        let s = self.alloc(
            Kind::Section {
                son,
                left: None,
                right: None,
                rank: 0,
            },
            vertices,
        );
        self.nodes[son].parent = Some(s);
        s
    }

    pub(crate) fn discard(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.alive = false;
        node.parent = None;
        node.vertices.clear();
    }

    pub(crate) fn is_p(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, Kind::P { .. })
    }

    pub(crate) fn children(&self, p: NodeId) -> Result<&[NodeId]> {
        match &self.nodes[p].kind {
            Kind::P { children } => Ok(children),
            _ => Err(Error::internal(format!("node {p} is not a P-node"))),
        }
    }

    fn children_mut(&mut self, p: NodeId) -> Result<&mut Vec<NodeId>> {
        match &mut self.nodes[p].kind {
            Kind::P { children } => Ok(children),
            _ => Err(Error::internal(format!("node {p} is not a P-node"))),
        }
    }

    /// Appends `child` to the P-node `p`.
    pub(crate) fn adopt(&mut self, p: NodeId, child: NodeId) -> Result<()> {
        if matches!(self.nodes[child].kind, Kind::Section { .. }) {
            return Err(Error::internal(format!(
                "section {child} cannot be the child of P-node {p}"
            )));
        }
        self.children_mut(p)?.push(child);
        self.nodes[child].parent = Some(p);
        Ok(())
    }

    pub(crate) fn set_children(&mut self, p: NodeId, children: Vec<NodeId>) -> Result<()> {
        for &c in &children {
            self.nodes[c].parent = Some(p);
        }
        *self.children_mut(p)? = children;
        Ok(())
    }

    /// Puts `new` into the slot `old` occupies under its parent (or at the root).
    pub(crate) fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if matches!(self.nodes[new].kind, Kind::Section { .. }) {
            return Err(Error::internal(format!(
                "section {new} cannot replace node {old}"
            )));
        }
        let parent = self.nodes[old].parent;
        self.nodes[new].parent = parent;
        let Some(parent) = parent else {
            self.root = Some(new);
            return Ok(());
        };
        match &mut self.nodes[parent].kind {
            Kind::P { children } => {
                let Some(slot) = children.iter_mut().find(|c| **c == old) else {
                    return Err(Error::internal(format!(
                        "node {old} missing from its parent {parent}"
                    )));
                };
                *slot = new;
            }
            Kind::Section { son, .. } => *son = new,
            _ => {
                return Err(Error::internal(format!(
                    "node {parent} cannot have a child"
                )));
            }
        }
        self.nodes[old].parent = None;
        Ok(())
    }

    /// Replaces `p` inside its parent P-node by `p`'s own children.
    pub(crate) fn splice_into_parent(&mut self, p: NodeId) -> Result<()> {
        let Some(parent) = self.nodes[p].parent else {
            return Err(Error::internal(format!("P-node {p} has no parent")));
        };
        let inner = self.children(p)?.to_vec();
        for &c in &inner {
            self.nodes[c].parent = Some(parent);
        }
        let siblings = self.children_mut(parent)?;
        let Some(at) = siblings.iter().position(|&c| c == p) else {
            return Err(Error::internal(format!(
                "node {p} missing from its parent {parent}"
            )));
        };
        siblings.splice(at..=at, inner);
        self.discard(p);
        Ok(())
    }

    fn is_flipped(&self, q: NodeId) -> bool {
        matches!(self.nodes[q].kind, Kind::Q { flipped: true, .. })
    }

    /// Orientation of the Q-node owning section `s`.
    fn section_flipped(&self, s: NodeId) -> bool {
        self.nodes[s].parent.is_some_and(|q| self.is_flipped(q))
    }

    pub(crate) fn ends(&self, q: NodeId) -> Result<(NodeId, NodeId)> {
        match self.nodes[q].kind {
            Kind::Q {
                leftmost,
                rightmost,
                flipped,
            } => Ok(if flipped {
                (rightmost, leftmost)
            } else {
                (leftmost, rightmost)
            }),
            _ => Err(Error::internal(format!("node {q} is not a Q-node"))),
        }
    }

    pub(crate) fn links(&self, s: NodeId) -> Result<SectionLinks> {
        let Kind::Section {
            son,
            left,
            right,
            rank,
        } = self.nodes[s].kind
        else {
            return Err(Error::internal(format!("node {s} is not a section")));
        };
        Ok(if self.section_flipped(s) {
            SectionLinks {
                son,
                left: right,
                right: left,
                rank: -rank,
            }
        } else {
            SectionLinks {
                son,
                left,
                right,
                rank,
            }
        })
    }

    fn set_links(&mut self, s: NodeId, new_left: Option<NodeId>, new_right: Option<NodeId>) {
        let (new_left, new_right) = if self.section_flipped(s) {
            (new_right, new_left)
        } else {
            (new_left, new_right)
        };
        if let Kind::Section { left, right, .. } = &mut self.nodes[s].kind {
            *left = new_left;
            *right = new_right;
        }
    }

    fn set_left(&mut self, s: NodeId, to: Option<NodeId>) {
        let flipped = self.section_flipped(s);
        if let Kind::Section { left, right, .. } = &mut self.nodes[s].kind {
            *(if flipped { right } else { left }) = to;
        }
    }

    fn set_right(&mut self, s: NodeId, to: Option<NodeId>) {
        let flipped = self.section_flipped(s);
        if let Kind::Section { left, right, .. } = &mut self.nodes[s].kind {
            *(if flipped { left } else { right }) = to;
        }
    }

    fn set_rank(&mut self, s: NodeId, to: i64) {
        let to = if self.section_flipped(s) { -to } else { to };
        if let Kind::Section { rank, .. } = &mut self.nodes[s].kind {
            *rank = to;
        }
    }

    fn set_ends(&mut self, q: NodeId, new_left: NodeId, new_right: NodeId) {
        if let Kind::Q {
            leftmost,
            rightmost,
            flipped,
        } = &mut self.nodes[q].kind
        {
            let (l, r) = if *flipped {
                (new_right, new_left)
            } else {
                (new_left, new_right)
            };
            *leftmost = l;
            *rightmost = r;
        }
    }

    pub(crate) fn rank(&self, s: NodeId) -> Result<i64> {
        Ok(self.links(s)?.rank)
    }

    /// Sections of `q`, left to right.
    pub(crate) fn sections(&self, q: NodeId) -> Result<Vec<NodeId>> {
        let (mut cursor, _) = self.ends(q)?;
        let mut out = vec![cursor];
        while let Some(next) = self.links(cursor)?.right {
            out.push(next);
            cursor = next;
        }
        Ok(out)
    }

    /// Builds a Q-node over `(vertices, son)` pairs, left to right.
    pub(crate) fn q_node(&mut self, parts: Vec<(Vec<VertexId>, NodeId)>) -> Result<NodeId> {
        let sections: Vec<NodeId> = parts
            .into_iter()
            .map(|(vertices, son)| self.section(son, vertices))
            .collect();
        let (Some(&first), Some(&last)) = (sections.first(), sections.last()) else {
            return Err(Error::internal("Q-node without sections"));
        };
        let q = self.alloc(
            Kind::Q {
                leftmost: first,
                rightmost: last,
                flipped: false,
            },
            Vec::new(),
        );
        for (i, &s) in sections.iter().enumerate() {
            self.nodes[s].parent = Some(q);
            let left = i.checked_sub(1).map(|j| sections[j]);
            let right = sections.get(i + 1).copied();
            self.set_links(s, left, right);
            self.set_rank(s, i as i64 * RANK_GAP);
        }
        Ok(q)
    }

    /// Inserts a new section between `left` and `right` (either may be an outer end) of `q`.
    pub(crate) fn insert_section(
        &mut self,
        q: NodeId,
        left: Option<NodeId>,
        right: Option<NodeId>,
        son: NodeId,
        vertices: Vec<VertexId>,
    ) -> Result<NodeId> {
        let bounds = (
            left.map(|l| self.rank(l)).transpose()?,
            right.map(|r| self.rank(r)).transpose()?,
        );
        let s = self.section(son, vertices);
        self.nodes[s].parent = Some(q);
        self.set_links(s, left, right);
        let (mut first, mut last) = self.ends(q)?;
        match left {
            Some(l) => self.set_right(l, Some(s)),
            None => first = s,
        }
        match right {
            Some(r) => self.set_left(r, Some(s)),
            None => last = s,
        }
        self.set_ends(q, first, last);

        match bounds {
            (Some(lo), None) => self.set_rank(s, lo + RANK_GAP),
            (None, Some(hi)) => self.set_rank(s, hi - RANK_GAP),
            (Some(lo), Some(hi)) if hi - lo >= 2 => self.set_rank(s, lo + (hi - lo) / 2),
            (None, None) => self.set_rank(s, 0),
            _ => self.renumber(q)?,
        }
        Ok(s)
    }

    /// Replaces the section `s` of `q` by the sections of `inner`, left to right. `s` and
    /// `inner` are discarded.
    pub(crate) fn splice_sections(&mut self, q: NodeId, s: NodeId, inner: NodeId) -> Result<()> {
        let SectionLinks {
            left, right, rank, ..
        } = self.links(s)?;
        let bounds = (
            left.map(|l| self.rank(l)).transpose()?,
            right.map(|r| self.rank(r)).transpose()?,
        );
        let parts = self.sections(inner)?;
        let (Some(&first), Some(&last)) = (parts.first(), parts.last()) else {
            return Err(Error::internal(format!("Q-node {inner} has no sections")));
        };

        for &p in &parts {
            self.nodes[p].parent = Some(q);
        }
        let m = parts.len();
        for (i, &p) in parts.iter().enumerate() {
            let l = if i == 0 { left } else { Some(parts[i - 1]) };
            let r = parts.get(i + 1).copied().or(right);
            self.set_links(p, l, r);
        }
        let (mut lo, mut hi) = self.ends(q)?;
        match left {
            Some(l) => self.set_right(l, Some(first)),
            None => lo = first,
        }
        match right {
            Some(r) => self.set_left(r, Some(last)),
            None => hi = last,
        }
        self.set_ends(q, lo, hi);
        self.discard(s);
        self.discard(inner);

        let m = m as i64;
        match bounds {
            (_, None) => {
                for (i, &p) in parts.iter().enumerate() {
                    self.set_rank(p, rank + i as i64 * RANK_GAP);
                }
            }
            (None, Some(_)) => {
                for (i, &p) in parts.iter().enumerate() {
                    self.set_rank(p, rank - (m - 1 - i as i64) * RANK_GAP);
                }
            }
            (Some(a), Some(b)) if (b - a) / (m + 1) >= 1 => {
                let step = (b - a) / (m + 1);
                for (i, &p) in parts.iter().enumerate() {
                    self.set_rank(p, a + (i as i64 + 1) * step);
                }
            }
            _ => self.renumber(q)?,
        }
        Ok(())
    }

    /// Mirrors the section order of `q`.
    pub(crate) fn reverse(&mut self, q: NodeId) -> Result<()> {
        match &mut self.nodes[q].kind {
            Kind::Q { flipped, .. } => {
                *flipped = !*flipped;
                Ok(())
            }
            _ => Err(Error::internal(format!("node {q} is not a Q-node"))),
        }
    }

    /// Spreads the ranks of `q` evenly again once a gap between neighbors has run out.
    fn renumber(&mut self, q: NodeId) -> Result<()> {
        for (i, s) in self.sections(q)?.into_iter().enumerate() {
            self.set_rank(s, i as i64 * RANK_GAP);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    fn three_section_q(arena: &mut Arena) -> (NodeId, Vec<NodeId>) {
        let sons: Vec<NodeId> = (0..3).map(|i| arena.leaf(vec![v(i)])).collect();
        let q = arena
            .q_node(sons.iter().map(|&s| (Vec::new(), s)).collect())
            .unwrap();
        (q, sons)
    }

    fn sons_of(arena: &Arena, q: NodeId) -> Vec<NodeId> {
        arena
            .sections(q)
            .unwrap()
            .into_iter()
            .map(|s| arena.links(s).unwrap().son)
            .collect()
    }

    #[test]
    fn reverse_flips_order_and_ranks() {
        let mut arena = Arena::default();
        let (q, sons) = three_section_q(&mut arena);
        let before = arena.sections(q).unwrap();
        arena.reverse(q).unwrap();

        assert_eq!(sons_of(&arena, q), vec![sons[2], sons[1], sons[0]]);
        let ranks: Vec<i64> = arena
            .sections(q)
            .unwrap()
            .into_iter()
            .map(|s| arena.rank(s).unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(arena.ends(q).unwrap(), (before[2], before[0]));
    }

    #[test]
    fn splice_replaces_one_section_by_many() {
        let mut arena = Arena::default();
        let (q, sons) = three_section_q(&mut arena);
        let middle = arena.sections(q).unwrap()[1];

        let a = arena.leaf(vec![v(10)]);
        let b = arena.leaf(vec![v(11)]);
        let inner = arena.q_node(vec![(Vec::new(), a), (Vec::new(), b)]).unwrap();
        arena.splice_sections(q, middle, inner).unwrap();

        assert_eq!(sons_of(&arena, q), vec![sons[0], a, b, sons[2]]);
        assert!(!arena.node(middle).alive);
        assert!(arena.sections(q).unwrap().iter().all(|&s| arena.node(s).parent == Some(q)));
    }

    fn ranks_of(arena: &Arena, q: NodeId) -> Vec<i64> {
        arena
            .sections(q)
            .unwrap()
            .into_iter()
            .map(|s| arena.rank(s).unwrap())
            .collect()
    }

    #[test]
    fn reversed_q_grows_at_both_ends_and_in_the_middle() {
        let mut arena = Arena::default();
        let (q, sons) = three_section_q(&mut arena);
        arena.reverse(q).unwrap();

        let (first, last) = arena.ends(q).unwrap();
        let head = arena.leaf(vec![v(20)]);
        let tail = arena.leaf(vec![v(21)]);
        arena.insert_section(q, None, Some(first), head, Vec::new()).unwrap();
        arena.insert_section(q, Some(last), None, tail, Vec::new()).unwrap();
        assert_eq!(sons_of(&arena, q), vec![head, sons[2], sons[1], sons[0], tail]);

        let middle = arena.sections(q).unwrap()[2];
        let a = arena.leaf(vec![v(10)]);
        let b = arena.leaf(vec![v(11)]);
        let inner = arena.q_node(vec![(Vec::new(), a), (Vec::new(), b)]).unwrap();
        arena.reverse(inner).unwrap();
        arena.splice_sections(q, middle, inner).unwrap();
        assert_eq!(sons_of(&arena, q), vec![head, sons[2], b, a, sons[0], tail]);
        assert!(ranks_of(&arena, q).windows(2).all(|w| w[0] < w[1]));

        arena.reverse(q).unwrap();
        assert_eq!(sons_of(&arena, q), vec![tail, sons[0], a, b, sons[2], head]);
        assert!(ranks_of(&arena, q).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn exhausted_rank_gap_is_renumbered() {
        let mut arena = Arena::default();
        let (q, _) = three_section_q(&mut arena);
        let (first, _) = arena.ends(q).unwrap();
        for i in 0..40 {
            let right = arena.links(first).unwrap().right;
            let son = arena.leaf(vec![v(30 + i)]);
            arena.insert_section(q, Some(first), right, son, Vec::new()).unwrap();
        }
        assert_eq!(arena.sections(q).unwrap().len(), 43);
        assert!(ranks_of(&arena, q).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn replace_updates_the_parent_slot() {
        let mut arena = Arena::default();
        let p = arena.p_node(Vec::new());
        arena.root = Some(p);
        let a = arena.leaf(vec![v(0)]);
        let b = arena.leaf(vec![v(1)]);
        arena.adopt(p, a).unwrap();
        arena.adopt(p, b).unwrap();

        let c = arena.leaf(vec![v(2)]);
        arena.replace(a, c).unwrap();
        assert_eq!(arena.children(p).unwrap(), &[c, b]);
        assert_eq!(arena.node(c).parent, Some(p));

        let top = arena.p_node(Vec::new());
        arena.replace(p, top).unwrap();
        assert_eq!(arena.root, Some(top));
    }
}
