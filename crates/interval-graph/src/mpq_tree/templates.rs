//! Rewrite templates.
//!
//! When `n_up == n_down` a single template places the new vertex (L1, P1, Q1). Otherwise the
//! bottom node is turned into a Q-node whose rightmost section `K` holds the new vertex (L2, P2,
//! Q2), and every node above it up to `n_up` is folded into that Q-node (P3, Q3), keeping `K` at
//! the right end.

use super::arena::{Kind, NodeId, Slot};
use super::{HashSet, MpqTree, Pass, Step};
use crate::error::{Error, Result};
use crate::graph::VertexId;
use tracing::trace;

impl MpqTree {
    /// Splits the vertices of `x` into (neighbors of the new vertex, the rest).
    fn split(&self, x: NodeId) -> (Vec<VertexId>, Vec<VertexId>) {
        self.arena
            .node(x)
            .vertices
            .iter()
            .copied()
            .partition(|v| self.in_a[v.index()])
    }

    fn alist_of(pass: &Pass, x: NodeId) -> Vec<VertexId> {
        pass.alist.get(&x).cloned().unwrap_or_default()
    }

    /// Puts a fresh P-node holding `a` in the place of `x`, with `x` as its first child.
    fn lift(&mut self, x: NodeId, a: Vec<VertexId>) -> Result<NodeId> {
        let p = self.arena.p_node(Vec::new());
        self.arena.replace(x, p)?;
        self.arena.adopt(p, x)?;
        for v in &a {
            self.slots[v.index()] = Slot::Node(p);
        }
        self.arena.node_mut(p).vertices = a;
        Ok(p)
    }

    fn move_endpoint(&mut self, v: VertexId, from: NodeId, to: NodeId) {
        if let Slot::Span(e1, e2) = self.slots[v.index()] {
            self.slots[v.index()] = if e1 == from {
                Slot::Span(to, e2)
            } else if e2 == from {
                Slot::Span(e1, to)
            } else {
                Slot::Span(e1, e2)
            };
        }
    }

    fn all_span(&self, vertices: &[VertexId], s: NodeId) -> Result<bool> {
        for &v in vertices {
            if !self.span_contains(v, s)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether sections `l` and `r` share no vertex outside the placed neighbors.
    fn disjoint_remaining(&self, l: NodeId, r: NodeId) -> bool {
        let left: HashSet<VertexId> = self
            .arena
            .node(l)
            .vertices
            .iter()
            .copied()
            .filter(|v| !self.in_a[v.index()])
            .collect();
        !self
            .arena
            .node(r)
            .vertices
            .iter()
            .any(|v| !self.in_a[v.index()] && left.contains(v))
    }

    pub(super) fn place_at(&mut self, pass: &mut Pass, x: NodeId) -> Result<bool> {
        match self.arena.node(x).kind {
            Kind::Leaf => self.leaf_single(pass, x),
            Kind::P { .. } => self.p_single(pass, x),
            Kind::Q { .. } => self.q_single(pass, x),
            Kind::Section { .. } => Err(Error::internal(format!(
                "section {x} cannot receive a vertex"
            ))),
        }
    }

    /// L1.
    fn leaf_single(&mut self, pass: &mut Pass, x: NodeId) -> Result<bool> {
        let (a, n) = self.split(x);
        if n.is_empty() {
            trace!(template = "L1", leaf = x, "join clique");
            self.arena.node_mut(x).vertices.push(pass.u);
            self.slots[pass.u.index()] = Slot::Node(x);
            return Ok(true);
        }
        trace!(template = "L1", leaf = x, "split leaf");
        self.arena.node_mut(x).vertices = n;
        let p = self.lift(x, a)?;
        let leaf = self.new_leaf(pass.u);
        self.arena.adopt(p, leaf)?;
        pass.touched.push(p);
        Ok(true)
    }

    /// P1.
    fn p_single(&mut self, pass: &mut Pass, x: NodeId) -> Result<bool> {
        let (a, n) = self.split(x);
        let leaf = self.new_leaf(pass.u);
        if n.is_empty() {
            trace!(template = "P1", p = x, "new child");
            self.arena.adopt(x, leaf)?;
            pass.touched.push(x);
            return Ok(true);
        }
        trace!(template = "P1", p = x, "split P-node");
        self.arena.node_mut(x).vertices = n;
        let p = self.lift(x, a)?;
        self.arena.adopt(p, leaf)?;
        pass.touched.push(p);
        pass.touched.push(x);
        Ok(true)
    }

    /// Leftmost and rightmost section held by every vertex of `a_x`, or `None` when their spans
    /// share no section.
    fn common_sections(&self, q: NodeId, a_x: &[VertexId]) -> Result<Option<(NodeId, NodeId)>> {
        let mut common: Option<((i64, NodeId), (i64, NodeId))> = None;
        let (first, last) = self.arena.ends(q)?;
        if a_x.is_empty() {
            return Ok(Some((first, last)));
        }
        for &a in a_x {
            let (e1, e2) = match self.slots[a.index()] {
                Slot::Span(e1, e2) => (e1, e2),
                Slot::Node(s) => (s, s),
                Slot::Absent => {
                    return Err(Error::internal(format!("vertex {a} is not placed")));
                }
            };
            let (r1, r2) = (self.arena.rank(e1)?, self.arena.rank(e2)?);
            let span = if r1 <= r2 {
                ((r1, e1), (r2, e2))
            } else {
                ((r2, e2), (r1, e1))
            };
            common = Some(match common {
                None => span,
                Some((lo, hi)) => (
                    if span.0.0 > lo.0 { span.0 } else { lo },
                    if span.1.0 < hi.0 { span.1 } else { hi },
                ),
            });
        }
        Ok(common.and_then(|((lo_rank, lo), (hi_rank, hi))| {
            (lo_rank <= hi_rank).then_some((lo, hi))
        }))
    }

    /// Q1: the new vertex goes below a section made only of its neighbors, or into a new
    /// section at the first gap that can take it. Only the sections shared by every neighbor
    /// in `x` are candidates.
    fn q_single(&mut self, pass: &mut Pass, x: NodeId) -> Result<bool> {
        let a_x = Self::alist_of(pass, x);
        let Some((lo, hi)) = self.common_sections(x, &a_x)? else {
            trace!(template = "Q1", q = x, "neighbors share no section");
            return Ok(false);
        };
        let mut range = vec![lo];
        let mut cursor = lo;
        while cursor != hi {
            cursor = self.arena.links(cursor)?.right.ok_or_else(|| {
                Error::internal(format!("section {hi} is not right of {lo} in Q-node {x}"))
            })?;
            range.push(cursor);
        }

        for &s in &range {
            if self.arena.node(s).vertices.len() == a_x.len() {
                trace!(template = "Q1", q = x, section = s, "below full section");
                self.attach_below(pass, s)?;
                return Ok(true);
            }
        }

        let (first, last) = self.arena.ends(x)?;
        let mut gap = None;
        if lo == first {
            gap = Some((None, Some(first)));
        } else {
            let before = self.arena.links(lo)?.left;
            let mut candidates = vec![(before, Some(lo))];
            for &s in &range {
                candidates.push((Some(s), self.arena.links(s)?.right));
            }
            for (l, r) in candidates {
                if let (Some(l), Some(r)) = (l, r) {
                    if self.disjoint_remaining(l, r) {
                        gap = Some((Some(l), Some(r)));
                        break;
                    }
                }
            }
            if gap.is_none() && hi == last {
                gap = Some((Some(last), None));
            }
        }
        let Some((left, right)) = gap else {
            trace!(template = "Q1", q = x, "no gap fits");
            return Ok(false);
        };

        let mut moves = Vec::with_capacity(a_x.len());
        for &a in &a_x {
            let from = match (left, right) {
                (Some(l), Some(r)) => match (self.span_contains(a, l)?, self.span_contains(a, r)?)
                {
                    (true, true) => None,
                    (true, false) => Some(l),
                    _ => Some(r),
                },
                (Some(l), None) => Some(l),
                (None, Some(r)) => Some(r),
                (None, None) => None,
            };
            moves.push((a, from));
        }

        trace!(template = "Q1", q = x, "new section");
        let leaf = self.new_leaf(pass.u);
        let s = self.arena.insert_section(x, left, right, leaf, a_x)?;
        for (a, from) in moves {
            if let Some(from) = from {
                self.move_endpoint(a, from, s);
            }
        }
        pass.hoist = Some(x);
        Ok(true)
    }

    /// Adds the new vertex under section `s`, beside whatever is there.
    fn attach_below(&mut self, pass: &mut Pass, s: NodeId) -> Result<()> {
        let son = self.arena.links(s)?.son;
        let empty = self.arena.node(son).vertices.is_empty();
        match self.arena.node(son).kind {
            Kind::Leaf if empty => {
                self.arena.node_mut(son).vertices.push(pass.u);
                self.slots[pass.u.index()] = Slot::Node(son);
            }
            Kind::P { .. } if empty => {
                let leaf = self.new_leaf(pass.u);
                self.arena.adopt(son, leaf)?;
                pass.touched.push(son);
            }
            _ => {
                let leaf = self.new_leaf(pass.u);
                let p = self.arena.p_node(Vec::new());
                self.arena.replace(son, p)?;
                self.arena.adopt(p, son)?;
                self.arena.adopt(p, leaf)?;
                pass.touched.push(p);
            }
        }
        Ok(())
    }

    /// Applies the bottom template to `chain.last()` and folds every node above it, up to
    /// `chain[0]` (`n_up`).
    pub(super) fn place_along(&mut self, pass: &mut Pass, chain: &[Step]) -> Result<bool> {
        let Some((bottom, above)) = chain.split_last() else {
            return Err(Error::internal("empty template chain"));
        };
        let started = match self.arena.node(bottom.node).kind {
            Kind::Leaf | Kind::P { .. } => Some(self.wrap_in_q(pass, bottom.node)?),
            Kind::Q { .. } => self.q_append(pass, bottom.node)?,
            Kind::Section { .. } => {
                return Err(Error::internal(format!(
                    "section {} at the bottom of the path",
                    bottom.node
                )));
            }
        };
        let Some((mut q, k)) = started else {
            return Ok(false);
        };

        for (i, step) in above.iter().enumerate().rev() {
            match self.arena.node(step.node).kind {
                Kind::P { .. } => self.p_absorb(pass, step.node, q, k)?,
                Kind::Q { .. } => {
                    let Some(s) = step.section else {
                        return Err(Error::internal(format!(
                            "Q-node {} above the bottom without a path section",
                            step.node
                        )));
                    };
                    if !self.q_absorb(step.node, s, q, k, i == 0)? {
                        return Ok(false);
                    }
                    q = step.node;
                }
                Kind::Leaf | Kind::Section { .. } => {
                    return Err(Error::internal(format!(
                        "node {} cannot sit above another path node",
                        step.node
                    )));
                }
            }
        }

        pass.hoist = Some(q);
        Ok(true)
    }

    /// L2 and P2: `x` becomes the son of the left section of a new two-section Q-node whose right
    /// section `K` carries the new vertex. Returns the Q-node and `K`.
    fn wrap_in_q(&mut self, pass: &mut Pass, x: NodeId) -> Result<(NodeId, NodeId)> {
        let (a, n) = self.split(x);
        let is_p = self.arena.is_p(x);
        let template = if is_p { "P2" } else { "L2" };
        trace!(template, node = x, "wrap in Q-node");

        self.arena.node_mut(x).vertices = n;
        let hole = self.arena.leaf(Vec::new());
        self.arena.replace(x, hole)?;
        let leaf = self.new_leaf(pass.u);
        let q = self.arena.q_node(vec![(a.clone(), x), (a.clone(), leaf)])?;
        self.arena.replace(hole, q)?;
        self.arena.discard(hole);

        let (first, k) = self.arena.ends(q)?;
        for v in a {
            self.slots[v.index()] = Slot::Span(first, k);
        }
        if is_p {
            pass.touched.push(x);
        }
        Ok((q, k))
    }

    /// Q2: the neighbors held by `x` must reach one outer section; `K` is appended there.
    fn q_append(&mut self, pass: &mut Pass, x: NodeId) -> Result<Option<(NodeId, NodeId)>> {
        let a_x = Self::alist_of(pass, x);
        let (first, last) = self.arena.ends(x)?;
        if !self.all_span(&a_x, last)? {
            if !self.all_span(&a_x, first)? {
                trace!(template = "Q2", q = x, "neighbors miss both ends");
                return Ok(None);
            }
            self.arena.reverse(x)?;
        }
        trace!(template = "Q2", q = x, "append K");

        let (_, last) = self.arena.ends(x)?;
        let leaf = self.new_leaf(pass.u);
        let k = self
            .arena
            .insert_section(x, Some(last), None, leaf, a_x.clone())?;
        for a in a_x {
            self.move_endpoint(a, last, k);
        }
        Ok(Some((x, k)))
    }

    /// P3: the P-node `x` above `q` dissolves into `q`. Its other children become a new left
    /// section; its own vertices cover every section, except `K` for non-neighbors.
    fn p_absorb(&mut self, pass: &mut Pass, x: NodeId, q: NodeId, k: NodeId) -> Result<()> {
        let (a, n) = self.split(x);
        let children = self.arena.children(x)?.to_vec();
        let others: Vec<NodeId> = children.iter().copied().filter(|&c| c != q).collect();
        if others.len() + 1 != children.len() {
            return Err(Error::internal(format!(
                "Q-node {q} is not a child of P-node {x}"
            )));
        }
        trace!(template = "P3", p = x, q, others = others.len());

        self.arena.replace(x, q)?;
        let (mut leftmost, _) = self.arena.ends(q)?;
        match others.as_slice() {
            [] => self.arena.discard(x),
            &[only] => {
                self.arena.discard(x);
                leftmost = self
                    .arena
                    .insert_section(q, None, Some(leftmost), only, Vec::new())?;
            }
            _ => {
                self.arena.node_mut(x).vertices.clear();
                self.arena.set_children(x, others)?;
                pass.touched.push(x);
                leftmost = self
                    .arena
                    .insert_section(q, None, Some(leftmost), x, Vec::new())?;
            }
        }

        let Some(before_k) = self.arena.links(k)?.left else {
            return Err(Error::internal(format!("section {k} has no left neighbor")));
        };
        for s in self.arena.sections(q)? {
            let vertices = &mut self.arena.node_mut(s).vertices;
            if s != k {
                vertices.extend(n.iter().copied());
            }
            vertices.extend(a.iter().copied());
        }
        for v in n {
            self.slots[v.index()] = Slot::Span(leftmost, before_k);
        }
        for v in a {
            self.slots[v.index()] = Slot::Span(leftmost, k);
        }
        Ok(())
    }

    /// Q3: `q` replaces the path section `s` of the Q-node `x`, with `K` facing an outer end, or
    /// facing an inner neighbor of `s` when `x` is `n_up`.
    fn q_absorb(
        &mut self,
        x: NodeId,
        s: NodeId,
        q: NodeId,
        k: NodeId,
        is_up: bool,
    ) -> Result<bool> {
        if self.arena.links(s)?.son != q {
            return Err(Error::internal(format!(
                "Q-node {q} is not the son of section {s}"
            )));
        }
        let (first, last) = self.arena.ends(x)?;
        if s == first {
            self.arena.reverse(x)?;
        } else if s != last {
            if !is_up {
                trace!(template = "Q3", q = x, "inner path section below n_up");
                return Ok(false);
            }
            let links = self.arena.links(s)?;
            if !links.right.is_some_and(|t| self.disjoint_remaining(s, t)) {
                if !links.left.is_some_and(|t| self.disjoint_remaining(s, t)) {
                    trace!(template = "Q3", q = x, "no inner gap fits");
                    return Ok(false);
                }
                self.arena.reverse(x)?;
            }
        }
        trace!(template = "Q3", q = x, section = s, "splice");

        let parts = self.arena.sections(q)?;
        let m = parts.len();
        if m < 2 || parts[m - 1] != k {
            return Err(Error::internal(format!(
                "section {k} is not the right end of Q-node {q}"
            )));
        }
        let (far, near) = (parts[0], parts[m - 2]);

        let carried = self.arena.node(s).vertices.clone();
        for v in carried {
            let adjacent = self.in_a[v.index()];
            for &p in &parts[..m - 1] {
                self.arena.node_mut(p).vertices.push(v);
            }
            if adjacent {
                self.arena.node_mut(k).vertices.push(v);
            }

            let Slot::Span(e1, e2) = self.slots[v.index()] else {
                return Err(Error::internal(format!("{v} in section {s} without a span")));
            };
            let (lo, hi) = if self.arena.rank(e1)? <= self.arena.rank(e2)? {
                (e1, e2)
            } else {
                (e2, e1)
            };
            let lo = if lo == s { far } else { lo };
            let hi = match (hi == s, adjacent) {
                (false, _) => hi,
                (true, true) => k,
                (true, false) => near,
            };
            self.slots[v.index()] = Slot::Span(lo, hi);
        }

        self.arena.splice_sections(x, s, q)?;
        Ok(true)
    }
}
