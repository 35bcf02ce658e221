//! Incremental MPQ-tree.
//!
//! Vertices are inserted in a forward LexBFS order of a chordal graph. Each insertion looks at the
//! neighbors already placed, finds the root path they occupy and rewrites the nodes between the
//! highest partially-adjacent node (`n_up`) and the lowest affected node (`n_down`) with one
//! template per node. A configuration the templates cannot accommodate means the graph is not an
//! interval graph.
//!
//! The tree is an index arena: [`arena::Node`]s reference parents, children and sibling sections
//! by [`arena::NodeId`]. Every placed vertex has a [`arena::Slot`] telling where it is stored.

use crate::error::{Error, Result};
use crate::graph::{Graph, VertexId};
use arena::{Arena, Kind, NodeId, Slot};
use rustc_hash::FxBuildHasher;
use tracing::trace;

mod arena;
mod intervals;
mod templates;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Result of [`MpqTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    /// The vertex cannot be added: the graph is not an interval graph. The tree must be
    /// discarded.
    Rejected,
}

#[derive(Debug, Clone, Default)]
pub struct MpqTree {
    arena: Arena,
    slots: Vec<Slot>,
    /// Marks the already-placed neighbors of the vertex being inserted.
    in_a: Vec<bool>,
    placed: usize,
}

/// Scratch state of one insertion.
struct Pass {
    u: VertexId,
    /// Placed neighbors of `u`, grouped by the node owning them. Section vertices are owned by
    /// their Q-node.
    alist: HashMap<NodeId, Vec<VertexId>>,
    /// P-nodes that may need the H1/H2 simplifications.
    touched: Vec<NodeId>,
    /// Q-node that may now hold vertices spanning all of its sections.
    hoist: Option<NodeId>,
}

/// A node on the root path of the placed neighbors; `section` is the path section of a Q-node.
#[derive(Debug, Clone, Copy)]
struct Step {
    node: NodeId,
    section: Option<NodeId>,
}

impl MpqTree {
    pub fn new(id_bound: usize) -> Self {
        Self {
            arena: Arena::default(),
            slots: vec![Slot::Absent; id_bound],
            in_a: vec![false; id_bound],
            placed: 0,
        }
    }

    /// Number of vertices inserted so far.
    pub fn len(&self) -> usize {
        self.placed
    }

    pub fn is_empty(&self) -> bool {
        self.placed == 0
    }

    /// Inserts `u`, whose already-inserted neighbors in `graph` are taken as the earlier ones.
    ///
    /// `Ok(Insertion::Rejected)` means the graph is not an interval graph; `Err` means a broken
    /// tree invariant.
    pub fn insert(&mut self, graph: &Graph, u: VertexId) -> Result<Insertion> {
        if self.slots.len() < graph.id_bound() {
            self.slots.resize(graph.id_bound(), Slot::Absent);
            self.in_a.resize(graph.id_bound(), false);
        }
        if !graph.contains(u) {
            return Err(Error::UnknownVertex { vertex: u });
        }
        if self.slots[u.index()] != Slot::Absent {
            return Err(Error::internal(format!("{u} inserted twice")));
        }

        let placed: Vec<VertexId> = graph
            .neighbors(u)
            .iter()
            .copied()
            .filter(|n| self.slots[n.index()] != Slot::Absent)
            .collect();
        trace!(vertex = %u, placed = placed.len(), "mpq insert");

        let outcome = if placed.is_empty() {
            self.add_isolated(u).map(|()| Insertion::Inserted)
        } else {
            for a in &placed {
                self.in_a[a.index()] = true;
            }
            let outcome = self.insert_adjacent(u, &placed);
            for a in &placed {
                self.in_a[a.index()] = false;
            }
            outcome
        };

        if let Ok(Insertion::Inserted) = outcome {
            self.placed += 1;
        }
        outcome
    }

    fn add_isolated(&mut self, u: VertexId) -> Result<()> {
        let leaf = self.new_leaf(u);
        match self.arena.root {
            None => self.arena.root = Some(leaf),
            Some(root)
                if self.arena.is_p(root) && self.arena.node(root).vertices.is_empty() =>
            {
                self.arena.adopt(root, leaf)?;
            }
            Some(root) => {
                let p = self.arena.p_node(Vec::new());
                self.arena.replace(root, p)?;
                self.arena.adopt(p, root)?;
                self.arena.adopt(p, leaf)?;
            }
        }
        Ok(())
    }

    fn insert_adjacent(&mut self, u: VertexId, placed: &[VertexId]) -> Result<Insertion> {
        let mut pass = Pass {
            u,
            alist: HashMap::default(),
            touched: Vec::new(),
            hoist: None,
        };
        for &a in placed {
            let owner = self.owner(a)?;
            pass.alist.entry(owner).or_default().push(a);
        }

        let Some(path) = self.flag_path(&pass)? else {
            trace!(vertex = %u, "placed neighbors branch off the root path");
            return Ok(Insertion::Rejected);
        };

        for step in &path {
            let (Some(s), Some(list)) = (step.section, pass.alist.get(&step.node)) else {
                continue;
            };
            for &a in list {
                if !self.span_contains(a, s)? {
                    trace!(vertex = %u, "neighbor misses the path section");
                    return Ok(Insertion::Rejected);
                }
            }
        }

        let down = path.len() - 1;
        let mut up = down;
        for (i, step) in path.iter().enumerate() {
            if self.is_partial(step)? {
                up = i;
                break;
            }
        }
        trace!(vertex = %u, n_up = path[up].node, n_down = path[down].node, "mpq path");

        let applied = if up == down {
            self.place_at(&mut pass, path[down].node)?
        } else {
            self.place_along(&mut pass, &path[up..])?
        };
        if !applied {
            return Ok(Insertion::Rejected);
        }

        if let Some(q) = pass.hoist {
            self.hoist(q)?;
        }
        self.simplify(pass.touched)?;
        Ok(Insertion::Inserted)
    }

    /// Walks from every owner to the root and returns the resulting path top-down, or `None`
    /// when some node is entered through two different children.
    fn flag_path(&self, pass: &Pass) -> Result<Option<Vec<Step>>> {
        let mut below: HashMap<NodeId, Option<NodeId>> = HashMap::default();
        for &owner in pass.alist.keys() {
            let mut node = owner;
            let mut child = None;
            loop {
                if let Some(seen) = below.get_mut(&node) {
                    match (*seen, child) {
                        (Some(a), Some(b)) if a != b => return Ok(None),
                        (None, Some(_)) => *seen = child,
                        _ => {}
                    }
                    break;
                }
                below.insert(node, child);
                let Some(parent) = self.arena.node(node).parent else {
                    break;
                };
                child = Some(node);
                node = parent;
            }
        }

        let Some(root) = self.arena.root else {
            return Err(Error::internal("tree has no root"));
        };
        let mut path = Vec::new();
        let mut cursor = Some(root);
        while let Some(node) = cursor {
            let Some(&next) = below.get(&node) else {
                return Err(Error::internal(format!("node {node} is off the flagged path")));
            };
            match self.arena.node(node).kind {
                Kind::Section { .. } => {}
                Kind::Q { .. } => path.push(Step {
                    node,
                    section: next,
                }),
                _ => path.push(Step {
                    node,
                    section: None,
                }),
            }
            cursor = next;
        }
        if path.is_empty() {
            return Err(Error::internal("empty root path"));
        }
        Ok(Some(path))
    }

    /// Whether the node still holds a vertex that is not adjacent to the new one. A Q-node at the
    /// bottom of the path always counts as partial.
    fn is_partial(&self, step: &Step) -> Result<bool> {
        let holder = match self.arena.node(step.node).kind {
            Kind::Q { .. } => match step.section {
                Some(s) => s,
                None => return Ok(true),
            },
            Kind::Section { .. } => {
                return Err(Error::internal(format!(
                    "section {} on the root path",
                    step.node
                )));
            }
            _ => step.node,
        };
        Ok(self
            .arena
            .node(holder)
            .vertices
            .iter()
            .any(|v| !self.in_a[v.index()]))
    }

    fn owner(&self, v: VertexId) -> Result<NodeId> {
        match self.slots[v.index()] {
            Slot::Node(n) => Ok(n),
            Slot::Span(s, _) => self
                .arena
                .node(s)
                .parent
                .ok_or_else(|| Error::internal(format!("section {s} has no Q-node"))),
            Slot::Absent => Err(Error::internal(format!("{v} is not in the tree"))),
        }
    }

    fn span_contains(&self, v: VertexId, s: NodeId) -> Result<bool> {
        let Slot::Span(e1, e2) = self.slots[v.index()] else {
            return Ok(false);
        };
        let (r1, r2, r) = (
            self.arena.rank(e1)?,
            self.arena.rank(e2)?,
            self.arena.rank(s)?,
        );
        Ok(r1.min(r2) <= r && r <= r1.max(r2))
    }

    fn new_leaf(&mut self, u: VertexId) -> NodeId {
        let leaf = self.arena.leaf(vec![u]);
        self.slots[u.index()] = Slot::Node(leaf);
        leaf
    }

    /// Moves vertices spanning every section of `q` into a P-node directly above it.
    fn hoist(&mut self, q: NodeId) -> Result<()> {
        let (first, last) = self.arena.ends(q)?;
        let common: Vec<VertexId> = self
            .arena
            .node(first)
            .vertices
            .iter()
            .copied()
            .filter(|v| match self.slots[v.index()] {
                Slot::Span(a, b) => (a == first && b == last) || (a == last && b == first),
                _ => false,
            })
            .collect();
        if common.is_empty() {
            return Ok(());
        }

        let gone: HashSet<VertexId> = common.iter().copied().collect();
        for s in self.arena.sections(q)? {
            self.arena
                .node_mut(s)
                .vertices
                .retain(|v| !gone.contains(v));
        }

        let wrapper = match self.arena.node(q).parent {
            Some(p) if self.arena.is_p(p) && self.arena.children(p)?.len() == 1 => Some(p),
            _ => None,
        };
        let host = match wrapper {
            Some(p) => p,
            None => {
                let h = self.arena.p_node(Vec::new());
                self.arena.replace(q, h)?;
                self.arena.adopt(h, q)?;
                h
            }
        };
        for &v in &common {
            self.slots[v.index()] = Slot::Node(host);
        }
        trace!(q, host, hoisted = common.len(), "hoist");
        self.arena.node_mut(host).vertices.extend(common);
        Ok(())
    }

    /// H1: a P-node without vertices and with one child is replaced by the child. H2: a P-node
    /// without vertices under another P-node is merged into it.
    fn simplify(&mut self, mut work: Vec<NodeId>) -> Result<()> {
        while let Some(p) = work.pop() {
            let node = self.arena.node(p);
            if !node.alive || !node.vertices.is_empty() || !self.arena.is_p(p) {
                continue;
            }
            let parent = node.parent;
            let children = self.arena.children(p)?.to_vec();
            match children.as_slice() {
                [] => return Err(Error::internal(format!("P-node {p} has no children"))),
                &[only] => {
                    self.arena.replace(p, only)?;
                    self.arena.discard(p);
                    if self.arena.is_p(only) {
                        work.push(only);
                    }
                }
                _ => {
                    if parent.is_some_and(|q| self.arena.is_p(q)) {
                        self.arena.splice_into_parent(p)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::lexbfs::{self, Direction};

    fn build(n: usize, edges: &[(usize, usize)]) -> (Graph, Vec<VertexId>) {
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        for &(a, b) in edges {
            g.add_edge(v[a], v[b]).unwrap();
        }
        (g, v)
    }

    fn insert_all(g: &Graph) -> (MpqTree, Insertion) {
        let mut tree = MpqTree::new(g.id_bound());
        for &v in lexbfs::lexbfs(g, Direction::Forward).order() {
            if tree.insert(g, v).unwrap() == Insertion::Rejected {
                return (tree, Insertion::Rejected);
            }
        }
        (tree, Insertion::Inserted)
    }

    fn assert_represents(g: &Graph, tree: &MpqTree) {
        let intervals = tree.materialize_intervals().unwrap();
        assert_eq!(intervals.len(), g.vertex_count());
        assert_eq!(crate::interval::find_mismatch(g, &intervals), None);
    }

    #[test]
    fn path_becomes_a_chain_of_sections() {
        let (g, v) = build(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let (tree, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Inserted);
        assert_eq!(tree.len(), 5);
        assert_represents(&g, &tree);

        let intervals = tree.materialize_intervals().unwrap();
        assert_eq!(intervals[&v[0]], Interval::new(1, 2));
        assert_eq!(intervals[&v[4]], Interval::new(4, 5));
    }

    #[test]
    fn complete_graph_is_one_clique() {
        let g = Graph::complete(5);
        let (tree, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Inserted);
        assert_eq!(tree.cliques().unwrap().len(), 1);
        assert_represents(&g, &tree);
    }

    #[test]
    fn star_hangs_leaves_under_one_p_node() {
        let (g, _) = build(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        let (tree, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Inserted);
        assert_eq!(tree.cliques().unwrap().len(), 4);
        assert_represents(&g, &tree);
    }

    #[test]
    fn net_is_rejected() {
        let (g, _) = build(6, &[(0, 1), (1, 2), (2, 0), (0, 3), (1, 4), (2, 5)]);
        let (_, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Rejected);
    }

    #[test]
    fn subdivided_claw_is_rejected() {
        // Center 0 with arms 0-1-2, 0-3-4, 0-5-6: 2, 4 and 6 form an asteroidal triple.
        let (g, _) = build(7, &[(0, 1), (1, 2), (0, 3), (3, 4), (0, 5), (5, 6)]);
        let (_, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Rejected);
    }

    #[test]
    fn disjoint_components_share_a_root() {
        let (g, _) = build(6, &[(0, 1), (1, 2), (3, 4)]);
        let (tree, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Inserted);
        assert_represents(&g, &tree);
    }

    #[test]
    fn caterpillar_is_accepted() {
        // Spine 0-1-2-3 with two pendant vertices on each inner spine vertex.
        let (g, _) = build(
            8,
            &[(0, 1), (1, 2), (2, 3), (1, 4), (1, 5), (2, 6), (2, 7)],
        );
        let (tree, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Inserted);
        assert_represents(&g, &tree);
    }

    #[test]
    fn materialize_is_repeatable() {
        let (g, _) = build(
            6,
            &[(0, 1), (0, 2), (1, 2), (2, 3), (3, 4), (3, 5), (4, 5)],
        );
        let (tree, outcome) = insert_all(&g);
        assert_eq!(outcome, Insertion::Inserted);
        assert_eq!(
            tree.materialize_intervals().unwrap(),
            tree.materialize_intervals().unwrap()
        );
        assert_represents(&g, &tree);
    }

    #[test]
    fn inserting_twice_is_an_internal_error() {
        let (g, v) = build(2, &[(0, 1)]);
        let mut tree = MpqTree::new(g.id_bound());
        tree.insert(&g, v[0]).unwrap();
        assert!(matches!(
            tree.insert(&g, v[0]),
            Err(Error::Internal { .. })
        ));
    }
}
