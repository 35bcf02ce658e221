//! Undirected simple graph container.
//!
//! Vertices get stable integer ids that are never reused while the graph lives, so the id space
//! may contain holes after [`Graph::remove_vertex`]. Algorithms index scratch arrays by
//! [`VertexId::index`] and size them with [`Graph::id_bound`].

use crate::error::{Error, Result};
use crate::interval::Interval;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use std::fmt;

mod components;

type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VertexId(u32);

impl VertexId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Vertex {
    label: String,
    neighbors: Vec<VertexId>,
    interval: Option<Interval>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: Vec<Option<Vertex>>,
    edges: HashSet<(VertexId, VertexId)>,
    live: usize,
}

fn edge_key(u: VertexId, v: VertexId) -> (VertexId, VertexId) {
    if u < v { (u, v) } else { (v, u) }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The complete graph on `n` vertices.
    pub fn complete(n: usize) -> Self {
        let mut g = Self::new();
        let ids: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        for (i, &u) in ids.iter().enumerate() {
            for &v in &ids[i + 1..] {
                g.link(u, v);
            }
        }
        g
    }

    /// Adds a vertex labelled with its one-based position, the way the graph file numbers them.
    pub fn add_vertex(&mut self) -> VertexId {
        let label = (self.vertices.len() + 1).to_string();
        self.add_labeled_vertex(label)
    }

    pub fn add_labeled_vertex(&mut self, label: impl Into<String>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Some(Vertex {
            label: label.into(),
            neighbors: Vec::new(),
            interval: None,
        }));
        self.live += 1;
        id
    }

    /// Removes `id` together with every incident edge.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<()> {
        let vertex = self
            .vertices
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(Error::UnknownVertex { vertex: id })?;
        for &n in &vertex.neighbors {
            self.edges.remove(&edge_key(id, n));
            if let Some(Some(other)) = self.vertices.get_mut(n.index()) {
                other.neighbors.retain(|&w| w != id);
            }
        }
        self.live -= 1;
        Ok(())
    }

    /// Adds the undirected edge `u -- v`. Self-loops, duplicates and unknown endpoints are
    /// rejected.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<()> {
        if self.ensure_edge(u, v)? {
            Ok(())
        } else {
            Err(Error::DuplicateEdge { u, v })
        }
    }

    /// Idempotent variant of [`Graph::add_edge`]: returns `false` when the edge already existed.
    pub fn ensure_edge(&mut self, u: VertexId, v: VertexId) -> Result<bool> {
        self.check(u)?;
        self.check(v)?;
        if u == v {
            return Err(Error::SelfLoop { vertex: u });
        }
        if self.edges.contains(&edge_key(u, v)) {
            return Ok(false);
        }
        self.link(u, v);
        Ok(true)
    }

    fn link(&mut self, u: VertexId, v: VertexId) {
        self.edges.insert(edge_key(u, v));
        if let Some(Some(a)) = self.vertices.get_mut(u.index()) {
            a.neighbors.push(v);
        }
        if let Some(Some(b)) = self.vertices.get_mut(v.index()) {
            b.neighbors.push(u);
        }
    }

    fn check(&self, id: VertexId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::UnknownVertex { vertex: id })
        }
    }

    fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.vertex(id).is_some()
    }

    pub fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.edges.contains(&edge_key(u, v))
    }

    pub fn vertex_count(&self) -> usize {
        self.live
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// One past the largest id ever handed out.
    pub fn id_bound(&self) -> usize {
        self.vertices.len()
    }

    /// Live vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| VertexId::new(i))
    }

    /// Every edge once, as `(lower id, higher id)`, grouped by the lower endpoint.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.vertices().flat_map(move |u| {
            self.neighbors(u)
                .iter()
                .filter(move |&&v| u < v)
                .map(move |&v| (u, v))
        })
    }

    /// Neighbors in edge insertion order. Empty for an unknown id.
    pub fn neighbors(&self, id: VertexId) -> &[VertexId] {
        self.vertex(id).map_or(&[], |v| v.neighbors.as_slice())
    }

    pub fn degree(&self, id: VertexId) -> usize {
        self.neighbors(id).len()
    }

    pub fn label(&self, id: VertexId) -> Option<&str> {
        self.vertex(id).map(|v| v.label.as_str())
    }

    pub fn set_label(&mut self, id: VertexId, label: impl Into<String>) -> Result<()> {
        match self.vertices.get_mut(id.index()) {
            Some(Some(v)) => {
                v.label = label.into();
                Ok(())
            }
            _ => Err(Error::UnknownVertex { vertex: id }),
        }
    }

    /// The interval stored by the last successful [`crate::recognize_in_place`].
    pub fn interval(&self, id: VertexId) -> Option<Interval> {
        self.vertex(id).and_then(|v| v.interval)
    }

    pub(crate) fn set_interval(&mut self, id: VertexId, interval: Interval) {
        if let Some(Some(v)) = self.vertices.get_mut(id.index()) {
            v.interval = Some(interval);
        }
    }

    pub(crate) fn clear_intervals(&mut self) {
        for v in self.vertices.iter_mut().flatten() {
            v.interval = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_rejects_malformed_input() {
        let mut g = Graph::new();
        let a = g.add_vertex();
        let b = g.add_vertex();

        assert!(matches!(g.add_edge(a, a), Err(Error::SelfLoop { .. })));
        assert!(matches!(
            g.add_edge(a, VertexId::new(9)),
            Err(Error::UnknownVertex { .. })
        ));
        g.add_edge(a, b).unwrap();
        assert!(matches!(g.add_edge(b, a), Err(Error::DuplicateEdge { .. })));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn ensure_edge_is_idempotent_and_symmetric() {
        let mut g = Graph::new();
        let a = g.add_vertex();
        let b = g.add_vertex();

        assert!(g.ensure_edge(a, b).unwrap());
        assert!(!g.ensure_edge(b, a).unwrap());
        assert_eq!(g.neighbors(a), &[b]);
        assert_eq!(g.neighbors(b), &[a]);
        assert!(g.has_edge(b, a));
    }

    #[test]
    fn remove_vertex_keeps_ids_stable() {
        let mut g = Graph::complete(3);
        let ids: Vec<_> = g.vertices().collect();
        g.remove_vertex(ids[1]).unwrap();

        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.neighbors(ids[0]), &[ids[2]]);
        assert_eq!(g.id_bound(), 3);

        let d = g.add_vertex();
        assert_eq!(d.index(), 3);
        assert_eq!(g.label(d), Some("4"));
        assert!(g.remove_vertex(ids[1]).is_err());
    }

    #[test]
    fn edges_lists_each_edge_once() {
        let g = Graph::complete(4);
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges.len(), 6);
        assert!(edges.iter().all(|(u, v)| u < v));
    }
}
