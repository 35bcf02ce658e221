//! Certificate checks that do not rely on the engine.

#![allow(dead_code)]

use indexmap::IndexMap;
use interval_graph::{Graph, Interval, Recognition, VertexId};

pub fn build(n: usize, edges: &[(usize, usize)]) -> (Graph, Vec<VertexId>) {
    let mut g = Graph::new();
    let v: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
    for &(a, b) in edges {
        g.add_edge(v[a], v[b]).unwrap();
    }
    (g, v)
}

pub fn assert_intervals_represent(g: &Graph, intervals: &IndexMap<VertexId, Interval>) {
    assert_eq!(intervals.len(), g.vertex_count());
    let ids: Vec<VertexId> = g.vertices().collect();
    for (i, &a) in ids.iter().enumerate() {
        let ia = intervals[&a];
        assert!(ia.start < ia.end, "{a} has an empty interval {ia:?}");
        for &b in &ids[i + 1..] {
            let ib = intervals[&b];
            let overlap = ia.start < ib.end && ib.start < ia.end;
            assert_eq!(
                overlap,
                g.has_edge(a, b),
                "{a} {ia:?} vs {b} {ib:?} disagree with the graph"
            );
        }
    }
}

pub fn assert_chordless_cycle(g: &Graph, cycle: &[VertexId]) {
    let k = cycle.len();
    assert!(k >= 4, "cycle too short: {cycle:?}");
    let mut distinct = cycle.to_vec();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), k, "cycle repeats a vertex: {cycle:?}");
    for i in 0..k {
        for j in i + 1..k {
            let consecutive = j == i + 1 || (i == 0 && j == k - 1);
            assert_eq!(
                g.has_edge(cycle[i], cycle[j]),
                consecutive,
                "bad pair {} {} in {cycle:?}",
                cycle[i],
                cycle[j]
            );
        }
    }
}

pub fn assert_asteroidal(g: &Graph, triple: &[VertexId; 3], paths: &[Vec<VertexId>]) {
    for i in 0..3 {
        for j in i + 1..3 {
            assert_ne!(triple[i], triple[j]);
            assert!(!g.has_edge(triple[i], triple[j]), "{triple:?} not independent");
        }
    }
    assert_eq!(paths.len(), 3);
    for (i, path) in paths.iter().enumerate() {
        let (from, to, third) = (triple[i], triple[(i + 1) % 3], triple[(i + 2) % 3]);
        assert_eq!(path.first(), Some(&from), "path {i} start");
        assert_eq!(path.last(), Some(&to), "path {i} end");
        assert!(path.len() >= 3, "path {i} too short: {path:?}");
        for pair in path.windows(2) {
            assert!(g.has_edge(pair[0], pair[1]), "path {i} broken: {path:?}");
        }
        for &p in path {
            assert!(p != third && !g.has_edge(p, third), "path {i} touches {third}");
        }
    }
}

/// Checks whichever certificate `outcome` carries.
pub fn assert_certificate(g: &Graph, outcome: &Recognition) {
    match outcome {
        Recognition::Chordal { order, intervals } => {
            assert_eq!(order.len(), g.vertex_count());
            assert_intervals_represent(g, intervals);
        }
        Recognition::NotChordal { cycle } => assert_chordless_cycle(g, cycle),
        Recognition::NotInterval {
            asteroidal_triple,
            paths,
        } => assert_asteroidal(g, asteroidal_triple, paths),
    }
}
