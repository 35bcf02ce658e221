//! Chordality test on a backward LexBFS ordering.
//!
//! The ordering is a perfect elimination ordering exactly when the graph is chordal. It is
//! verified in one linear pass; a failing pair is turned into a chordless cycle with the
//! path-finding sweep.

use crate::error::{Error, Result};
use crate::graph::{Graph, VertexId};
use crate::lexbfs::{self, Direction, Ordering};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chordality {
    /// Perfect elimination ordering, `peo[0]` eliminated first.
    Chordal { peo: Vec<VertexId> },
    /// Chordless cycle of length at least 4.
    NotChordal { cycle: Vec<VertexId> },
}

pub fn check(graph: &Graph) -> Result<Chordality> {
    let ordering = lexbfs::lexbfs(graph, Direction::Backward);
    let adjacency = lexbfs::sorted_adjacency(graph, &ordering);

    let Some((v, w)) = find_violation(graph, &ordering, &adjacency) else {
        debug!(vertices = graph.vertex_count(), "graph is chordal");
        return Ok(Chordality::Chordal {
            peo: ordering.into_order(),
        });
    };

    let cycle = chordless_cycle(graph, &ordering, &adjacency, v, w)?;
    debug!(len = cycle.len(), "graph is not chordal");
    Ok(Chordality::NotChordal { cycle })
}

/// Returns the highest-ranked representative `v` with a later neighbor `w` of some vertex that
/// `v` does not see, or `None` when `ordering` is a perfect elimination ordering.
fn find_violation(
    graph: &Graph,
    ordering: &Ordering,
    adjacency: &[Vec<VertexId>],
) -> Option<(VertexId, VertexId)> {
    let mut pending: Vec<Vec<VertexId>> = vec![Vec::new(); graph.id_bound()];
    for &x in ordering.order() {
        let rank = ordering.rank_of(x);
        let mut right = adjacency[x.index()]
            .iter()
            .copied()
            .skip_while(|&n| ordering.rank_of(n) < rank);
        if let Some(rep) = right.next() {
            pending[rep.index()].extend(right);
        }
    }

    let mut flagged = vec![false; graph.id_bound()];
    for &v in ordering.order().iter().rev() {
        let required = &pending[v.index()];
        if required.is_empty() {
            continue;
        }
        for &n in graph.neighbors(v) {
            flagged[n.index()] = true;
        }
        let missing = required.iter().copied().find(|w| !flagged[w.index()]);
        for &n in graph.neighbors(v) {
            flagged[n.index()] = false;
        }
        if let Some(w) = missing {
            return Some((v, w));
        }
    }
    None
}

/// Closes a cycle `v .. w, u` through a common neighbor `u`, trying common neighbors by
/// ascending rank.
fn chordless_cycle(
    graph: &Graph,
    ordering: &Ordering,
    adjacency: &[Vec<VertexId>],
    v: VertexId,
    w: VertexId,
) -> Result<Vec<VertexId>> {
    let mut flagged = vec![false; graph.id_bound()];
    for &n in graph.neighbors(v) {
        flagged[n.index()] = true;
    }
    let common: Vec<VertexId> = adjacency[w.index()]
        .iter()
        .copied()
        .filter(|n| flagged[n.index()])
        .collect();
    debug_assert!(common.windows(2).all(|p| ordering.rank_of(p[0]) < ordering.rank_of(p[1])));

    for u in common {
        if let Ok(mut cycle) = lexbfs::shortest_avoiding_path(graph, [u, v, w]) {
            cycle.push(u);
            return Ok(cycle);
        }
    }
    Err(Error::internal(format!("no chordless cycle through {v} and {w}")))
}
