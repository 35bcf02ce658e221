use crate::graph::{Graph, VertexId};
use indexmap::IndexMap;
use serde::Serialize;

/// Half-open span of clique positions `[start, end)`. Positions start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Returns the first pair whose adjacency in `graph` disagrees with the overlap of their
/// intervals, or `None` when the intervals represent `graph` exactly.
///
/// Sweeps the intervals by start position, so the cost is linear in the number of overlapping
/// pairs plus a sort.
pub fn find_mismatch(
    graph: &Graph,
    intervals: &IndexMap<VertexId, Interval>,
) -> Option<(VertexId, VertexId)> {
    let mut by_start: Vec<(VertexId, Interval)> =
        intervals.iter().map(|(&v, &iv)| (v, iv)).collect();
    by_start.sort_by_key(|&(v, iv)| (iv.start, v));

    let mut marked = vec![false; graph.id_bound()];
    let mut overlapping_pairs = 0usize;
    for (i, &(v, iv)) in by_start.iter().enumerate() {
        for &n in graph.neighbors(v) {
            marked[n.index()] = true;
        }
        for &(w, other) in &by_start[i + 1..] {
            if other.start >= iv.end {
                break;
            }
            overlapping_pairs += 1;
            if !marked[w.index()] {
                clear(&mut marked, graph.neighbors(v));
                return Some((v, w));
            }
        }
        clear(&mut marked, graph.neighbors(v));
    }

    if overlapping_pairs == graph.edge_count() {
        return None;
    }

    // Some edge has no overlap; find it for the report.
    graph.edges().find(|(u, v)| match (intervals.get(u), intervals.get(v)) {
        (Some(a), Some(b)) => !a.overlaps(b),
        _ => true,
    })
}

fn clear(marked: &mut [bool], vertices: &[VertexId]) {
    for &n in vertices {
        marked[n.index()] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = Interval::new(1, 2);
        let b = Interval::new(2, 4);
        assert!(!a.overlaps(&b));
        assert!(b.overlaps(&Interval::new(3, 5)));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn mismatch_reports_missing_and_extra_overlaps() {
        let mut g = Graph::new();
        let a = g.add_vertex();
        let b = g.add_vertex();
        let c = g.add_vertex();
        g.add_edge(a, b).unwrap();

        let mut intervals = IndexMap::new();
        intervals.insert(a, Interval::new(1, 3));
        intervals.insert(b, Interval::new(2, 4));
        intervals.insert(c, Interval::new(4, 5));
        assert_eq!(find_mismatch(&g, &intervals), None);

        intervals.insert(c, Interval::new(3, 5));
        assert_eq!(find_mismatch(&g, &intervals), Some((b, c)));

        intervals.insert(c, Interval::new(4, 5));
        intervals.insert(b, Interval::new(3, 4));
        assert_eq!(find_mismatch(&g, &intervals), Some((a, b)));
    }
}
