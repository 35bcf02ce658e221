//! Lexicographic breadth-first search by partition refinement.
//!
//! The unlabelled vertices live in an ordered sequence of groups. Each step labels the first
//! vertex of the last group, then moves every unlabelled neighbor of it into a fresh group placed
//! immediately after the group it came from. A group receives at most one such replacement per
//! step and is dropped as soon as it runs empty, so one sweep costs `O(n + m)`.

use crate::error::{Error, Result};
use crate::graph::{Graph, VertexId};

/// Which end of the rank range the sweep fills first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ranks `0, 1, ..., n - 1` in visiting order.
    Forward,
    /// Ranks `n - 1, n - 2, ..., 0` in visiting order, so `order()` reads as an elimination
    /// ordering.
    Backward,
}

/// A bijection between the live vertices and ranks `0..n`.
#[derive(Debug, Clone)]
pub struct Ordering {
    order: Vec<VertexId>,
    rank: Vec<Option<usize>>,
}

impl Ordering {
    /// Vertices by ascending rank.
    pub fn order(&self) -> &[VertexId] {
        &self.order
    }

    pub fn rank(&self, v: VertexId) -> Option<usize> {
        self.rank.get(v.index()).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_order(self) -> Vec<VertexId> {
        self.order
    }

    pub(crate) fn rank_of(&self, v: VertexId) -> usize {
        self.rank[v.index()].unwrap_or(usize::MAX)
    }
}

/// Ordering produced by the path-finding sweep, with hop counts from the seed.
#[derive(Debug, Clone)]
pub struct PathOrdering {
    pub ordering: Ordering,
    distance: Vec<Option<u32>>,
}

impl PathOrdering {
    /// Hop count from the seed, along the search tree. `None` for vertices the seed never reached
    /// before they were labelled.
    pub fn distance(&self, v: VertexId) -> Option<u32> {
        self.distance.get(v.index()).copied().flatten()
    }
}

#[derive(Debug, Clone, Default)]
struct Group {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    prev: Option<usize>,
    next: Option<usize>,
    replacement: Option<usize>,
}

struct Partition {
    groups: Vec<Group>,
    last: Option<usize>,
    group_of: Vec<usize>,
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    labelled: Vec<bool>,
}

impl Partition {
    fn new(bound: usize) -> Self {
        Self {
            groups: Vec::new(),
            last: None,
            group_of: vec![usize::MAX; bound],
            prev: vec![None; bound],
            next: vec![None; bound],
            labelled: vec![true; bound],
        }
    }

    /// Appends an empty group at the high-priority end.
    fn push_group(&mut self) -> usize {
        let g = self.groups.len();
        self.groups.push(Group {
            prev: self.last,
            ..Default::default()
        });
        if let Some(last) = self.last {
            self.groups[last].next = Some(g);
        }
        self.last = Some(g);
        g
    }

    fn insert_group_after(&mut self, g: usize) -> usize {
        let ng = self.groups.len();
        let next = self.groups[g].next;
        self.groups.push(Group {
            prev: Some(g),
            next,
            ..Default::default()
        });
        self.groups[g].next = Some(ng);
        match next {
            Some(n) => self.groups[n].prev = Some(ng),
            None => self.last = Some(ng),
        }
        ng
    }

    fn remove_group(&mut self, g: usize) {
        let Group { prev, next, .. } = self.groups[g];
        if let Some(p) = prev {
            self.groups[p].next = next;
        }
        match next {
            Some(n) => self.groups[n].prev = prev,
            None => self.last = prev,
        }
    }

    fn append(&mut self, g: usize, v: usize) {
        self.labelled[v] = false;
        self.group_of[v] = g;
        self.next[v] = None;
        self.prev[v] = self.groups[g].tail;
        match self.groups[g].tail {
            Some(t) => self.next[t] = Some(v),
            None => self.groups[g].head = Some(v),
        }
        self.groups[g].tail = Some(v);
        self.groups[g].len += 1;
    }

    fn unlink(&mut self, v: usize) {
        let g = self.group_of[v];
        match self.prev[v] {
            Some(p) => self.next[p] = self.next[v],
            None => self.groups[g].head = self.next[v],
        }
        match self.next[v] {
            Some(n) => self.prev[n] = self.prev[v],
            None => self.groups[g].tail = self.prev[v],
        }
        self.groups[g].len -= 1;
    }

    /// Removes and returns the first vertex of the last group.
    fn pop(&mut self) -> Option<usize> {
        let g = self.last?;
        let v = self.groups[g].head?;
        self.unlink(v);
        self.labelled[v] = true;
        if self.groups[g].len == 0 {
            self.remove_group(g);
        }
        Some(v)
    }

    /// Moves every unlabelled neighbor of the vertex just labelled one group up. Calls `reached`
    /// for each vertex moved.
    fn refine(&mut self, neighbors: &[VertexId], mut reached: impl FnMut(usize)) {
        let mut touched: Vec<usize> = Vec::new();
        for n in neighbors {
            let w = n.index();
            if self.labelled[w] {
                continue;
            }
            let g = self.group_of[w];
            let target = match self.groups[g].replacement {
                Some(r) => r,
                None => {
                    let r = self.insert_group_after(g);
                    self.groups[g].replacement = Some(r);
                    touched.push(g);
                    r
                }
            };
            self.unlink(w);
            self.append(target, w);
            reached(w);
        }
        for g in touched {
            self.groups[g].replacement = None;
            if self.groups[g].len == 0 {
                self.remove_group(g);
            }
        }
    }
}

fn sweep(
    graph: &Graph,
    mut partition: Partition,
    direction: Direction,
    mut on_label: impl FnMut(usize, &mut Partition),
) -> Ordering {
    let n = graph.vertex_count();
    let mut order = vec![VertexId::new(0); n];
    let mut rank = vec![None; graph.id_bound()];

    for step in 0..n {
        let Some(v) = partition.pop() else {
            debug_assert!(false, "partition ran dry after {step} of {n} vertices");
            break;
        };
        let r = match direction {
            Direction::Forward => step,
            Direction::Backward => n - 1 - step,
        };
        rank[v] = Some(r);
        order[r] = VertexId::new(v);
        on_label(v, &mut partition);
    }

    Ordering { order, rank }
}

/// Plain LexBFS over every live vertex, starting from one group in ascending id order.
pub fn lexbfs(graph: &Graph, direction: Direction) -> Ordering {
    let mut partition = Partition::new(graph.id_bound());
    let g = partition.push_group();
    for v in graph.vertices() {
        partition.append(g, v.index());
    }

    sweep(graph, partition, direction, |v, p| {
        p.refine(graph.neighbors(VertexId::new(v)), |_| {})
    })
}

/// LexBFS seeded from the triple `(u, v, w)`.
///
/// `u` and its neighbors other than `v` and `w` start in a low-priority group, so the search
/// exhausts everything reachable from `w` without passing through `N[u]` before it touches them.
/// `w` is labelled first with distance 0; every vertex gets the distance of the vertex that first
/// reached it plus one. Ranks are assigned forwards.
pub fn lexbfs_path(graph: &Graph, triple: [VertexId; 3]) -> PathOrdering {
    let [u, v, w] = triple;
    let bound = graph.id_bound();
    let mut partition = Partition::new(bound);
    let low = partition.push_group();
    let high = partition.push_group();

    let mut in_low = vec![false; bound];
    in_low[u.index()] = true;
    for &n in graph.neighbors(u) {
        if n != v && n != w {
            in_low[n.index()] = true;
        }
    }

    partition.append(high, w.index());
    partition.append(high, v.index());
    partition.append(low, u.index());
    for &n in graph.neighbors(u) {
        if in_low[n.index()] {
            partition.append(low, n.index());
        }
    }
    for x in graph.vertices() {
        if x != v && x != w && !in_low[x.index()] {
            partition.append(high, x.index());
        }
    }
    if partition.groups[low].len == 0 {
        partition.remove_group(low);
    }

    let mut distance: Vec<Option<u32>> = vec![None; bound];
    distance[w.index()] = Some(0);

    let ordering = sweep(graph, partition, Direction::Forward, |x, p| {
        let next = distance[x].map(|d| d + 1);
        p.refine(graph.neighbors(VertexId::new(x)), |y| {
            if distance[y].is_none() {
                distance[y] = next;
            }
        })
    });

    PathOrdering { ordering, distance }
}

/// Adjacency lists sorted by ascending rank, indexed by [`VertexId::index`].
pub fn sorted_adjacency(graph: &Graph, ordering: &Ordering) -> Vec<Vec<VertexId>> {
    let mut lists: Vec<Vec<VertexId>> = vec![Vec::new(); graph.id_bound()];
    for &x in ordering.order() {
        for &n in graph.neighbors(x) {
            lists[n.index()].push(x);
        }
    }
    lists
}

/// Chordless path from `triple[1]` to `triple[2]` whose inner vertices avoid `N[triple[0]]`.
///
/// Walks from `triple[1]` to the first listed neighbor with a smaller distance until the seed is
/// reached, then appends the seed.
pub fn shortest_avoiding_path(graph: &Graph, triple: [VertexId; 3]) -> Result<Vec<VertexId>> {
    let [u, v, w] = triple;
    let seeded = lexbfs_path(graph, triple);
    let adjacency = sorted_adjacency(graph, &seeded.ordering);

    let mut path = Vec::new();
    let mut current = v;
    loop {
        let Some(d) = seeded.distance(current) else {
            return Err(Error::internal(format!(
                "{v} is not connected to {w} outside the neighborhood of {u}"
            )));
        };
        if d == 0 {
            break;
        }
        path.push(current);
        let step = adjacency[current.index()]
            .iter()
            .copied()
            .find(|&n| seeded.distance(n).is_some_and(|nd| nd < d));
        let Some(step) = step else {
            return Err(Error::internal(format!("path walk stalled at {current}")));
        };
        current = step;
    }

    if current != w {
        return Err(Error::internal(format!(
            "path walk from {v} ended at {current} instead of {w}"
        )));
    }
    path.push(w);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: usize) -> (Graph, Vec<VertexId>) {
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..n).map(|_| g.add_vertex()).collect();
        for pair in v.windows(2) {
            g.add_edge(pair[0], pair[1]).unwrap();
        }
        (g, v)
    }

    #[test]
    fn forward_sweep_on_a_path_visits_in_bfs_order() {
        let (g, v) = path_graph(4);
        let ordering = lexbfs(&g, Direction::Forward);
        assert_eq!(ordering.order(), &[v[0], v[1], v[2], v[3]]);
        assert_eq!(ordering.rank(v[2]), Some(2));
    }

    #[test]
    fn backward_sweep_fills_ranks_from_the_top() {
        let (g, v) = path_graph(3);
        let ordering = lexbfs(&g, Direction::Backward);
        assert_eq!(ordering.order(), &[v[2], v[1], v[0]]);
        assert_eq!(ordering.rank(v[0]), Some(2));
    }

    #[test]
    fn neighbors_of_the_labelled_vertex_take_priority() {
        // 0 - 1, 0 - 3, 3 - 2: after 0 the search must take 1 and 3 before 2.
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..4).map(|_| g.add_vertex()).collect();
        g.add_edge(v[0], v[1]).unwrap();
        g.add_edge(v[0], v[3]).unwrap();
        g.add_edge(v[3], v[2]).unwrap();

        let ordering = lexbfs(&g, Direction::Forward);
        assert_eq!(ordering.order(), &[v[0], v[1], v[3], v[2]]);
    }

    #[test]
    fn lexicographic_labels_break_bfs_ties() {
        // 0 is adjacent to 1, 2, 3; only 3 is adjacent to 1, so 3 must follow 1 before 2.
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..5).map(|_| g.add_vertex()).collect();
        g.add_edge(v[0], v[1]).unwrap();
        g.add_edge(v[0], v[2]).unwrap();
        g.add_edge(v[0], v[3]).unwrap();
        g.add_edge(v[1], v[3]).unwrap();
        g.add_edge(v[2], v[4]).unwrap();

        let ordering = lexbfs(&g, Direction::Forward);
        assert_eq!(ordering.order(), &[v[0], v[1], v[3], v[2], v[4]]);
    }

    #[test]
    fn disconnected_vertices_are_all_ranked() {
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..3).map(|_| g.add_vertex()).collect();
        g.add_edge(v[1], v[2]).unwrap();
        let ordering = lexbfs(&g, Direction::Forward);
        assert_eq!(ordering.len(), 3);
        let mut seen: Vec<_> = ordering.order().to_vec();
        seen.sort();
        assert_eq!(seen, v);
    }

    #[test]
    fn path_mode_avoids_the_closed_neighborhood_of_u() {
        // Cycle 0-1-2-3-4-5-0 with u = 0, v = 1, w = 5.
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..6).map(|_| g.add_vertex()).collect();
        for i in 0..6 {
            g.add_edge(v[i], v[(i + 1) % 6]).unwrap();
        }

        let seeded = lexbfs_path(&g, [v[0], v[1], v[5]]);
        assert_eq!(seeded.ordering.order()[0], v[5]);
        assert_eq!(seeded.distance(v[5]), Some(0));
        assert_eq!(seeded.distance(v[4]), Some(1));
        assert_eq!(seeded.distance(v[1]), Some(4));
        assert_eq!(*seeded.ordering.order().last().unwrap(), v[0]);

        let path = shortest_avoiding_path(&g, [v[0], v[1], v[5]]).unwrap();
        assert_eq!(path, vec![v[1], v[2], v[3], v[4], v[5]]);
    }

    #[test]
    fn path_walk_fails_without_a_connecting_path() {
        // 1 and 2 only meet through 0.
        let mut g = Graph::new();
        let v: Vec<VertexId> = (0..3).map(|_| g.add_vertex()).collect();
        g.add_edge(v[0], v[1]).unwrap();
        g.add_edge(v[0], v[2]).unwrap();

        assert!(matches!(
            shortest_avoiding_path(&g, [v[0], v[1], v[2]]),
            Err(Error::Internal { .. })
        ));
    }
}
