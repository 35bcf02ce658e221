//! The `#nodes section` / `#edges section` graph file.
//!
//! ```text
//! #nodes section
//! 3
//! {Ada}
//! {Brook}
//! {Cyd}
//!
//! #edges section
//! 2
//! 1 2
//! 2 3
//! ```
//!
//! Edge endpoints are 1-based positions in the node list.

use interval_graph::{Graph, VertexId};
use std::fmt::Write as _;

const NODES_HEADER: &str = "#nodes section";
const EDGES_HEADER: &str = "#edges section";

#[derive(Debug, thiserror::Error)]
pub enum EdgeListError {
    #[error("missing `{header}` line")]
    MissingSection { header: &'static str },
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("line {line}: expected a count, found `{found}`")]
    BadCount { line: usize, found: String },
    #[error("line {line}: expected `{{label}}`, found `{found}`")]
    BadLabel { line: usize, found: String },
    #[error("line {line}: expected `<a> <b>`, found `{found}`")]
    BadEdge { line: usize, found: String },
    #[error("line {line}: vertex {index} is outside 1..={count}")]
    IndexOutOfRange {
        line: usize,
        index: usize,
        count: usize,
    },
    #[error("line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: interval_graph::Error,
    },
}

/// Numbered, right-trimmed lines; numbers start at 1.
struct Cursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Result<(usize, &'a str), EdgeListError> {
        self.lines
            .next()
            .map(|(i, line)| (i + 1, line.trim_end()))
            .ok_or(EdgeListError::UnexpectedEof { expected })
    }

    fn skip_to(&mut self, header: &'static str) -> Result<(), EdgeListError> {
        for (_, line) in self.lines.by_ref() {
            if line.trim() == header {
                return Ok(());
            }
        }
        Err(EdgeListError::MissingSection { header })
    }

    fn count(&mut self, expected: &'static str) -> Result<usize, EdgeListError> {
        let (line, text) = self.next_line(expected)?;
        text.trim().parse().map_err(|_| EdgeListError::BadCount {
            line,
            found: text.to_string(),
        })
    }
}

pub fn parse(text: &str) -> Result<Graph, EdgeListError> {
    let mut cursor = Cursor::new(text);
    let mut graph = Graph::new();

    cursor.skip_to(NODES_HEADER)?;
    let n = cursor.count("the vertex count")?;
    let mut ids: Vec<VertexId> = Vec::with_capacity(n);
    for _ in 0..n {
        let (line, text) = cursor.next_line("a vertex label")?;
        let Some(label) = text
            .trim_start()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        else {
            return Err(EdgeListError::BadLabel {
                line,
                found: text.to_string(),
            });
        };
        ids.push(graph.add_labeled_vertex(label));
    }

    cursor.skip_to(EDGES_HEADER)?;
    let m = cursor.count("the edge count")?;
    for _ in 0..m {
        let (line, text) = cursor.next_line("an edge")?;
        let bad_edge = || EdgeListError::BadEdge {
            line,
            found: text.to_string(),
        };
        let mut parts = text.split_whitespace();
        let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(bad_edge());
        };
        let a: usize = a.parse().map_err(|_| bad_edge())?;
        let b: usize = b.parse().map_err(|_| bad_edge())?;
        let endpoint = |index: usize| {
            index
                .checked_sub(1)
                .and_then(|i| ids.get(i).copied())
                .ok_or(EdgeListError::IndexOutOfRange { line, index, count: n })
        };
        let (u, v) = (endpoint(a)?, endpoint(b)?);
        graph
            .add_edge(u, v)
            .map_err(|source| EdgeListError::Graph { line, source })?;
    }

    Ok(graph)
}

/// Writes `graph` in the same format. Vertices are numbered by ascending id; edges are listed in
/// depth-first order over the connected components, each edge once.
pub fn write(graph: &Graph) -> String {
    let vertices: Vec<VertexId> = graph.vertices().collect();
    let mut position = vec![0usize; graph.id_bound()];
    for (i, v) in vertices.iter().enumerate() {
        position[v.index()] = i + 1;
    }

    let mut out = String::new();
    let _ = writeln!(out, "{NODES_HEADER}");
    let _ = writeln!(out, "{}", vertices.len());
    for &v in &vertices {
        let _ = writeln!(out, "{{{}}}", graph.label(v).unwrap_or_default());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{EDGES_HEADER}");
    let _ = writeln!(out, "{}", graph.edge_count());

    let mut visited = vec![false; graph.id_bound()];
    let mut done = vec![false; graph.id_bound()];
    let mut stack = Vec::new();
    for component in graph.connected_components() {
        let Some(&root) = component.first() else {
            continue;
        };
        visited[root.index()] = true;
        stack.push(root);
        while let Some(v) = stack.pop() {
            // An edge is written from whichever endpoint is expanded first.
            for &n in graph.neighbors(v) {
                if done[n.index()] {
                    continue;
                }
                let _ = writeln!(out, "{} {}", position[v.index()], position[n.index()]);
                if !visited[n.index()] {
                    visited[n.index()] = true;
                    stack.push(n);
                }
            }
            done[v.index()] = true;
        }
    }
    out
}
