#![forbid(unsafe_code)]

//! Interval graph recognition with failure certificates.
//!
//! [`recognize`] decides whether an undirected graph is an interval graph. A backward LexBFS
//! sweep tests chordality; a chordal graph is then fed to an [`mpq_tree::MpqTree`] in forward
//! LexBFS order. The outcome is either an interval per vertex, a chordless cycle, or an
//! asteroidal triple with its three connecting paths.

pub mod asteroidal;
pub mod chordal;
pub mod error;
pub mod graph;
pub mod interval;
pub mod lexbfs;
pub mod mpq_tree;
pub mod options;

pub use error::{Error, Result};
pub use graph::{Graph, VertexId};
pub use interval::Interval;
pub use options::RecognizeOptions;

use chordal::Chordality;
use indexmap::IndexMap;
use mpq_tree::{Insertion, MpqTree};
use serde::Serialize;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of [`recognize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Recognition {
    /// An interval graph. `order` is a perfect elimination ordering; intervals are half-open and
    /// keyed by vertex id in ascending order.
    Chordal {
        order: Vec<VertexId>,
        intervals: IndexMap<VertexId, Interval>,
    },
    /// Not chordal: a chordless cycle of at least four vertices.
    NotChordal { cycle: Vec<VertexId> },
    /// Chordal but not an interval graph.
    NotInterval {
        asteroidal_triple: [VertexId; 3],
        paths: Vec<Vec<VertexId>>,
    },
}

impl Recognition {
    pub fn is_interval(&self) -> bool {
        matches!(self, Recognition::Chordal { .. })
    }
}

fn timing_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("INTERVAL_GRAPH_TIMING")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Default, Clone)]
struct Timings {
    total: Duration,
    chordality: Duration,
    tree: Duration,
    asteroidal: Duration,
}

pub fn recognize(graph: &Graph) -> Result<Recognition> {
    recognize_with_options(graph, RecognizeOptions::default())
}

pub fn recognize_with_options(graph: &Graph, options: RecognizeOptions) -> Result<Recognition> {
    let timing_enabled = timing_enabled();
    let total_start = timing_enabled.then(Instant::now);
    let mut timings = Timings::default();

    let chordality_start = timing_enabled.then(Instant::now);
    let chordality = chordal::check(graph)?;
    if let Some(s) = chordality_start {
        timings.chordality = s.elapsed();
    }

    let outcome = match chordality {
        Chordality::NotChordal { cycle } => Recognition::NotChordal { cycle },
        Chordality::Chordal { peo } => {
            let tree_start = timing_enabled.then(Instant::now);
            let built = build_tree(graph)?;
            if let Some(s) = tree_start {
                timings.tree = s.elapsed();
            }

            match built {
                Ok(tree) => {
                    let intervals = tree.materialize_intervals()?;
                    if options.verify_intervals {
                        if let Some((u, v)) = interval::find_mismatch(graph, &intervals) {
                            return Err(Error::internal(format!(
                                "intervals of {u} and {v} disagree with the graph"
                            )));
                        }
                    }
                    Recognition::Chordal {
                        order: peo,
                        intervals,
                    }
                }
                Err(failed) => {
                    debug!(vertex = %failed, "tree rejected vertex");
                    let asteroidal_start = timing_enabled.then(Instant::now);
                    let at = asteroidal::find(graph, failed, options.with_paths)?;
                    if let Some(s) = asteroidal_start {
                        timings.asteroidal = s.elapsed();
                    }
                    Recognition::NotInterval {
                        asteroidal_triple: at.triple,
                        paths: at.paths,
                    }
                }
            }
        }
    };

    if let Some(s) = total_start {
        timings.total = s.elapsed();
        eprintln!(
            "[interval-graph-timing] vertices={} edges={} total={:?} chordality={:?} tree={:?} asteroidal={:?}",
            graph.vertex_count(),
            graph.edge_count(),
            timings.total,
            timings.chordality,
            timings.tree,
            timings.asteroidal,
        );
    }
    Ok(outcome)
}

/// Inserts every vertex in forward LexBFS order. The inner `Err` carries the vertex the tree
/// rejected.
fn build_tree(graph: &Graph) -> Result<std::result::Result<MpqTree, VertexId>> {
    let ordering = lexbfs::lexbfs(graph, lexbfs::Direction::Forward);
    let mut tree = MpqTree::new(graph.id_bound());
    for &v in ordering.order() {
        if tree.insert(graph, v)? == Insertion::Rejected {
            return Ok(Err(v));
        }
    }
    Ok(Ok(tree))
}

/// Runs [`recognize_with_options`] and stores the intervals on the graph, readable through
/// [`Graph::interval`]. Intervals from an earlier run are cleared first.
pub fn recognize_in_place(graph: &mut Graph, options: &RecognizeOptions) -> Result<Recognition> {
    graph.clear_intervals();
    let outcome = recognize_with_options(graph, *options)?;
    if let Recognition::Chordal { intervals, .. } = &outcome {
        for (&v, &interval) in intervals {
            graph.set_interval(v, interval);
        }
    }
    Ok(outcome)
}
