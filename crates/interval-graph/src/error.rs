use crate::graph::VertexId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vertex {vertex} cannot be joined to itself")]
    SelfLoop { vertex: VertexId },
    #[error("edge {u} -- {v} already exists")]
    DuplicateEdge { u: VertexId, v: VertexId },
    #[error("graph has no vertex {vertex}")]
    UnknownVertex { vertex: VertexId },
    /// A broken invariant inside the recognition engine. Never caused by the input graph.
    #[error("internal invariant violated: {context}")]
    Internal { context: String },
}

impl Error {
    pub(crate) fn internal(context: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
