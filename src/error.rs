//! Error hierarchy.
//!
//! A top-level [`Error`] that composes per-subsystem sub-errors, plus an
//! [`ErrorKind`] that collapses the whole tree onto the five kinds the query
//! surface is contractually allowed to report.

use serde::Serialize;

/// Top-level crate error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request failed basic validation (length bounds, unknown mode, ...).
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// A referenced document or entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The corpus has no chunks or the graph has no nodes.
    #[error("corpus is empty")]
    CorpusEmpty,

    /// A chunking-stage failure.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    /// A graph-construction or graph-query failure.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A retrieval-stage failure.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// A synthesis-stage failure.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// A persistence failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An ingest-orchestrator failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// An external collaborator (LLM, embedder, reranker) is unavailable.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl Error {
    /// Collapses the full error tree onto the five kinds the query surface
    /// is contractually allowed to report.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InputInvalid(_) => ErrorKind::InputInvalid,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::CorpusEmpty => ErrorKind::CorpusEmpty,
            Self::Llm(_) => ErrorKind::ExternalUnavailable,
            Self::Chunking(_) | Self::Graph(_) | Self::Storage(_) | Self::Ingest(_) => {
                ErrorKind::Internal
            }
            Self::Retrieval(e) => e.kind(),
            Self::Synthesis(e) => e.kind(),
        }
    }
}

/// The five error kinds the external query/ingest surfaces may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request: length bounds, unknown mode.
    InputInvalid,
    /// Missing document or unknown entity id.
    NotFound,
    /// LLM, embedding, or reranker unreachable or timed out.
    ExternalUnavailable,
    /// No chunks or no graph nodes.
    CorpusEmpty,
    /// Programmer error (precondition violation during index build).
    Internal,
}

/// Errors raised while splitting a document into chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    /// An unrecognized chunking strategy name was requested.
    #[error("unknown chunking strategy: {name}")]
    UnknownStrategy {
        /// The strategy name that was not recognized.
        name: String,
    },

    /// A produced chunk violated the configured token bounds.
    #[error("chunk {index} has {tokens} tokens, outside [{min}, {max}]")]
    TokenBoundsViolated {
        /// Index of the offending chunk within the document.
        index: usize,
        /// The chunk's estimated token count.
        tokens: usize,
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The input text was empty.
    #[error("cannot chunk empty text")]
    EmptyInput,
}

/// Errors raised while building or querying the knowledge graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A relation referenced an entity kind that doesn't exist in the schema.
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// A relation referenced a relation kind that doesn't exist in the schema.
    #[error("unknown relation kind: {0}")]
    UnknownRelationKind(String),

    /// The requested node is not present in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Community detection failed (non-fatal to the caller; callers should log and continue).
    #[error("community detection failed: {0}")]
    CommunityDetection(String),
}

/// Errors raised during dense or graph retrieval.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The vector index has not been built or loaded.
    #[error("vector index is not built")]
    IndexNotBuilt,

    /// `build` was called with mismatched chunk/embedding counts.
    #[error("chunk count ({chunks}) does not match embedding count ({embeddings})")]
    SizeMismatch {
        /// Number of chunks passed to `build`.
        chunks: usize,
        /// Number of embeddings passed to `build`.
        embeddings: usize,
    },

    /// An embedding contained a non-finite component.
    #[error("embedding contains a non-finite value")]
    NonFiniteEmbedding,

    /// Both retrievers failed in hybrid mode.
    #[error("both dense and graph retrieval failed: {dense}; {graph}")]
    BothFailed {
        /// Description of the dense-retrieval failure.
        dense: String,
        /// Description of the graph-retrieval failure.
        graph: String,
    },
}

impl RetrievalError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexNotBuilt | Self::SizeMismatch { .. } | Self::NonFiniteEmbedding => {
                ErrorKind::Internal
            }
            Self::BothFailed { .. } => ErrorKind::ExternalUnavailable,
        }
    }
}

/// Errors raised while assembling a prompt or calling the LLM for synthesis.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The LLM collaborator returned its sentinel error prefix.
    #[error("llm generation failed: {0}")]
    GenerationFailed(String),

    /// No context was available to synthesize an answer from.
    #[error("no context available for synthesis")]
    NoContext,
}

impl SynthesisError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::GenerationFailed(_) => ErrorKind::ExternalUnavailable,
            Self::NoContext => ErrorKind::CorpusEmpty,
        }
    }
}

/// Errors raised by the filesystem-backed persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Binary (de)serialization failure (vector index / graph sidecars).
    #[error("binary encoding error: {0}")]
    Binary(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for StorageError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        Self::Binary(e.to_string())
    }
}

/// Errors raised by the ingest orchestrator's per-document state machine.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The configured raw/PDF input directory does not exist.
    #[error("input path not found: {0}")]
    InputMissing(String),

    /// A single document's pipeline stage failed; the run continues with other files.
    #[error("document {document} failed at stage {stage}: {reason}")]
    StageFailed {
        /// The document's file stem.
        document: String,
        /// The pipeline stage that failed (`extracting`, `cleaning`, `tagging`, `chunking`).
        stage: &'static str,
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Errors raised by LLM or embedding collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The collaborator is unreachable or timed out.
    #[error("external collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator returned a response that could not be parsed.
    #[error("malformed collaborator response: {0}")]
    MalformedResponse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
