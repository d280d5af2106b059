//! Filesystem persistence layout: per-document artifacts, the vector index,
//! and the knowledge graph.

pub mod fs;
pub mod graph_store;
pub mod index_store;

pub use fs::{ArtifactStore, DocumentMetadata, PipelineState};
