//! Chunking strategies.
//!
//! Document class selects a strategy: `faq → qa`, `regulation|resolution|
//! program → semantic`, else `fixed`.

pub mod fixed;
pub mod qa;
pub mod semantic;
pub mod traits;

pub use fixed::FixedChunker;
pub use qa::QaChunker;
pub use semantic::SemanticChunker;
pub use traits::Chunker;

use crate::config::ChunkingConfig;
use crate::core::{Chunk, DocumentType};
use crate::error::Result;

/// Selects and runs the strategy prescribed for `document_type`.
pub fn chunk_document(
    text: &str,
    document_name: &str,
    document_type: DocumentType,
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>> {
    let strategy = document_type.default_strategy();
    let chunker: Box<dyn Chunker> = match strategy {
        crate::core::ChunkStrategy::Qa => Box::new(QaChunker::new()),
        crate::core::ChunkStrategy::Semantic => Box::new(SemanticChunker::new()),
        crate::core::ChunkStrategy::Fixed => Box::new(FixedChunker::new()),
    };
    let chunks = chunker.chunk(text, document_name, document_type, config)?;
    chunker.validate(&chunks, config)?;
    Ok(chunks)
}
