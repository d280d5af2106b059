//! The [`Chunker`] trait shared by all strategies.

use crate::config::ChunkingConfig;
use crate::core::{Chunk, DocumentType};
use crate::error::{ChunkingError, Result};

/// Splits cleaned document text into atomic retrieval units.
pub trait Chunker: Send + Sync {
    /// This strategy's name, matching [`crate::core::ChunkStrategy::as_str`].
    fn name(&self) -> &'static str;

    /// Splits `text` into chunks, tagging each with `document_name` and
    /// `document_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::EmptyInput`] if `text` is empty after trimming.
    fn chunk(
        &self,
        text: &str,
        document_name: &str,
        document_type: DocumentType,
        config: &ChunkingConfig,
    ) -> Result<Vec<Chunk>>;

    /// Validates that every produced chunk respects the configured token
    /// bounds. Strategies call this after splitting; a strategy that needs to
    /// re-split an oversize chunk does so before this check runs.
    fn validate(&self, chunks: &[Chunk], config: &ChunkingConfig) -> Result<()> {
        for chunk in chunks {
            if chunk.token_count < config.min_tokens || chunk.token_count > config.max_tokens {
                return Err(ChunkingError::TokenBoundsViolated {
                    index: chunk.chunk_index,
                    tokens: chunk.token_count,
                    min: config.min_tokens,
                    max: config.max_tokens,
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::{ChunkBuilder, ChunkStrategy};

    /// A trivial chunker that emits the whole input as a single chunk,
    /// useful for exercising the default [`Chunker::validate`] impl.
    pub struct MinimalChunker;

    impl Chunker for MinimalChunker {
        fn name(&self) -> &'static str {
            "minimal"
        }

        fn chunk(
            &self,
            text: &str,
            document_name: &str,
            document_type: DocumentType,
            _config: &ChunkingConfig,
        ) -> Result<Vec<Chunk>> {
            if text.trim().is_empty() {
                return Err(ChunkingError::EmptyInput.into());
            }
            Ok(vec![ChunkBuilder::new(
                text,
                document_name,
                document_type,
                0,
                ChunkStrategy::Fixed,
            )
            .build()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MinimalChunker;
    use super::*;

    #[test]
    fn validate_accepts_in_bounds_chunks() {
        let chunker = MinimalChunker;
        let config = ChunkingConfig {
            min_tokens: 1,
            max_tokens: 100,
            overlap: 0,
        };
        let chunks = chunker
            .chunk("a handful of words here", "doc", DocumentType::Other, &config)
            .unwrap();
        assert!(chunker.validate(&chunks, &config).is_ok());
    }

    #[test]
    fn validate_rejects_undersize_chunks() {
        let chunker = MinimalChunker;
        let config = ChunkingConfig {
            min_tokens: 50,
            max_tokens: 100,
            overlap: 0,
        };
        let chunks = chunker
            .chunk("short", "doc", DocumentType::Other, &config)
            .unwrap();
        assert!(chunker.validate(&chunks, &config).is_err());
    }

    #[test]
    fn empty_input_is_rejected() {
        let chunker = MinimalChunker;
        let config = ChunkingConfig::default();
        assert!(chunker.chunk("   ", "doc", DocumentType::Other, &config).is_err());
    }
}
