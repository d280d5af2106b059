//! The [`Chunk`] data model.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Closed set of document classes, used to select a chunking strategy
/// and as part of the Metadata Tagger's registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// A formal program resolution.
    Resolution,
    /// A frequently-asked-questions document.
    Faq,
    /// An academic regulation.
    Regulation,
    /// A program description.
    Program,
    /// Anything not covered by the other classes.
    Other,
}

impl DocumentType {
    /// The chunking strategy selected for this document class.
    #[must_use]
    pub const fn default_strategy(self) -> ChunkStrategy {
        match self {
            Self::Faq => ChunkStrategy::Qa,
            Self::Regulation | Self::Resolution | Self::Program => ChunkStrategy::Semantic,
            Self::Other => ChunkStrategy::Fixed,
        }
    }
}

/// Closed set of chunking strategies .
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Sentence-aware sliding window.
    Fixed,
    /// Structural-marker splitting (articles, headers, numbered headings).
    Semantic,
    /// Question/answer pair scanning.
    Qa,
}

impl ChunkStrategy {
    /// The strategy's wire name, used in the deterministic `chunk_id` derivation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Semantic => "semantic",
            Self::Qa => "qa",
        }
    }
}

/// Per-chunk metadata merged from the registry, regex detection, and
/// (for QA chunks) the verbatim question .
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    /// Topics matched from the fixed keyword dictionary.
    pub topics: Vec<String>,
    /// Program codes associated with the owning document.
    pub program_codes: Vec<String>,
    /// Program codes or names mentioned within the chunk's own text.
    pub mentioned_programs: Vec<String>,
    /// Email addresses found in the chunk's text.
    pub contact_emails: Vec<String>,
    /// Verbatim question text, present only for QA-strategy chunks.
    pub question: Option<String>,
}

/// An immutable, post-ingest atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable unique id, deterministic given `(document_name, chunk_index, strategy)`.
    pub chunk_id: String,
    /// The chunk's text.
    pub text: String,
    /// Name of the owning document.
    pub document_name: String,
    /// The owning document's class.
    pub document_type: DocumentType,
    /// Section title, if the strategy that produced this chunk identified one.
    pub section_title: Option<String>,
    /// Position of this chunk within its document, in emission order.
    pub chunk_index: usize,
    /// The strategy that produced this chunk.
    pub strategy: ChunkStrategy,
    /// Estimated token count (`words * 1.3`).
    pub token_count: usize,
    /// Page numbers this chunk's text spans, if known, in ascending order.
    pub page_numbers: Vec<u32>,
    /// Merged metadata.
    pub metadata: ChunkMetadata,
}

/// Computes the estimated token count for a text span (`words * 1.3`).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f64) * 1.3).round() as usize
}

/// Derives the stable `chunk_id` for a `(document_name, chunk_index, strategy)`
/// triple (deterministic so re-ingesting unchanged input reproduces
/// identical ids).
#[must_use]
pub fn derive_chunk_id(document_name: &str, chunk_index: usize, strategy: ChunkStrategy) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_name.as_bytes());
    hasher.update([0x1f]);
    hasher.update(chunk_index.to_le_bytes());
    hasher.update([0x1f]);
    hasher.update(strategy.as_str().as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Builder for [`Chunk`], mirroring the fluent-builder idiom used for
/// per-document config objects elsewhere in the crate.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    text: String,
    document_name: String,
    document_type: DocumentType,
    section_title: Option<String>,
    chunk_index: usize,
    strategy: ChunkStrategy,
    page_numbers: Vec<u32>,
    metadata: ChunkMetadata,
}

impl ChunkBuilder {
    /// Starts building a chunk with the required fields.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        document_name: impl Into<String>,
        document_type: DocumentType,
        chunk_index: usize,
        strategy: ChunkStrategy,
    ) -> Self {
        Self {
            text: text.into(),
            document_name: document_name.into(),
            document_type,
            section_title: None,
            chunk_index,
            strategy,
            page_numbers: Vec::new(),
            metadata: ChunkMetadata::default(),
        }
    }

    /// Sets the section title.
    #[must_use]
    pub fn section_title(mut self, title: impl Into<String>) -> Self {
        self.section_title = Some(title.into());
        self
    }

    /// Sets the page numbers this chunk spans.
    #[must_use]
    pub fn page_numbers(mut self, pages: Vec<u32>) -> Self {
        self.page_numbers = pages;
        self
    }

    /// Sets the chunk metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Finalizes the chunk, deriving `chunk_id` and `token_count`.
    #[must_use]
    pub fn build(self) -> Chunk {
        let chunk_id = derive_chunk_id(&self.document_name, self.chunk_index, self.strategy);
        let token_count = estimate_tokens(&self.text);
        Chunk {
            chunk_id,
            text: self.text,
            document_name: self.document_name,
            document_type: self.document_type,
            section_title: self.section_title,
            chunk_index: self.chunk_index,
            strategy: self.strategy,
            token_count,
            page_numbers: self.page_numbers,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        let a = derive_chunk_id("doc.pdf", 3, ChunkStrategy::Semantic);
        let b = derive_chunk_id("doc.pdf", 3, ChunkStrategy::Semantic);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn chunk_id_differs_by_index() {
        let a = derive_chunk_id("doc.pdf", 0, ChunkStrategy::Fixed);
        let b = derive_chunk_id("doc.pdf", 1, ChunkStrategy::Fixed);
        assert_ne!(a, b);
    }

    #[test]
    fn chunk_id_differs_by_strategy() {
        let a = derive_chunk_id("doc.pdf", 0, ChunkStrategy::Fixed);
        let b = derive_chunk_id("doc.pdf", 0, ChunkStrategy::Semantic);
        assert_ne!(a, b);
    }

    #[test]
    fn estimate_tokens_applies_ratio() {
        assert_eq!(estimate_tokens("one two three four five"), 7);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn document_type_default_strategy() {
        assert_eq!(DocumentType::Faq.default_strategy(), ChunkStrategy::Qa);
        assert_eq!(
            DocumentType::Regulation.default_strategy(),
            ChunkStrategy::Semantic
        );
        assert_eq!(
            DocumentType::Resolution.default_strategy(),
            ChunkStrategy::Semantic
        );
        assert_eq!(
            DocumentType::Program.default_strategy(),
            ChunkStrategy::Semantic
        );
        assert_eq!(DocumentType::Other.default_strategy(), ChunkStrategy::Fixed);
    }

    #[test]
    fn builder_produces_consistent_chunk() {
        let chunk = ChunkBuilder::new(
            "hello world this is text",
            "doc.pdf",
            DocumentType::Other,
            0,
            ChunkStrategy::Fixed,
        )
        .section_title("Intro")
        .page_numbers(vec![1, 2])
        .build();

        assert_eq!(chunk.document_name, "doc.pdf");
        assert_eq!(chunk.section_title.as_deref(), Some("Intro"));
        assert_eq!(chunk.page_numbers, vec![1, 2]);
        assert_eq!(
            chunk.chunk_id,
            derive_chunk_id("doc.pdf", 0, ChunkStrategy::Fixed)
        );
    }

    #[test]
    fn chunk_serde_roundtrip_ignores_unknown_fields() {
        let chunk = ChunkBuilder::new("text", "doc", DocumentType::Faq, 0, ChunkStrategy::Qa).build();
        let mut value = serde_json::to_value(&chunk).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("unknown_field".into(), serde_json::json!("ignored"));
        let restored: Chunk = serde_json::from_value(value).unwrap();
        assert_eq!(restored, chunk);
    }
}
