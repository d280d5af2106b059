//! Structural-marker chunking (the "Semantic" strategy).

use regex::Regex;
use std::sync::LazyLock;

use crate::config::ChunkingConfig;
use crate::core::chunk::estimate_tokens;
use crate::core::{Chunk, ChunkBuilder, ChunkStrategy, DocumentType};
use crate::error::{ChunkingError, Result};

use super::fixed::FixedChunker;
use super::traits::Chunker;

fn article_marker_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*Art\.?\s*\d+").unwrap());
    &RE
}

fn uppercase_header_re() -> &'static Regex {
    // A line with >= 5 consecutive uppercase (accented-aware) letters/spaces
    // and no lowercase letters.
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^[\sA-ZÁÉÍÓÚÑ0-9.,:()/-]{5,}$").unwrap());
    &RE
}

fn numbered_heading_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[IVXLCDM]+|\d+)\.\s+\S").unwrap());
    &RE
}

/// A raw section produced by structural-marker splitting, before token-bound
/// enforcement.
struct Section {
    title: Option<String>,
    text: String,
}

/// Splits `text` at every match of `marker`, keeping the matched line as the
/// section title of the section it introduces. Text preceding the first
/// match (if non-blank) becomes an untitled leading section.
fn split_at_markers(text: &str, marker: &Regex) -> Vec<Section> {
    let matches: Vec<_> = marker.find_iter(text).collect();
    if matches.is_empty() {
        return Vec::new();
    }

    let mut sections = Vec::new();
    let leading = &text[..matches[0].start()];
    if !leading.trim().is_empty() {
        sections.push(Section {
            title: None,
            text: leading.trim().to_string(),
        });
    }

    for (i, m) in matches.iter().enumerate() {
        let start = m.start();
        let end = matches.get(i + 1).map_or(text.len(), |next| next.start());
        let body = text[start..end].trim().to_string();
        let title = body.lines().next().map(str::trim).map(ToString::to_string);
        sections.push(Section { title, text: body });
    }

    sections
}

/// Tries structural splitters in priority order; the first pattern that
/// yields more than one section wins.
fn best_split(text: &str) -> Vec<Section> {
    for marker in [article_marker_re(), uppercase_header_re(), numbered_heading_re()] {
        let sections = split_at_markers(text, marker);
        if sections.len() > 1 {
            return sections;
        }
    }
    vec![Section {
        title: None,
        text: text.to_string(),
    }]
}

/// Splits an oversize section with the fixed-window policy, prefixing each
/// resulting chunk with the parent section title ("oversize
/// semantic chunks are split by the fixed-size policy, carrying the parent
/// section title as a prefix").
fn split_oversize(
    section: &Section,
    document_name: &str,
    document_type: DocumentType,
    config: &ChunkingConfig,
    next_index: usize,
) -> Result<Vec<Chunk>> {
    let fixed = FixedChunker::new();
    let mut sub_chunks = fixed.chunk(&section.text, document_name, document_type, config)?;
    for (offset, chunk) in sub_chunks.iter_mut().enumerate() {
        chunk.chunk_index = next_index + offset;
        chunk.strategy = ChunkStrategy::Semantic;
        chunk.section_title.clone_from(&section.title);
        if let Some(title) = &section.title {
            chunk.text = format!("{title}\n{}", chunk.text);
        }
        chunk.chunk_id =
            crate::core::chunk::derive_chunk_id(document_name, chunk.chunk_index, ChunkStrategy::Semantic);
        chunk.token_count = estimate_tokens(&chunk.text);
    }
    Ok(sub_chunks)
}

/// Structural-marker chunker (article markers, uppercase headers, numbered
/// headings, in priority order).
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticChunker;

impl SemanticChunker {
    /// Creates a new semantic chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Chunker for SemanticChunker {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn chunk(
        &self,
        text: &str,
        document_name: &str,
        document_type: DocumentType,
        config: &ChunkingConfig,
    ) -> Result<Vec<Chunk>> {
        if text.trim().is_empty() {
            return Err(ChunkingError::EmptyInput.into());
        }

        let sections = best_split(text);
        let mut chunks = Vec::new();

        for section in &sections {
            let tokens = estimate_tokens(&section.text);
            if tokens > config.max_tokens {
                let oversize = split_oversize(section, document_name, document_type, config, chunks.len())?;
                chunks.extend(oversize);
            } else {
                let mut builder = ChunkBuilder::new(
                    section.text.clone(),
                    document_name,
                    document_type,
                    chunks.len(),
                    ChunkStrategy::Semantic,
                );
                if let Some(title) = &section.title {
                    builder = builder.section_title(title.clone());
                }
                chunks.push(builder.build());
            }
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig {
            min_tokens: 1,
            max_tokens: 30,
            overlap: 5,
        }
    }

    #[test]
    fn splits_on_article_markers() {
        let text = "Art. 1 Primer articulo con contenido.\nArt. 2 Segundo articulo con mas contenido.";
        let chunker = SemanticChunker::new();
        let chunks = chunker
            .chunk(text, "reg.pdf", DocumentType::Regulation, &config())
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].section_title.as_ref().unwrap().starts_with("Art"));
    }

    #[test]
    fn splits_on_uppercase_headers_when_no_articles() {
        let text = "REQUISITOS GENERALES\nContenido de la primera seccion.\nOTRA SECCION IMPORTANTE\nContenido de la segunda seccion.";
        let chunker = SemanticChunker::new();
        let chunks = chunker
            .chunk(text, "prog.pdf", DocumentType::Program, &config())
            .unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn falls_back_to_single_chunk_with_no_markers() {
        let text = "Solo texto corrido sin marcadores estructurales de ningun tipo.";
        let chunker = SemanticChunker::new();
        let chunks = chunker
            .chunk(text, "doc.pdf", DocumentType::Other, &config())
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].section_title.is_none());
    }

    #[test]
    fn oversize_section_is_split_with_title_prefix() {
        let mut body = String::from("Art. 1 ");
        body.push_str(&"palabra ".repeat(80));
        let chunker = SemanticChunker::new();
        let chunks = chunker
            .chunk(&body, "reg.pdf", DocumentType::Regulation, &config())
            .unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= config().max_tokens + 10);
            assert!(chunk.section_title.is_some());
        }
    }

    #[test]
    fn article_priority_over_uppercase_headers() {
        let text = "HEADER UNO\nArt. 1 contenido.\nArt. 2 mas contenido.";
        let chunker = SemanticChunker::new();
        let chunks = chunker
            .chunk(text, "reg.pdf", DocumentType::Regulation, &config())
            .unwrap();
        // Two Art. matches win over the single uppercase-header match.
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn is_idempotent() {
        let text = "Art. 1 uno.\nArt. 2 dos.\nArt. 3 tres.";
        let chunker = SemanticChunker::new();
        let a = chunker
            .chunk(text, "reg.pdf", DocumentType::Regulation, &config())
            .unwrap();
        let b = chunker
            .chunk(text, "reg.pdf", DocumentType::Regulation, &config())
            .unwrap();
        assert_eq!(a, b);
    }
}
