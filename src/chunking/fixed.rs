//! Sentence-aware fixed-window chunking (the "Fixed" strategy).

use regex::Regex;
use std::sync::LazyLock;

use crate::config::ChunkingConfig;
use crate::core::{Chunk, ChunkBuilder, ChunkStrategy, DocumentType, chunk::estimate_tokens};
use crate::error::{ChunkingError, Result};

use super::traits::Chunker;

/// Abbreviations that must not be treated as sentence terminators. Matched
/// case-insensitively against the token immediately preceding the period.
const PROTECTED_ABBREVIATIONS: &[&str] = &[
    "art", "inc", "sr", "sra", "dr", "dra", "prof", "ing", "lic", "univ", "dept", "no",
];

fn sentence_boundary_regex() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)(.+?[.!?])(?:\s+|\z)").unwrap());
    &RE
}

/// Splits `text` into sentences, protecting known abbreviations from being
/// mistaken for sentence terminators ("abbreviations ... are
/// protected before sentence splitting and restored after").
fn split_sentences(text: &str) -> Vec<String> {
    const PLACEHOLDER: &str = "\u{0}DOT\u{0}";

    let mut protected = text.to_string();
    for abbr in PROTECTED_ABBREVIATIONS {
        let pattern = format!(r"(?i)\b{abbr}\.");
        if let Ok(re) = Regex::new(&pattern) {
            protected = re
                .replace_all(&protected, |caps: &regex::Captures<'_>| {
                    caps[0].replace('.', PLACEHOLDER)
                })
                .into_owned();
        }
    }

    let mut sentences = Vec::new();
    let mut rest = protected.as_str();
    while !rest.trim().is_empty() {
        if let Some(caps) = sentence_boundary_regex().captures(rest) {
            let m = caps.get(1).unwrap();
            let sentence = &rest[..m.end()];
            sentences.push(sentence.trim().to_string());
            rest = &rest[m.end()..];
        } else {
            sentences.push(rest.trim().to_string());
            break;
        }
    }

    sentences
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.replace(PLACEHOLDER, "."))
        .collect()
}

/// Sentence-aware sliding-window chunker with character-based overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedChunker;

impl FixedChunker {
    /// Creates a new fixed chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Chunker for FixedChunker {
    fn name(&self) -> &'static str {
        "fixed"
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

        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Err(ChunkingError::EmptyInput.into());
        }

        let mut windows: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;

        for sentence in &sentences {
            let sentence_tokens = estimate_tokens(sentence);
            if !current.is_empty() && current_tokens + sentence_tokens > config.max_tokens {
                windows.push(std::mem::take(&mut current));
                current_tokens = 0;
                let overlap_text = take_overlap(windows.last().unwrap(), config.overlap);
                current.push_str(&overlap_text);
                current_tokens = estimate_tokens(&current);
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_tokens += sentence_tokens;
        }
        if !current.trim().is_empty() {
            windows.push(current);
        }

        let chunks = windows
            .into_iter()
            .enumerate()
            .map(|(index, window_text)| {
                ChunkBuilder::new(
                    window_text,
                    document_name,
                    document_type,
                    index,
                    ChunkStrategy::Fixed,
                )
                .build()
            })
            .collect();

        Ok(chunks)
    }
}

/// Returns the trailing `overlap` characters of `text`, snapped to the
/// nearest preceding char boundary.
fn take_overlap(text: &str, overlap: usize) -> String {
    if text.len() <= overlap {
        return text.to_string();
    }
    let start = text.len() - overlap;
    let boundary = (start..=text.len()).find(|&i| text.is_char_boundary(i)).unwrap_or(text.len());
    text[boundary..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig {
            min_tokens: 1,
            max_tokens: 20,
            overlap: 10,
        }
    }

    #[test]
    fn splits_on_sentence_boundaries() {
        let sentences = split_sentences("Uno. Dos. Tres.");
        assert_eq!(sentences, vec!["Uno.", "Dos.", "Tres."]);
    }

    #[test]
    fn protects_abbreviations() {
        let sentences = split_sentences("Ver Art. 5 del reglamento. Fin.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("Art. 5"));
    }

    #[test]
    fn protects_titles_like_dr() {
        let sentences = split_sentences("Consultar al Dr. Perez sobre el tema. Gracias.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("Dr. Perez"));
    }

    #[test]
    fn chunk_respects_max_tokens() {
        let chunker = FixedChunker::new();
        let text = "Una oracion larga con palabras de sobra para superar el limite establecido aqui. ".repeat(5);
        let chunks = chunker
            .chunk(&text, "doc.pdf", DocumentType::Other, &config())
            .unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= config().max_tokens + 5);
        }
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let chunker = FixedChunker::new();
        let text = "A. ".repeat(50);
        let chunks = chunker
            .chunk(&text, "doc.pdf", DocumentType::Other, &config())
            .unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn empty_text_is_an_error() {
        let chunker = FixedChunker::new();
        assert!(chunker
            .chunk("  ", "doc.pdf", DocumentType::Other, &config())
            .is_err());
    }

    #[test]
    fn is_idempotent() {
        let chunker = FixedChunker::new();
        let text = "Primera oracion aqui. Segunda oracion aqui tambien. Tercera mas.";
        let a = chunker
            .chunk(text, "doc.pdf", DocumentType::Other, &config())
            .unwrap();
        let b = chunker
            .chunk(text, "doc.pdf", DocumentType::Other, &config())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn take_overlap_respects_char_boundaries() {
        let text = "áéí";
        let overlap = take_overlap(text, 2);
        assert!(!overlap.is_empty());
    }
}
