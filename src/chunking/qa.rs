//! Question/answer pair chunking for FAQ documents (the "QA-pair" strategy).

use crate::config::ChunkingConfig;
use crate::core::{Chunk, ChunkBuilder, ChunkMetadata, ChunkStrategy, DocumentType};
use crate::error::{ChunkingError, Result};

use super::semantic::SemanticChunker;
use super::traits::Chunker;

/// A line counts as a question if it contains `?` and begins (after
/// whitespace) with a bullet, dash, digit, or inverted question mark.
fn is_question_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if !line.contains('?') {
        return false;
    }
    trimmed.starts_with(['-', '*', '•', '¿'])
        || trimmed.chars().next().is_some_and(char::is_numeric)
}

fn strip_leading_marker(line: &str) -> &str {
    line.trim_start()
        .trim_start_matches(['-', '*', '•'])
        .trim_start_matches(|c: char| c.is_numeric() || c == '.' || c == ')')
        .trim()
}

struct QaPair {
    section: Option<String>,
    question: String,
    answer: String,
}

fn scan_qa_pairs(text: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut current_section: Option<String> = None;
    let mut current: Option<(Option<String>, String, Vec<String>)> = None;

    let flush = |current: &mut Option<(Option<String>, String, Vec<String>)>, pairs: &mut Vec<QaPair>| {
        if let Some((section, question, answer_lines)) = current.take() {
            let answer = answer_lines.join(" ").trim().to_string();
            if !answer.is_empty() {
                pairs.push(QaPair {
                    section,
                    question,
                    answer,
                });
            }
        }
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_question_line(trimmed) {
            flush(&mut current, &mut pairs);
            current = Some((
                current_section.clone(),
                strip_leading_marker(trimmed).to_string(),
                Vec::new(),
            ));
        } else if current.is_some() {
            // A non-question, non-blank line while accumulating an answer:
            // if it looks like a new header (short, no terminal punctuation
            // continuing a sentence), treat it as the next section instead
            // of appending to the answer. We use a simple heuristic: lines
            // ending without sentence punctuation and under 60 chars that
            // immediately follow a completed answer line are headers; to
            // keep this deterministic and simple we only treat a line as a
            // header when it is in uppercase.
            if trimmed.len() < 60 && trimmed.chars().all(|c| !c.is_lowercase()) {
                flush(&mut current, &mut pairs);
                current_section = Some(trimmed.to_string());
            } else if let Some((_, _, answer_lines)) = current.as_mut() {
                answer_lines.push(trimmed.to_string());
            }
        } else {
            current_section = Some(trimmed.to_string());
        }
    }
    flush(&mut current, &mut pairs);
    pairs
}

/// Scans for `(section, question, answer)` triples; falls back to semantic
/// chunking when none are found.
#[derive(Debug, Clone, Copy, Default)]
pub struct QaChunker;

impl QaChunker {
    /// Creates a new QA-pair chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Chunker for QaChunker {
    fn name(&self) -> &'static str {
        "qa"
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

        let pairs = scan_qa_pairs(text);
        if pairs.is_empty() {
            return SemanticChunker::new().chunk(text, document_name, document_type, config);
        }

        let chunks = pairs
            .into_iter()
            .enumerate()
            .map(|(index, pair)| {
                let section = pair.section.clone().unwrap_or_default();
                let chunk_text =
                    format!("[Section: {section}]\nPregunta: {}\nRespuesta: {}", pair.question, pair.answer);
                let mut metadata = ChunkMetadata::default();
                metadata.question = Some(pair.question);
                let mut builder = ChunkBuilder::new(
                    chunk_text,
                    document_name,
                    document_type,
                    index,
                    ChunkStrategy::Qa,
                )
                .metadata(metadata);
                if let Some(title) = pair.section {
                    builder = builder.section_title(title);
                }
                builder.build()
            })
            .collect();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig {
            min_tokens: 1,
            max_tokens: 200,
            overlap: 0,
        }
    }

    #[test]
    fn extracts_simple_qa_pair() {
        let text = "INSCRIPCIONES\n- ¿Cuándo me inscribo?\nTe inscribís durante marzo.\nContinua la respuesta.";
        let chunker = QaChunker::new();
        let chunks = chunker
            .chunk(text, "faq.pdf", DocumentType::Faq, &config())
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.question.as_deref(), Some("¿Cuándo me inscribo?"));
        assert!(chunks[0].text.contains("Te inscribís durante marzo."));
        assert_eq!(chunks[0].section_title.as_deref(), Some("INSCRIPCIONES"));
    }

    #[test]
    fn extracts_multiple_qa_pairs() {
        let text = "- ¿Una?\nRespuesta uno.\n- ¿Dos?\nRespuesta dos.";
        let chunker = QaChunker::new();
        let chunks = chunker
            .chunk(text, "faq.pdf", DocumentType::Faq, &config())
            .unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn falls_back_to_semantic_without_questions() {
        let text = "Art. 1 sin preguntas.\nArt. 2 tampoco.";
        let chunker = QaChunker::new();
        let chunks = chunker
            .chunk(text, "faq.pdf", DocumentType::Faq, &config())
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].metadata.question.is_none());
    }

    #[test]
    fn is_question_line_recognizes_inverted_mark() {
        assert!(is_question_line("¿Qué es esto?"));
        assert!(is_question_line("- ¿Cuándo?"));
        assert!(!is_question_line("Esto no es una pregunta."));
    }

    #[test]
    fn empty_input_errors() {
        let chunker = QaChunker::new();
        assert!(chunker.chunk("", "faq.pdf", DocumentType::Faq, &config()).is_err());
    }
}
