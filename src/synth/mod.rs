//! Answer Synthesizer: prompt assembly, LLM call, and
//! citation-footer attachment.

pub mod prompts;

use serde::{Deserialize, Serialize};

use crate::fusion::{HybridResult, Mode};
use crate::llm::{check_response, LlmClient, Message};
use crate::vector::SearchResult;

const HYBRID_BUDGET_PER_SIDE: usize = 2000;
const SINGLE_MODE_BUDGET: usize = 4000;

/// One cited source in a synthesized answer (query endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Owning document name, if this source came from a chunk.
    pub document_name: Option<String>,
    /// Page numbers, if known.
    pub page_numbers: Vec<u32>,
    /// Section title, if known.
    pub section_title: Option<String>,
    /// A short excerpt of the cited text.
    pub text_snippet: String,
    /// Retrieval score or graph confidence.
    pub score: f32,
    /// `"rag"` or `"graph"`.
    pub source_type: &'static str,
}

/// The synthesized answer plus its citation footer.
///
/// Confidence scoring and the low-confidence warning are computed by the
/// query layer once the answer text exists (faithfulness needs the answer
/// to split into claims), not here.
#[derive(Debug, Clone)]
pub struct SynthesizedAnswer {
    /// The raw LLM-generated answer text.
    pub answer: String,
    /// `answer` plus the numbered citation footer.
    pub formatted_answer: String,
    /// Cited sources, in citation order.
    pub sources: Vec<Source>,
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + "…"
}

fn collect_sources(rag_results: &[SearchResult], graph_results: &[crate::retrieval::GraphResult]) -> Vec<Source> {
    let mut sources = Vec::new();
    for result in rag_results {
        sources.push(Source {
            document_name: Some(result.chunk.document_name.clone()),
            page_numbers: result.chunk.page_numbers.clone(),
            section_title: result.chunk.section_title.clone(),
            text_snippet: snippet(&result.chunk.text, 200),
            score: result.score,
            source_type: "rag",
        });
    }
    for result in graph_results {
        sources.push(Source {
            document_name: None,
            page_numbers: Vec::new(),
            section_title: None,
            text_snippet: snippet(&result.text, 200),
            score: result.confidence,
            source_type: "graph",
        });
    }
    sources
}

fn citation_footer(sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let mut footer = String::from("\n\nFuentes:\n");
    for (i, source) in sources.iter().enumerate() {
        let label = source.document_name.as_deref().unwrap_or("grafo de conocimiento");
        if source.page_numbers.is_empty() {
            footer.push_str(&format!("[{}] {label}\n", i + 1));
        } else {
            let pages: Vec<String> = source.page_numbers.iter().map(ToString::to_string).collect();
            footer.push_str(&format!("[{}] {label}, p. {}\n", i + 1, pages.join(", ")));
        }
    }
    footer
}

/// Synthesizes an answer from a fused retrieval result.
pub struct AnswerSynthesizer<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> AnswerSynthesizer<'a> {
    /// Creates a synthesizer backed by `llm`.
    #[must_use]
    pub const fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// Synthesizes an answer for `question` given `fused` context and prior
    /// chat `history`.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM is unavailable.
    pub fn synthesize(
        &self,
        question: &str,
        fused: &HybridResult,
        history: &[Message],
    ) -> crate::error::Result<SynthesizedAnswer> {
        let rag_text = fused
            .rag_results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let graph_text = fused
            .graph_results
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = match fused.mode {
            Mode::Hybrid => prompts::build_hybrid_prompt(&rag_text, &graph_text, question, HYBRID_BUDGET_PER_SIDE),
            Mode::RagOnly => prompts::build_single_context_prompt(&rag_text, question, SINGLE_MODE_BUDGET),
            Mode::GraphOnly => prompts::build_single_context_prompt(&graph_text, question, SINGLE_MODE_BUDGET),
        };

        let raw = if history.is_empty() {
            self.llm.generate(&prompt, Some(prompts::SYSTEM_PROMPT))
        } else {
            let mut messages = history.to_vec();
            messages.push(Message::user(prompt));
            self.llm.generate_with_history(&messages, Some(prompts::SYSTEM_PROMPT))
        };
        let answer = check_response(raw)?;

        let sources = collect_sources(&fused.rag_results, &fused.graph_results);
        let formatted_answer = format!("{answer}{}", citation_footer(&sources));

        Ok(SynthesizedAnswer {
            answer,
            formatted_answer,
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChunkBuilder, ChunkStrategy, DocumentType};
    use crate::llm::EchoLlm;

    fn fused_with_rag() -> HybridResult {
        let chunk = ChunkBuilder::new("la asistencia minima es del 75%", "reglamento.pdf", DocumentType::Regulation, 0, ChunkStrategy::Semantic)
            .page_numbers(vec![3])
            .build();
        crate::fusion::fuse(
            Mode::RagOnly,
            vec![SearchResult { chunk, score: 0.9 }],
            Vec::new(),
            None,
        )
    }

    #[test]
    fn synthesize_attaches_citation_footer() {
        let llm = EchoLlm;
        let synthesizer = AnswerSynthesizer::new(&llm);
        let fused = fused_with_rag();
        let result = synthesizer.synthesize("cual es la asistencia minima", &fused, &[]).unwrap();
        assert!(result.formatted_answer.contains("Fuentes:"));
        assert!(result.formatted_answer.contains("reglamento.pdf"));
    }

    #[test]
    fn synthesize_preserves_raw_answer_text() {
        let llm = EchoLlm;
        let synthesizer = AnswerSynthesizer::new(&llm);
        let fused = fused_with_rag();
        let result = synthesizer.synthesize("pregunta", &fused, &[]).unwrap();
        assert!(result.answer.starts_with("echo:"));
    }
}
