//! The top-level query surface: binds C7–C11 into
//! `answer`/`compare`/`health`.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::{Error, ErrorKind, Result};
use crate::fusion::{self, HybridResult, Mode};
use crate::graph::KnowledgeGraph;
use crate::llm::{LlmClient, Message};
use crate::retrieval::{DenseRetriever, GraphRetriever, Reranker};
use crate::synth::{AnswerSynthesizer, Source};
use crate::vector::VectorIndex;

const MAX_HISTORY_TURNS: usize = 20;

/// One full response to a query (query endpoint).
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// Raw LLM-generated answer text.
    pub answer: String,
    /// `answer` plus the citation footer.
    pub formatted_answer: String,
    /// Cited sources.
    pub sources: Vec<Source>,
    /// Calibrated confidence in `[0, 1]`.
    pub confidence: f32,
    /// The retrieval mode actually used.
    pub method: Mode,
    /// Non-fatal issues surfaced alongside a successful response.
    pub warnings: Vec<String>,
    /// Suggested contacts when confidence is low or the answer abstains.
    pub fallback_contacts: Vec<String>,
    /// Wall-clock time spent answering, in milliseconds.
    pub processing_time_ms: u64,
}

/// `{status, llm_available, documents_loaded, index_size, graph_nodes}` (Health).
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// `"ok"` or `"degraded"`.
    pub status: &'static str,
    /// Whether the LLM collaborator answered a trivial probe.
    pub llm_available: bool,
    /// Number of distinct documents represented in the loaded index.
    pub documents_loaded: usize,
    /// Number of vectors in the loaded index.
    pub index_size: usize,
    /// Number of nodes in the loaded graph.
    pub graph_nodes: usize,
}

/// Binds the vector index, knowledge graph, embedder, LLM, and (optional)
/// reranker into the query surface. Read-only after construction; safe for
/// concurrent reads.
pub struct QueryEngine<'a> {
    index: &'a VectorIndex,
    graph: &'a KnowledgeGraph,
    embedder: &'a dyn Embedder,
    llm: &'a dyn LlmClient,
    reranker: Option<&'a dyn Reranker>,
    config: &'a Config,
    session_memory: Mutex<HashMap<String, Vec<Message>>>,
}

fn validate_question(question: &str) -> Result<()> {
    let len = question.chars().count();
    if !(3..=1000).contains(&len) {
        return Err(Error::InputInvalid(format!(
            "question must be 3..1000 characters, got {len}"
        )));
    }
    Ok(())
}

impl<'a> QueryEngine<'a> {
    /// Creates a query engine over already-loaded collaborators.
    #[must_use]
    pub fn new(
        index: &'a VectorIndex,
        graph: &'a KnowledgeGraph,
        embedder: &'a dyn Embedder,
        llm: &'a dyn LlmClient,
        reranker: Option<&'a dyn Reranker>,
        config: &'a Config,
    ) -> Self {
        Self {
            index,
            graph,
            embedder,
            llm,
            reranker,
            config,
            session_memory: Mutex::new(HashMap::new()),
        }
    }

    fn history_for(&self, session_id: Option<&str>) -> Vec<Message> {
        let Some(session_id) = session_id else {
            return Vec::new();
        };
        let memory = self.session_memory.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        memory.get(session_id).cloned().unwrap_or_default()
    }

    fn remember(&self, session_id: Option<&str>, question: &str, answer: &str) {
        let Some(session_id) = session_id else {
            return;
        };
        let mut memory = self.session_memory.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let turns = memory.entry(session_id.to_string()).or_default();
        turns.push(Message::user(question));
        turns.push(Message::assistant(answer));
        if turns.len() > MAX_HISTORY_TURNS {
            let excess = turns.len() - MAX_HISTORY_TURNS;
            turns.drain(0..excess);
        }
    }

    fn retrieve(&self, question: &str, mode: Mode, program_filter: Option<&str>) -> (HybridResult, Vec<String>) {
        let mut warnings = Vec::new();
        let weights = fusion::classify_query(question);

        let rag_k = if weights.graph > weights.rag { 3 } else { 5 };
        let rag_results = match mode {
            Mode::GraphOnly => Vec::new(),
            _ => {
                let retriever = DenseRetriever::new(self.index, self.embedder, self.reranker, &self.config.retrieval);
                match retriever.retrieve(question, rag_k, program_filter) {
                    Ok(results) => results,
                    Err(e) => {
                        warnings.push(format!("dense retrieval unavailable: {e}"));
                        Vec::new()
                    }
                }
            }
        };

        let (graph_results, path_description) = match mode {
            Mode::RagOnly => (Vec::new(), None),
            _ => {
                let retriever = GraphRetriever::new(self.graph);
                match retriever.retrieve(question, 3) {
                    Ok(pair) => pair,
                    Err(e) => {
                        warnings.push(format!("graph retrieval unavailable: {e}"));
                        (Vec::new(), None)
                    }
                }
            }
        };

        if matches!(mode, Mode::Hybrid) && rag_results.is_empty() && graph_results.is_empty() && !warnings.is_empty() {
            warnings.push("both retrievers failed; answer may be degraded".to_string());
        }

        (fusion::fuse(mode, rag_results, graph_results, path_description.as_deref()), warnings)
    }

    /// Answers `question` under `mode`, optionally filtered to `program_filter`
    /// and continuing the conversation identified by `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InputInvalid`] if `question` is out of bounds, or
    /// propagates a synthesis failure.
    pub fn answer(
        &self,
        question: &str,
        mode: Mode,
        program_filter: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<QueryResponse> {
        let started = std::time::Instant::now();
        validate_question(question)?;

        if self.index.is_empty() && self.graph.node_count() == 0 {
            let fallback = self.config.fallback_contacts.route(&question.to_lowercase());
            return Ok(QueryResponse {
                answer: "No hay documentos cargados todavia.".to_string(),
                formatted_answer: "No hay documentos cargados todavia.".to_string(),
                sources: Vec::new(),
                confidence: 0.0,
                method: mode,
                warnings: vec!["corpus is empty".to_string()],
                fallback_contacts: vec![fallback],
                processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }

        let (fused, mut retrieval_warnings) = self.retrieve(question, mode, program_filter);
        let history = self.history_for(session_id);

        let avg_retrieval = match mode {
            Mode::RagOnly => fused.rag_confidence,
            Mode::GraphOnly => fused.graph_confidence,
            Mode::Hybrid => {
                let weights = fusion::classify_query(question);
                weights.rag * fused.rag_confidence + weights.graph * fused.graph_confidence
            }
        };

        let rag_text = (!fused.rag_results.is_empty())
            .then(|| fused.rag_results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n"));
        let graph_text = (!fused.graph_results.is_empty())
            .then(|| fused.graph_results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join("\n\n"));
        let cross_ref = crate::verify::cross_reference(rag_text.as_deref(), graph_text.as_deref(), Some(self.embedder));

        let fallback_contact = self.config.fallback_contacts.route(&question.to_lowercase());

        let synthesizer = AnswerSynthesizer::new(self.llm);
        let synthesized = match synthesizer.synthesize(question, &fused, &history) {
            Ok(synthesized) => synthesized,
            Err(e) => {
                // Synthesis failures surface as an error string in the answer
                // field with confidence 0, not as a propagated error.
                let answer = format!("[Error] {e}");
                return Ok(QueryResponse {
                    answer: answer.clone(),
                    formatted_answer: answer,
                    sources: Vec::new(),
                    confidence: 0.0,
                    method: mode,
                    warnings: vec![e.to_string()],
                    fallback_contacts: vec![fallback_contact],
                    processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        let claims = crate::verify::split_claims(&synthesized.answer);
        let faithfulness = crate::verify::assess_faithfulness(
            &claims,
            &synthesized.answer,
            &fused.merged_context,
            self.embedder,
            self.llm,
            &self.config.verification,
        );

        let confidence = crate::verify::confidence(avg_retrieval, faithfulness.score, synthesized.sources.len(), cross_ref);
        let abstain_reason = crate::verify::should_abstain(question, confidence, &self.config.verification);

        let mut warnings = Vec::new();
        warnings.append(&mut retrieval_warnings);
        let fallback_contacts = if abstain_reason.is_some() {
            vec![fallback_contact]
        } else {
            Vec::new()
        };
        if let Some(reason) = abstain_reason {
            warnings.push(format!("abstaining: {reason}"));
        }

        self.remember(session_id, question, &synthesized.answer);

        Ok(QueryResponse {
            answer: synthesized.answer,
            formatted_answer: synthesized.formatted_answer,
            sources: synthesized.sources,
            confidence,
            method: mode,
            warnings,
            fallback_contacts,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Runs `answer` under all three modes for the same question.
    ///
    /// # Errors
    ///
    /// Propagates the first mode's fatal error (input validation only; a
    /// single retriever's failure is contained per mode).
    pub fn compare(&self, question: &str, program_filter: Option<&str>) -> Result<[QueryResponse; 3]> {
        Ok([
            self.answer(question, Mode::RagOnly, program_filter, None)?,
            self.answer(question, Mode::GraphOnly, program_filter, None)?,
            self.answer(question, Mode::Hybrid, program_filter, None)?,
        ])
    }

    /// Reports collaborator availability and corpus size (Health).
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        let llm_available = !self.llm.generate("ping", None).starts_with(crate::llm::ERROR_SENTINEL);
        let documents_loaded = self.index.document_names().len();
        HealthStatus {
            status: if llm_available { "ok" } else { "degraded" },
            llm_available,
            documents_loaded,
            index_size: self.index.len(),
            graph_nodes: self.graph.node_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChunkBuilder, ChunkStrategy, DocumentType};
    use crate::embedding::FallbackEmbedder;
    use crate::llm::EchoLlm;

    fn engine_fixtures() -> (VectorIndex, KnowledgeGraph, FallbackEmbedder, EchoLlm, Config) {
        let embedder = FallbackEmbedder::new(32);
        let mut index = VectorIndex::new();
        let chunk = ChunkBuilder::new(
            "la asistencia minima requerida es del 75 por ciento de las clases",
            "reglamento.pdf",
            DocumentType::Regulation,
            0,
            ChunkStrategy::Semantic,
        )
        .build();
        let embedding = embedder.embed_text(&chunk.text).unwrap();
        index.build(vec![chunk], vec![embedding]).unwrap();
        (index, KnowledgeGraph::new(), embedder, EchoLlm, Config::default())
    }

    #[test]
    fn rejects_too_short_question() {
        let (index, graph, embedder, llm, config) = engine_fixtures();
        let engine = QueryEngine::new(&index, &graph, &embedder, &llm, None, &config);
        let err = engine.answer("hi", Mode::Hybrid, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputInvalid);
    }

    #[test]
    fn answers_rag_only_query() {
        let (index, graph, embedder, llm, config) = engine_fixtures();
        let engine = QueryEngine::new(&index, &graph, &embedder, &llm, None, &config);
        let response = engine.answer("cual es la asistencia minima requerida", Mode::RagOnly, None, None).unwrap();
        assert!(!response.sources.is_empty());
        assert_eq!(response.method, Mode::RagOnly);
    }

    #[test]
    fn empty_corpus_returns_graceful_zero_confidence_answer() {
        let embedder = FallbackEmbedder::new(32);
        let index = VectorIndex::new();
        let graph = KnowledgeGraph::new();
        let llm = EchoLlm;
        let config = Config::default();
        let engine = QueryEngine::new(&index, &graph, &embedder, &llm, None, &config);
        let response = engine.answer("cual es el plazo de inscripcion", Mode::Hybrid, None, None).unwrap();
        assert!((response.confidence - 0.0).abs() < f32::EPSILON);
        assert!(!response.fallback_contacts.is_empty());
    }

    #[test]
    fn compare_runs_all_three_modes() {
        let (index, graph, embedder, llm, config) = engine_fixtures();
        let engine = QueryEngine::new(&index, &graph, &embedder, &llm, None, &config);
        let results = engine.compare("cual es la asistencia minima requerida", None).unwrap();
        assert_eq!(results[0].method, Mode::RagOnly);
        assert_eq!(results[1].method, Mode::GraphOnly);
        assert_eq!(results[2].method, Mode::Hybrid);
    }

    #[test]
    fn health_reports_index_and_graph_size() {
        let (index, graph, embedder, llm, config) = engine_fixtures();
        let engine = QueryEngine::new(&index, &graph, &embedder, &llm, None, &config);
        let health = engine.health();
        assert_eq!(health.index_size, 1);
        assert_eq!(health.graph_nodes, 0);
        assert!(health.llm_available);
    }

    #[test]
    fn session_history_is_remembered_across_calls() {
        let (index, graph, embedder, llm, config) = engine_fixtures();
        let engine = QueryEngine::new(&index, &graph, &embedder, &llm, None, &config);
        engine.answer("cual es la asistencia minima requerida", Mode::RagOnly, None, Some("s1")).unwrap();
        let history = engine.history_for(Some("s1"));
        assert_eq!(history.len(), 2);
    }
}
