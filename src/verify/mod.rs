//! Anti-Hallucination Engine: claim splitting, a
//! three-backend faithfulness cascade, cross-reference, confidence scoring,
//! and abstention.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::VerificationConfig;
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::Result;
use crate::llm::{check_response, LlmClient};

fn claim_boundary_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());
    &RE
}

/// Splits `answer` into claims on `[.!?]` followed by whitespace, dropping
/// spans under 10 characters.
#[must_use]
pub fn split_claims(answer: &str) -> Vec<String> {
    claim_boundary_re()
        .split(answer)
        .map(str::trim)
        .filter(|s| s.chars().count() >= 10)
        .map(ToString::to_string)
        .collect()
}

/// Outcome of a faithfulness check: a `[0,1]` score and the pass/fail
/// verdict at the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Faithfulness {
    /// Fraction of claims judged supported.
    pub score: f32,
    /// `score >= threshold`.
    pub is_faithful: bool,
}

fn sentence_split(text: &str) -> Vec<&str> {
    claim_boundary_re().split(text).map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Embedding-backed faithfulness: a claim is supported iff its max cosine
/// similarity to any context sentence is `>= embedding_threshold` (backend 1).
///
/// # Errors
///
/// Returns an error if the embedder is unavailable.
pub fn faithfulness_embedding(
    claims: &[String],
    context: &str,
    embedder: &dyn Embedder,
    embedding_threshold: f32,
    pass_threshold: f32,
) -> Result<Faithfulness> {
    if claims.is_empty() {
        return Ok(Faithfulness { score: 1.0, is_faithful: true });
    }
    let context_sentences = sentence_split(context);
    let context_embeddings: Result<Vec<_>> = context_sentences.iter().map(|s| embedder.embed_text(s)).collect();
    let context_embeddings = context_embeddings?;

    let mut supported = 0;
    for claim in claims {
        let claim_embedding = embedder.embed_text(claim)?;
        let max_sim = context_embeddings
            .iter()
            .map(|ctx| cosine_similarity(&claim_embedding, ctx))
            .fold(f32::MIN, f32::max);
        if max_sim >= embedding_threshold {
            supported += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let score = supported as f32 / claims.len() as f32;
    Ok(Faithfulness { score, is_faithful: score >= pass_threshold })
}

fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// LLM-judge faithfulness: prompts for `{claims:[{claim,supported,evidence}],
/// overall_faithfulness}` and parses the first JSON object in the response
/// (backend 2).
///
/// # Errors
///
/// Returns an error if the LLM is unavailable or its response cannot be
/// parsed as the expected JSON shape.
pub fn faithfulness_llm(claims: &[String], context: &str, llm: &dyn LlmClient, pass_threshold: f32) -> Result<Faithfulness> {
    if claims.is_empty() {
        return Ok(Faithfulness { score: 1.0, is_faithful: true });
    }
    let prompt = format!(
        "Contexto:\n{context}\n\nAfirmaciones:\n{}\n\nPara cada afirmacion indica si esta respaldada por el contexto. \
         Responde unicamente con JSON: {{\"claims\": [{{\"claim\": str, \"supported\": bool, \"evidence\": str}}], \
         \"overall_faithfulness\": float entre 0 y 1}}.",
        claims.iter().enumerate().map(|(i, c)| format!("{}. {c}", i + 1)).collect::<Vec<_>>().join("\n")
    );
    let raw = check_response(llm.generate(&prompt, None))?;
    let json = first_json_object(&raw).ok_or_else(|| {
        crate::error::Error::from(crate::error::LlmError::MalformedResponse(
            "no JSON object in faithfulness judge response".into(),
        ))
    })?;
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        crate::error::LlmError::MalformedResponse(format!("invalid faithfulness JSON: {e}"))
    })?;
    let score = value
        .get("overall_faithfulness")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| crate::error::LlmError::MalformedResponse("missing overall_faithfulness".into()))?;
    #[allow(clippy::cast_possible_truncation)]
    let score = score as f32;
    Ok(Faithfulness { score, is_faithful: score >= pass_threshold })
}

const NUMERIC_TOKEN_PATTERNS: &[&str] = &[r"\d+\s*(bimestres?|meses?|a[ñn]os?)", r"\d+\s*(%|por ciento)", r"(?i)art\.?\s*\d+"];
const KNOWN_CODES: &[&str] = &["MIA", "MIAE", "CEIA", "CESE", "TTFA", "TTFB", "GDP", "GTI"];

fn numeric_token_res() -> &'static [Regex] {
    static RES: LazyLock<Vec<Regex>> = LazyLock::new(|| NUMERIC_TOKEN_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect());
    &RES
}

/// Heuristic faithfulness: finds domain-salient tokens (numeric deadlines,
/// program codes, article references) in the answer and checks they also
/// appear in the context. Defaults to `0.7` when no such tokens occur (backend 3).
#[must_use]
pub fn faithfulness_heuristic(answer: &str, context: &str, pass_threshold: f32) -> Faithfulness {
    let mut found_in_answer: Vec<String> = Vec::new();
    for re in numeric_token_res() {
        found_in_answer.extend(re.find_iter(answer).map(|m| m.as_str().to_lowercase()));
    }
    let answer_upper = answer.to_uppercase();
    for code in KNOWN_CODES {
        if answer_upper.contains(code) {
            found_in_answer.push(code.to_lowercase());
        }
    }

    if found_in_answer.is_empty() {
        return Faithfulness { score: 0.7, is_faithful: 0.7 >= pass_threshold };
    }

    let context_lower = context.to_lowercase();
    let matched = found_in_answer.iter().filter(|token| context_lower.contains(token.as_str())).count();
    #[allow(clippy::cast_precision_loss)]
    let score = matched as f32 / found_in_answer.len() as f32;
    Faithfulness { score, is_faithful: score >= pass_threshold }
}

/// Selects a faithfulness backend by availability: the embedding backend
/// first, the LLM judge if embeddings are unavailable, and the heuristic
/// token-overlap check as the last resort.
#[must_use]
pub fn assess_faithfulness(
    claims: &[String],
    answer: &str,
    context: &str,
    embedder: &dyn Embedder,
    llm: &dyn LlmClient,
    config: &VerificationConfig,
) -> Faithfulness {
    if let Ok(result) = faithfulness_embedding(
        claims,
        context,
        embedder,
        config.faithfulness_embedding_threshold,
        config.faithfulness_pass_threshold,
    ) {
        return result;
    }
    if let Ok(result) = faithfulness_llm(claims, context, llm, config.faithfulness_pass_threshold) {
        return result;
    }
    faithfulness_heuristic(answer, context, config.faithfulness_pass_threshold)
}

fn jaccard(a: &str, b: &str) -> f32 {
    let set_a: std::collections::HashSet<_> = a.to_lowercase().split_whitespace().map(ToString::to_string).collect();
    let set_b: std::collections::HashSet<_> = b.to_lowercase().split_whitespace().map(ToString::to_string).collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    #[allow(clippy::cast_precision_loss)]
    {
        if union == 0 { 0.0 } else { intersection as f32 / union as f32 }
    }
}

/// Similarity between the RAG and graph contexts, embedding cosine when an
/// embedder is available, Jaccard of tokens otherwise. Returns `0.5`
/// ("no evidence either way") when only one context is present.
#[must_use]
pub fn cross_reference(rag_context: Option<&str>, graph_context: Option<&str>, embedder: Option<&dyn Embedder>) -> f32 {
    match (rag_context, graph_context) {
        (Some(rag), Some(graph)) => embedder.map_or_else(
            || jaccard(rag, graph),
            |e| match (e.embed_text(rag), e.embed_text(graph)) {
                (Ok(a), Ok(b)) => cosine_similarity(&a, &b),
                _ => jaccard(rag, graph),
            },
        ),
        _ => 0.5,
    }
}

/// Weighted confidence aggregation:
/// `0.30*avg_retrieval + 0.30*faithfulness + 0.15*min(sources/3,1) + 0.25*cross_ref`.
#[must_use]
pub fn confidence(avg_retrieval: f32, faithfulness: f32, source_count: usize, cross_ref: f32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let source_term = (source_count as f32 / 3.0).min(1.0);
    (0.30 * avg_retrieval + 0.30 * faithfulness + 0.15 * source_term + 0.25 * cross_ref).clamp(0.0, 1.0)
}

/// Decides whether to abstain, and why.
#[must_use]
pub fn should_abstain(query: &str, confidence: f32, config: &VerificationConfig) -> Option<&'static str> {
    let lower = query.to_lowercase();
    if config.out_of_scope_markers.iter().any(|marker| lower.contains(marker.as_str())) {
        return Some("out-of-scope");
    }
    if confidence < config.abstention_threshold {
        return Some("insufficient information");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::FallbackEmbedder;

    #[test]
    fn split_claims_drops_short_spans() {
        let claims = split_claims("La asistencia minima es del 75%. Si. Es un requisito obligatorio.");
        assert_eq!(claims.len(), 2);
    }

    #[test]
    fn embedding_faithfulness_supports_matching_claim() {
        let embedder = FallbackEmbedder::new(64);
        let claims = vec!["la asistencia minima es del 75 por ciento".to_string()];
        let context = "segun el reglamento, la asistencia minima es del 75 por ciento de las clases.";
        let result = faithfulness_embedding(&claims, context, &embedder, 0.3, 0.7).unwrap();
        assert!(result.score > 0.0);
    }

    #[test]
    fn heuristic_defaults_when_no_salient_tokens() {
        let result = faithfulness_heuristic("una respuesta generica sin datos especificos", "contexto", 0.7);
        assert!((result.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn heuristic_scores_by_token_overlap() {
        let result = faithfulness_heuristic("el plazo es de 4 bimestres segun Art. 5", "el plazo es de 4 bimestres", 0.7);
        assert!(result.score < 1.0);
        assert!(result.score > 0.0);
    }

    #[test]
    fn cross_reference_returns_half_when_one_side_missing() {
        assert_eq!(cross_reference(Some("texto"), None, None), 0.5);
    }

    #[test]
    fn cross_reference_uses_jaccard_without_embedder() {
        let score = cross_reference(Some("la mia requiere ceia"), Some("la mia requiere ceia"), None);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn confidence_is_clamped_and_weighted() {
        let c = confidence(1.0, 1.0, 10, 1.0);
        assert!((c - 1.0).abs() < 1e-6);
        let zero = confidence(0.0, 0.0, 0, 0.0);
        assert!((zero - 0.0).abs() < 1e-6);
    }

    #[test]
    fn abstains_on_out_of_scope_marker() {
        let config = VerificationConfig::default();
        let reason = should_abstain("cuanto cuesta la inscripcion", 0.9, &config);
        assert_eq!(reason, Some("out-of-scope"));
    }

    #[test]
    fn abstains_on_low_confidence() {
        let config = VerificationConfig::default();
        let reason = should_abstain("requisitos de la mia", 0.1, &config);
        assert_eq!(reason, Some("insufficient information"));
    }

    #[test]
    fn does_not_abstain_when_confident_and_in_scope() {
        let config = VerificationConfig::default();
        assert!(should_abstain("requisitos de la mia", 0.9, &config).is_none());
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn dimensions(&self) -> usize {
            64
        }

        fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Err(crate::error::LlmError::Unavailable("offline".into()).into())
        }
    }

    struct FailingLlm;

    impl LlmClient for FailingLlm {
        fn generate(&self, _prompt: &str, _system_prompt: Option<&str>) -> String {
            format!("{} timed out", crate::llm::ERROR_SENTINEL)
        }

        fn generate_with_history(&self, _messages: &[crate::llm::Message], _system_prompt: Option<&str>) -> String {
            format!("{} timed out", crate::llm::ERROR_SENTINEL)
        }
    }

    #[test]
    fn assess_faithfulness_prefers_embedding_backend_when_available() {
        let embedder = FallbackEmbedder::new(64);
        let llm = crate::llm::EchoLlm;
        let config = VerificationConfig::default();
        let claims = vec!["la asistencia minima es del 75 por ciento".to_string()];
        let context = "segun el reglamento, la asistencia minima es del 75 por ciento de las clases.";
        let result = assess_faithfulness(&claims, "la asistencia minima es del 75 por ciento", context, &embedder, &llm, &config);
        assert!(result.score > 0.0);
    }

    #[test]
    fn assess_faithfulness_falls_back_past_a_non_json_llm_response() {
        // EchoLlm never produces the JSON shape `faithfulness_llm` expects, so
        // the cascade falls all the way through to the heuristic backend.
        let embedder = FailingEmbedder;
        let llm = crate::llm::EchoLlm;
        let config = VerificationConfig::default();
        let claims = vec!["la asistencia minima es del 75 por ciento".to_string()];
        let result = assess_faithfulness(&claims, "echo: respuesta generica", "contexto", &embedder, &llm, &config);
        assert!((result.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn assess_faithfulness_falls_back_to_heuristic_when_both_backends_unavailable() {
        let embedder = FailingEmbedder;
        let llm = FailingLlm;
        let config = VerificationConfig::default();
        let claims = vec!["el plazo es de 4 bimestres".to_string()];
        let result = assess_faithfulness(&claims, "el plazo es de 4 bimestres segun Art. 5", "el plazo es de 4 bimestres", &embedder, &llm, &config);
        assert!(result.score > 0.0);
    }
}
