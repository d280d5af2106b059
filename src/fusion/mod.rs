//! Hybrid Fuser: query-mode classification and RAG/graph
//! context merge.

use serde::{Deserialize, Serialize};

use crate::retrieval::GraphResult;
use crate::vector::SearchResult;

/// Retrieval mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Dense retrieval only.
    RagOnly,
    /// Graph retrieval only.
    GraphOnly,
    /// Both, merged.
    Hybrid,
}

/// `(rag_weight, graph_weight)` pair driving confidence aggregation and
/// textual emphasis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryWeights {
    /// Weight given to the RAG (dense) context.
    pub rag: f32,
    /// Weight given to the graph context.
    pub graph: f32,
}

const PATH_KEYWORDS: &[&str] = &["camino de", "cómo llego", "como llego", "pasos desde", "trayecto"];
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "requisito",
    "necesito para",
    "correlativa",
    "prerrequisito",
    "camino",
    "pasos para",
    "antes de",
    "después de",
    "despues de",
    "primero",
    "desde",
    "hasta",
];
const DESCRIPTIVE_KEYWORDS: &[&str] = &[
    "qué es",
    "que es",
    "cómo funciona",
    "como funciona",
    "explicar",
    "describir",
    "fundamentación",
    "fundamentacion",
    "objetivos",
    "perfil",
];

/// Classifies a lowercased query into retrieval weights (path
/// keywords beat structural, structural beats descriptive, else default).
/// The `"desde ... hasta"` phrase counts as a path keyword only when both
/// words co-occur; a lone `desde` or `hasta` is structural.
#[must_use]
pub fn classify_query(query: &str) -> QueryWeights {
    let lower = query.to_lowercase();
    let is_desde_hasta_path = lower.contains("desde") && lower.contains("hasta");
    if is_desde_hasta_path || PATH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return QueryWeights { rag: 0.1, graph: 0.9 };
    }
    if STRUCTURAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return QueryWeights { rag: 0.3, graph: 0.7 };
    }
    if DESCRIPTIVE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return QueryWeights { rag: 0.8, graph: 0.2 };
    }
    QueryWeights { rag: 0.6, graph: 0.4 }
}

/// Merged retrieval output for a single query.
#[derive(Debug, Clone)]
pub struct HybridResult {
    /// Dense-retrieval hits, in rank order.
    pub rag_results: Vec<SearchResult>,
    /// Graph-retrieval hits, in rank order.
    pub graph_results: Vec<GraphResult>,
    /// The `=== RAG === / === GRAPH ===` merged context text.
    pub merged_context: String,
    /// Mean of `rag_results` scores, or `0.0` if empty.
    pub rag_confidence: f32,
    /// Mean of `graph_results` confidences, or `0.0` if empty.
    pub graph_confidence: f32,
    /// The mode this result was produced under.
    pub mode: Mode,
}

fn mean(values: impl Iterator<Item = f32> + Clone) -> f32 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        values.sum::<f32>() / count as f32
    }
}

/// Merges dense and graph results into one labeled context (
/// "Context merge"). Sections are omitted when empty.
#[must_use]
pub fn fuse(
    mode: Mode,
    rag_results: Vec<SearchResult>,
    graph_results: Vec<GraphResult>,
    path_description: Option<&str>,
) -> HybridResult {
    let mut merged_context = String::new();

    if !rag_results.is_empty() {
        merged_context.push_str("=== RAG ===\n");
        for (i, result) in rag_results.iter().enumerate() {
            let section = result.chunk.section_title.as_deref().unwrap_or("sin sección");
            merged_context.push_str(&format!(
                "[RAG-{}: {}, {} ({:.2})]\n{}\n\n",
                i + 1,
                result.chunk.document_name,
                section,
                result.score,
                result.chunk.text
            ));
        }
    }

    if !graph_results.is_empty() {
        merged_context.push_str("=== GRAPH ===\n");
        for (i, result) in graph_results.iter().enumerate() {
            merged_context.push_str(&format!("[Graph-{}: ({:.2})]\n{}\n\n", i + 1, result.confidence, result.text));
        }
        if let Some(path) = path_description {
            merged_context.push_str(&format!("path: {path}\n"));
        }
    }

    let rag_confidence = mean(rag_results.iter().map(|r| r.score));
    let graph_confidence = mean(graph_results.iter().map(|r| r.confidence));

    HybridResult {
        rag_results,
        graph_results,
        merged_context,
        rag_confidence,
        graph_confidence,
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_keywords_beat_structural() {
        let weights = classify_query("camino de la MIA hasta la CEIA, que requisito tengo");
        assert!((weights.graph - 0.9).abs() < 1e-6);
    }

    #[test]
    fn structural_keywords_beat_descriptive() {
        let weights = classify_query("requisito para explicar el programa");
        assert!((weights.graph - 0.7).abs() < 1e-6);
    }

    #[test]
    fn lone_desde_is_structural_not_path() {
        let weights = classify_query("que requisito necesito desde el primer año");
        assert!((weights.graph - 0.7).abs() < 1e-6);
    }

    #[test]
    fn desde_and_hasta_co_occurrence_is_path() {
        let weights = classify_query("quiero ir desde la MIA hasta la CEIA");
        assert!((weights.graph - 0.9).abs() < 1e-6);
    }

    #[test]
    fn descriptive_keywords_detected() {
        let weights = classify_query("qué es la MIA");
        assert!((weights.rag - 0.8).abs() < 1e-6);
    }

    #[test]
    fn default_weights_when_no_keyword_matches() {
        let weights = classify_query("hola buenos dias");
        assert!((weights.rag - 0.6).abs() < 1e-6);
    }

    #[test]
    fn fuse_omits_empty_sections() {
        let result = fuse(Mode::RagOnly, Vec::new(), Vec::new(), None);
        assert!(result.merged_context.is_empty());
    }
}
