//! Pluggable cross-encoder reranking. No in-pack crate ships a
//! cross-encoder model, so this stays a trait seam rather than a concrete
//! implementation.

use crate::error::Result;

/// Re-scores `(query, candidate text)` pairs. Implementations replace the
/// vector-search scores with their own on the candidates they touch.
pub trait Reranker: Send + Sync {
    /// Scores each `(query, text)` pair, returning one score per input in
    /// the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model is unavailable.
    fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>>;
}

/// A reranker that returns its inputs unchanged, for tests and for
/// deployments that opt out of reranking without disabling retrieval.
pub struct NoopReranker;

impl Reranker for NoopReranker {
    fn score(&self, _query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        Ok(vec![0.0; texts.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reranker_returns_zeroed_scores() {
        let reranker = NoopReranker;
        let scores = reranker.score("q", &["a", "b"]).unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);
    }
}
