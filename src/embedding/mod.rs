//! Embedding collaborator contract: `embed_text`/`embed_batch`,
//! always returning L2-normalized vectors of fixed dimension `D`.

pub mod fallback;
#[cfg(feature = "fastembed-embeddings")]
pub mod fastembed_impl;

pub use fallback::FallbackEmbedder;
#[cfg(feature = "fastembed-embeddings")]
pub use fastembed_impl::FastEmbedder;

use crate::error::Result;

/// Default embedding dimension `D`.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Maps text to an L2-normalized fixed-dimension vector.
pub trait Embedder: Send + Sync {
    /// The embedding dimension `D` this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embeds a single piece of text.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model is unavailable.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of texts. The default implementation calls
    /// [`Embedder::embed_text`] in sequence; implementations backed by a
    /// batched model should override this.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model is unavailable.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Cosine similarity between two equal-length vectors. For L2-normalized
/// inputs this is equivalent to the inner product.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Whether every component of `v` is finite ("the index refuses
/// non-finite values").
#[must_use]
pub fn is_finite_vector(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Constructs the default embedder: `FastEmbedder` when the
/// `fastembed-embeddings` feature is enabled, `FallbackEmbedder` otherwise.
#[must_use]
pub fn default_embedder(dimensions: usize) -> Box<dyn Embedder> {
    #[cfg(feature = "fastembed-embeddings")]
    {
        if let Ok(embedder) = FastEmbedder::try_new(dimensions) {
            return Box::new(embedder);
        }
    }
    Box::new(FallbackEmbedder::new(dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn is_finite_vector_rejects_nan() {
        assert!(!is_finite_vector(&[1.0, f32::NAN]));
        assert!(is_finite_vector(&[1.0, 0.5]));
    }
}
