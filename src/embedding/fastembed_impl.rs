//! `FastEmbed`-backed embedder (feature `fastembed-embeddings`).
//!
//! Wraps an ONNX sentence-embedding model behind the [`Embedder`] trait.
//! Falls back to [`super::FallbackEmbedder`] at the call site
//! ([`super::default_embedder`]) if model initialization fails (offline
//! environment, missing cache, ...).

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{LlmError, Result};

use super::Embedder;

/// `FastEmbed` ONNX-backed embedder. The underlying model handle requires
/// `&mut self` to run inference, so it is guarded by a mutex to satisfy the
/// `Send + Sync` bound the rest of the crate relies on.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    dimensions: usize,
}

impl FastEmbedder {
    /// Attempts to initialize the embedding model, downloading weights on
    /// first use if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be initialized (no network
    /// access, unsupported dimensions, ...).
    pub fn try_new(dimensions: usize) -> Result<Self> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        Ok(Self {
            model: Mutex::new(model),
            dimensions,
        })
    }
}

impl Embedder for FastEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| LlmError::Unavailable("embedding model mutex poisoned".into()))?;
        let mut out = model
            .embed(vec![text], None)
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        out.pop()
            .ok_or_else(|| LlmError::MalformedResponse("empty embedding batch".into()).into())
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| LlmError::Unavailable("embedding model mutex poisoned".into()))?;
        let result = model
            .embed(texts.to_vec(), None)
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        Ok(result)
    }
}
