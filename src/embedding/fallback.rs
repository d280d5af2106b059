//! Hash-based fallback embedder.
//!
//! Provides deterministic pseudo-embeddings when no real embedding model is
//! configured, so ingest and retrieval stay exercisable offline. Folds
//! accents before hashing (`política`/`politica` land in the same bucket,
//! which matters for a corpus where source documents are inconsistent about
//! diacritics) and gives institutional codes and numeric deadlines — the
//! tokens `faithfulness_heuristic` also treats as salient — extra weight, so
//! lexical overlap on those tokens outweighs overlap on filler words.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;

use super::Embedder;

const SALIENT_WEIGHT: f32 = 2.0;
const SALIENT_PATTERNS: &[&str] = &[r"^\d+$", r"^\d+%$", r"^(mia|miae|ceia|cese|ttfa|ttfb|gdp|gti)$", r"^art\.?$"];

fn salient_res() -> &'static [Regex] {
    static RES: LazyLock<Vec<Regex>> = LazyLock::new(|| SALIENT_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect());
    &RES
}

fn is_salient(word: &str) -> bool {
    salient_res().iter().any(|re| re.is_match(word))
}

fn fold_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !('\u{0300}'..='\u{036f}').contains(c)).collect()
}

/// Hash-based fallback embedder: word-level hashing (salience-weighted) for
/// vocabulary capture, character 4-gram hashing for fuzzy matching,
/// normalized to unit length.
pub struct FallbackEmbedder {
    dimensions: usize,
}

impl FallbackEmbedder {
    /// Creates a new fallback embedder with the specified dimensions.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_string(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let folded = fold_diacritics(text);
        let normalized: String = folded
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c.to_ascii_lowercase()
                } else {
                    ' '
                }
            })
            .collect();

        let words: Vec<&str> = normalized.split_whitespace().collect();
        for word in &words {
            let hash = Self::hash_string(word);
            let idx = (hash as usize) % self.dimensions;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            let mut magnitude = 1.0 + ((hash >> 16) & 0xFF) as f32 / 255.0;
            if is_salient(word) {
                magnitude *= SALIENT_WEIGHT;
            }
            embedding[idx] += sign * magnitude;
        }

        let chars: Vec<char> = normalized.chars().collect();
        if chars.len() >= 4 {
            for window in chars.windows(4) {
                let ngram: String = window.iter().collect();
                let hash = Self::hash_string(&ngram);
                let idx = (hash as usize) % self.dimensions;
                let sign = if (hash >> 32) & 1 == 0 { 0.5 } else { -0.5 };
                embedding[idx] += sign;
            }
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Embedder for FallbackEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        use rayon::prelude::*;
        Ok(texts.par_iter().map(|text| self.generate_embedding(text)).collect())
    }
}
