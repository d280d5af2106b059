//! Vector Index: cosine-similarity store over L2-normalized
//! embeddings, with MMR diversification and metadata-filtered search.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::Chunk;
use crate::embedding::{cosine_similarity, is_finite_vector};
use crate::error::{RetrievalError, Result};

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity score, in `[-1, 1]`.
    pub score: f32,
}

/// Metadata-equality/containment filter for [`VectorIndex::search_with_filter`]
/// ("list values match if any element overlaps").
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    /// Required document name, if any.
    pub document_name: Option<String>,
    /// Required program code; matches if it appears in the chunk's
    /// `program_codes` or `mentioned_programs`.
    pub program_filter: Option<String>,
}

impl MetadataFilter {
    fn matches(&self, chunk: &Chunk) -> bool {
        if let Some(name) = &self.document_name {
            if &chunk.document_name != name {
                return false;
            }
        }
        if let Some(program) = &self.program_filter {
            let in_codes = chunk.metadata.program_codes.iter().any(|p| p == program);
            let in_mentions = chunk.metadata.mentioned_programs.iter().any(|p| p == program);
            if !in_codes && !in_mentions {
                return false;
            }
        }
        true
    }
}

/// Cosine-similarity vector store. Parallel arrays of chunks and embeddings,
/// indexed by insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vectors held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Builds the index from scratch, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::SizeMismatch`] if `chunks.len() !=
    /// embeddings.len()`, or [`RetrievalError::NonFiniteEmbedding`] if any
    /// embedding contains a non-finite component.
    pub fn build(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(RetrievalError::SizeMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            }
            .into());
        }
        if embeddings.iter().any(|e| !is_finite_vector(e)) {
            return Err(RetrievalError::NonFiniteEmbedding.into());
        }
        self.chunks = chunks;
        self.embeddings = embeddings;
        Ok(())
    }

    /// Appends vectors. No deduplication by `chunk_id` at the index level
    /// (caller guarantees uniqueness).
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`VectorIndex::build`].
    pub fn add(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(RetrievalError::SizeMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            }
            .into());
        }
        if embeddings.iter().any(|e| !is_finite_vector(e)) {
            return Err(RetrievalError::NonFiniteEmbedding.into());
        }
        self.chunks.extend(chunks);
        self.embeddings.extend(embeddings);
        Ok(())
    }

    fn scored(&self, query: &[f32]) -> Vec<(usize, f32)> {
        self.embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, e)))
            .collect()
    }

    /// Returns the top-`k` results with score `>= threshold`, descending
    /// (`search`). An empty index returns an empty result, not an
    /// error.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, threshold: f32) -> Vec<SearchResult> {
        let mut scored = self.scored(query);
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .filter(|&(_, score)| score >= threshold)
            .take(k)
            .map(|(i, score)| SearchResult {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    /// Greedy MMR search (`search_mmr`): fetches the top `fetch`
    /// candidates by raw cosine score, then iteratively selects the one
    /// maximizing `lambda * sim(q,c) - (1-lambda) * max_{j in S} sim(c,j)`
    /// until `k` are chosen. Ties break by higher raw relevance, then lower
    /// original rank.
    #[must_use]
    pub fn search_mmr(&self, query: &[f32], k: usize, fetch: usize, lambda: f32) -> Vec<SearchResult> {
        let mut candidates = self.scored(query);
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(fetch.max(k));

        let mut selected: Vec<usize> = Vec::new();
        let mut remaining: Vec<(usize, usize, f32)> = candidates
            .iter()
            .enumerate()
            .map(|(rank, &(idx, score))| (idx, rank, score))
            .collect();

        while selected.len() < k && !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_mmr = f32::MIN;
            for (pos, &(idx, rank, relevance)) in remaining.iter().enumerate() {
                let novelty_penalty = selected
                    .iter()
                    .map(|&s| cosine_similarity(&self.embeddings[idx], &self.embeddings[s]))
                    .fold(f32::MIN, f32::max);
                let novelty_penalty = if selected.is_empty() { 0.0 } else { novelty_penalty };
                let mmr = lambda * relevance - (1.0 - lambda) * novelty_penalty;

                let better = mmr > best_mmr
                    || ((mmr - best_mmr).abs() < f32::EPSILON
                        && {
                            let (_, best_rank, best_relevance) = remaining[best_pos];
                            relevance > best_relevance || (relevance == best_relevance && rank < best_rank)
                        });
                if better {
                    best_mmr = mmr;
                    best_pos = pos;
                }
            }
            let (idx, _, _) = remaining.remove(best_pos);
            selected.push(idx);
        }

        selected
            .into_iter()
            .map(|idx| SearchResult {
                chunk: self.chunks[idx].clone(),
                score: cosine_similarity(query, &self.embeddings[idx]),
            })
            .collect()
    }

    /// Over-fetches, then post-filters by metadata, stopping at `k`.
    #[must_use]
    pub fn search_with_filter(
        &self,
        query: &[f32],
        k: usize,
        fetch: usize,
        filter: &MetadataFilter,
    ) -> Vec<SearchResult> {
        let mut scored = self.scored(query);
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(fetch.max(k));
        scored
            .into_iter()
            .filter(|&(i, _)| filter.matches(&self.chunks[i]))
            .take(k)
            .map(|(i, score)| SearchResult {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    /// Chunk ids currently held, in insertion order (for idempotent
    /// incremental adds elsewhere in the pipeline).
    #[must_use]
    pub fn chunk_ids(&self) -> HashMap<String, usize> {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (c.chunk_id.clone(), i))
            .collect()
    }

    /// Distinct document names represented in the index.
    #[must_use]
    pub fn document_names(&self) -> std::collections::HashSet<&str> {
        self.chunks.iter().map(|c| c.document_name.as_str()).collect()
    }
}
