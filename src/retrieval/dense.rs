//! Dense Retriever: embed query, MMR search the vector
//! index (optionally filtered by program), optionally rerank.

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector::{MetadataFilter, SearchResult, VectorIndex};

use super::rerank::Reranker;

/// Runs the dense-retrieval pipeline against a built [`VectorIndex`].
pub struct DenseRetriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn Embedder,
    reranker: Option<&'a dyn Reranker>,
    config: &'a RetrievalConfig,
}

impl<'a> DenseRetriever<'a> {
    /// Creates a retriever over `index`, embedding queries with `embedder`
    /// and (if `config.rerank_enabled`) rescoring with `reranker`.
    #[must_use]
    pub const fn new(
        index: &'a VectorIndex,
        embedder: &'a dyn Embedder,
        reranker: Option<&'a dyn Reranker>,
        config: &'a RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            reranker,
            config,
        }
    }

    /// Retrieves the top `k` chunks for `query`, applying `program_filter`
    /// if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedder or reranker is unavailable.
    pub fn retrieve(&self, query: &str, k: usize, program_filter: Option<&str>) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_text(query)?;
        let fetch = k * self.config.fetch_multiplier;

        let mut results = if let Some(program) = program_filter {
            let filter = MetadataFilter {
                document_name: None,
                program_filter: Some(program.to_string()),
            };
            self.index.search_with_filter(&query_embedding, k, fetch, &filter)
        } else {
            self.index.search_mmr(&query_embedding, k, fetch, self.config.mmr_lambda)
        };

        if self.config.rerank_enabled {
            if let Some(reranker) = self.reranker {
                if results.len() > k || !results.is_empty() {
                    let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
                    let scores = reranker.score(query, &texts)?;
                    for (result, score) in results.iter_mut().zip(scores) {
                        result.score = score;
                    }
                    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
                }
            }
        }

        results.truncate(k);
        Ok(results)
    }
}
