//! Dense and graph retrieval.

pub mod dense;
pub mod graph_retriever;
pub mod rerank;

pub use dense::DenseRetriever;
pub use graph_retriever::{GraphResult, GraphRetriever};
pub use rerank::{NoopReranker, Reranker};
