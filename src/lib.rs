//! # chatbot-admin-rs
//!
//! Hybrid retrieval-synthesis engine over institutional administrative
//! documents: dense vector retrieval over text chunks, traversal over a
//! domain knowledge graph, LLM-backed answer synthesis, and a multi-layer
//! anti-hallucination/confidence/abstention engine.
//!
//! ## Components
//!
//! - **Ingest** ([`ingest`]): a content-hashed pipeline that cleans, tags,
//!   and chunks raw documents, then rebuilds the vector index and graph.
//! - **Retrieval** ([`retrieval`], [`vector`], [`graph`]): dense MMR search
//!   plus query-to-node grounding over the graph.
//! - **Fusion** ([`fusion`]): query-class-dependent weighted merge of both
//!   retrieval signals.
//! - **Synthesis** ([`synth`], [`llm`]): prompt assembly and LLM call.
//! - **Verification** ([`verify`]): faithfulness, cross-reference,
//!   confidence, and abstention.
//! - **Query surface** ([`query`]): binds the above into `answer`/`compare`/`health`.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod fusion;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod metadata;
pub mod query;
pub mod retrieval;
pub mod storage;
pub mod synth;
pub mod vector;
pub mod verify;

pub use error::{Error, ErrorKind, Result};

pub use core::{Chunk, ChunkMetadata, ChunkStrategy, DocumentType, Entity, EntityKind, Relation, RelationKind};

pub use config::Config;

pub use vector::VectorIndex;

pub use graph::KnowledgeGraph;

pub use query::{HealthStatus, QueryEngine, QueryResponse};

pub use llm::{EchoLlm, LlmClient};

pub use embedding::{default_embedder, Embedder, FallbackEmbedder};

pub use cli::Cli;
