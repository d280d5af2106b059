//! Layered configuration: built-in defaults, an optional `config.toml`, then
//! `CHATBOT_*` environment variables, in that order.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, StorageError};

/// Chunking bounds shared by all strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Minimum tokens per emitted chunk.
    pub min_tokens: usize,
    /// Maximum tokens per emitted chunk.
    pub max_tokens: usize,
    /// Sliding-window overlap, in characters, for the fixed strategy.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_tokens: 50,
            max_tokens: 512,
            overlap: 80,
        }
    }
}

/// Dense-retrieval tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Embedding dimension `D`.
    pub embedding_dimensions: usize,
    /// MMR lambda (relevance vs. diversity trade-off).
    pub mmr_lambda: f32,
    /// Multiplier applied to `k` to determine the MMR candidate fetch size.
    pub fetch_multiplier: usize,
    /// Minimum cosine score for plain `search`.
    pub score_threshold: f32,
    /// Whether the cross-encoder reranker is consulted when available.
    pub rerank_enabled: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_dimensions: 384,
            mmr_lambda: 0.5,
            fetch_multiplier: 4,
            score_threshold: 0.3,
            rerank_enabled: true,
        }
    }
}

/// Anti-hallucination / confidence tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Minimum confidence below which the engine abstains.
    pub abstention_threshold: f32,
    /// Cosine threshold above which a claim is considered supported by context.
    pub faithfulness_embedding_threshold: f32,
    /// Minimum faithfulness score for an answer to be considered faithful.
    pub faithfulness_pass_threshold: f32,
    /// Reserved tuning knob for a future context-precision metric (open
    /// question (b)); not computed by any operation today.
    pub context_precision_threshold: f32,
    /// Lowercase substrings that mark a query as out of scope.
    pub out_of_scope_markers: Vec<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            abstention_threshold: 0.3,
            faithfulness_embedding_threshold: 0.65,
            faithfulness_pass_threshold: 0.7,
            context_precision_threshold: 0.35,
            out_of_scope_markers: vec![
                "precio".into(),
                "cuánto cuesta".into(),
                "cuanto cuesta".into(),
                "opinión".into(),
                "opinion".into(),
                "mejor universidad".into(),
                "peor universidad".into(),
            ],
        }
    }
}

/// Keyword-dispatched fallback contact routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackContacts {
    /// Contact used when the query matches no specific keyword bucket.
    pub default_contact: String,
    /// `(keyword, contact)` pairs, checked in order; first match wins.
    pub routes: Vec<(String, String)>,
}

impl Default for FallbackContacts {
    fn default() -> Self {
        Self {
            default_contact: "info@lse.fiuba".into(),
            routes: vec![
                ("inscrib".into(), "inscripciones@lse.fiuba".into()),
                ("proyecto".into(), "direccion.posgrado@lse.fiuba".into()),
                ("gdp".into(), "direccion.posgrado@lse.fiuba".into()),
                ("gti".into(), "direccion.posgrado@lse.fiuba".into()),
                ("trabajo final".into(), "direccion.posgrado@lse.fiuba".into()),
                ("tesis".into(), "direccion.posgrado@lse.fiuba".into()),
                ("ttf".into(), "direccion.posgrado@lse.fiuba".into()),
                ("defensa".into(), "direccion.posgrado@lse.fiuba".into()),
            ],
        }
    }
}

impl FallbackContacts {
    /// Routes a (lowercased) query to exactly one contact.
    #[must_use]
    pub fn route(&self, query_lower: &str) -> String {
        for (keyword, contact) in &self.routes {
            if query_lower.contains(keyword.as_str()) {
                return contact.clone();
            }
        }
        self.default_contact.clone()
    }
}

/// Filesystem roots for the ingest pipeline and its indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory containing raw source documents.
    pub raw_dir: PathBuf,
    /// Directory containing extracted/cleaned/metadata/chunks artifacts.
    pub processed_dir: PathBuf,
    /// Directory containing the persisted vector index.
    pub index_dir: PathBuf,
    /// Directory containing the persisted knowledge graph.
    pub graph_dir: PathBuf,
    /// Path to the document registry (open question (c)).
    pub registry_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            index_dir: PathBuf::from("data/index"),
            graph_dir: PathBuf::from("data/graph"),
            registry_path: PathBuf::from("config/registry.toml"),
        }
    }
}

/// Root configuration, loaded once at process start and shared read-only
/// thereafter (config never mutates after load).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Chunking bounds.
    pub chunking: ChunkingConfig,
    /// Retrieval tuning knobs.
    pub retrieval: RetrievalConfig,
    /// Anti-hallucination tuning knobs.
    pub verification: VerificationConfig,
    /// Fallback-contact routing table.
    pub fallback_contacts: FallbackContacts,
    /// Filesystem roots.
    pub paths: PathsConfig,
}

impl Config {
    /// Loads configuration by layering built-in defaults, an optional
    /// `config.toml` at `config_path`, then `CHATBOT_*` environment
    /// variables (nested fields use double underscores, e.g.
    /// `CHATBOT_VERIFICATION__ABSTENTION_THRESHOLD`).
    pub fn load(config_path: Option<&std::path::Path>) -> Result<Self, Error> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).map_err(|e| {
                Error::Storage(StorageError::Serde(format!("default config: {e}")))
            })?);

        if let Some(path) = config_path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }

        let built = builder
            .add_source(
                config::Environment::with_prefix("CHATBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Storage(StorageError::Serde(e.to_string())))?;

        built
            .try_deserialize()
            .map_err(|e| Error::Storage(StorageError::Serde(e.to_string())))
    }
}

/// A document's static classification, consulted by the Metadata Tagger
/// (source (a)) and never hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Document class used by the chunker's strategy-selection rule.
    pub document_type: crate::core::chunk::DocumentType,
    /// Program codes this document is associated with.
    #[serde(default)]
    pub program_codes: Vec<String>,
    /// Free-text topics this document covers.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Degree level, if applicable (e.g. "maestria", "especializacion").
    #[serde(default)]
    pub degree_level: Option<String>,
}

/// `document_name -> RegistryEntry` table, loaded from `registry_path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRegistry(pub HashMap<String, RegistryEntry>);

impl DocumentRegistry {
    /// Loads the registry from a TOML file; a missing file yields an empty registry.
    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(StorageError::from)?;
        toml_to_registry(&text)
    }

    /// Looks up an entry by document name.
    #[must_use]
    pub fn get(&self, document_name: &str) -> Option<&RegistryEntry> {
        self.0.get(document_name)
    }
}

fn toml_to_registry(text: &str) -> Result<DocumentRegistry, Error> {
    #[derive(Deserialize)]
    struct Wire {
        #[serde(flatten)]
        entries: HashMap<String, RegistryEntry>,
    }
    let wire: Wire = toml::from_str(text)
        .map_err(|e| Error::Storage(StorageError::Serde(format!("registry.toml: {e}"))))?;
    Ok(DocumentRegistry(wire.entries))
}
