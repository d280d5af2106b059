//! Ingest Orchestrator (C12): a content-hashed, per-document state machine
//! that drives extraction through chunking, then rebuilds the vector index
//! and knowledge graph from the full corpus.

pub mod cleaner;
pub mod extractor;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::config::{Config, DocumentRegistry};
use crate::core::{Chunk, DocumentType};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::graph::KnowledgeGraph;
use crate::storage::fs::{ArtifactStore, DocumentMetadata, PipelineState};
use crate::storage::{graph_store, index_store};
use crate::vector::VectorIndex;

use extractor::extractor_for;

/// Final state of a single document after one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Content hash matched the stored state; no work was done.
    Skipped,
    /// All stages completed; chunks were written.
    Processed {
        /// Number of chunks emitted.
        chunk_count: usize,
    },
    /// A stage raised; the document is excluded from this run's corpus.
    Failed {
        /// The stage that raised (`extracting`, `cleaning`, `tagging`, `chunking`).
        stage: &'static str,
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Per-document result, keyed by file stem.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// File stem (used as the document name elsewhere in the crate).
    pub document_name: String,
    /// The outcome of this run for this document.
    pub outcome: DocumentOutcome,
}

/// Summary of a full orchestrator run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Per-document outcomes, in discovery order.
    pub documents: Vec<DocumentReport>,
    /// Total chunks held in the rebuilt index.
    pub total_chunks: usize,
    /// Nodes in the rebuilt graph, if it was rebuilt.
    pub graph_nodes: Option<usize>,
}

/// Options controlling a single orchestrator run (Ingest CLI flags).
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Bypasses the content-hash skip check for every document.
    pub force: bool,
    /// Restricts the run to a single document stem, if set.
    pub only_document: Option<String>,
    /// Skips the post-ingest graph rebuild.
    pub skip_graph: bool,
    /// An additional directory scanned alongside `config.paths.raw_dir`.
    pub extra_dir: Option<PathBuf>,
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

fn classify(registry: &DocumentRegistry, document_name: &str) -> DocumentType {
    registry.get(document_name).map_or(DocumentType::Other, |entry| entry.document_type)
}

fn stem_of(path: &Path) -> String {
    path.file_stem().and_then(std::ffi::OsStr::to_str).unwrap_or("document").to_string()
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries.filter_map(std::result::Result::ok).map(|e| e.path()).filter(|p| p.is_file()).collect()
}

fn discover_documents(raw_dir: &Path, extra_dir: Option<&Path>, only_document: Option<&str>) -> Vec<PathBuf> {
    let mut paths = list_dir(raw_dir);
    if let Some(extra) = extra_dir {
        paths.extend(list_dir(extra));
    }
    if let Some(only) = only_document {
        paths.retain(|p| stem_of(p) == only);
    }
    paths.sort();
    paths.dedup_by(|a, b| stem_of(a) == stem_of(b));
    paths
}

/// Runs extraction through chunking for one document, writing each
/// artifact as it completes. Returns the outcome; never raises except for
/// bugs in the store itself.
fn process_document(
    path: &Path,
    store: &ArtifactStore,
    registry: &DocumentRegistry,
    config: &Config,
) -> Result<(DocumentOutcome, Vec<Chunk>)> {
    let stem = stem_of(path);
    let document_type = classify(registry, &stem);

    let raw = match extractor_for(path).extract(path) {
        Ok(text) => text,
        Err(e) => {
            return Ok((
                DocumentOutcome::Failed { stage: "extracting", reason: e.to_string() },
                Vec::new(),
            ))
        }
    };
    store.write_extracted(&stem, &raw)?;

    let cleaned = cleaner::clean(&raw);
    store.write_cleaned(&stem, &cleaned)?;

    let content_hash = sha256_hex(&cleaned);
    store.write_metadata(
        &stem,
        &DocumentMetadata {
            document_name: stem.clone(),
            document_type,
            content_hash: content_hash.clone(),
        },
    )?;

    let mut chunks = match crate::chunking::chunk_document(&cleaned, &stem, document_type, &config.chunking) {
        Ok(chunks) => chunks,
        Err(e) => {
            return Ok((
                DocumentOutcome::Failed { stage: "chunking", reason: e.to_string() },
                Vec::new(),
            ))
        }
    };
    crate::metadata::tag_chunks(&mut chunks, registry);
    store.write_chunks(&stem, &chunks)?;

    let chunk_count = chunks.len();
    Ok((DocumentOutcome::Processed { chunk_count }, chunks))
}

/// Runs one full ingest pass: per-document state machine, then index and
/// graph rebuild.
///
/// # Errors
///
/// Returns an error if `config.paths.raw_dir` cannot be read, or if a
/// successfully-processed document's artifacts cannot be written.
pub fn run(config: &Config, embedder: &dyn Embedder, options: &IngestOptions) -> Result<IngestReport> {
    let store = ArtifactStore::new(&config.paths.processed_dir);
    let registry = DocumentRegistry::load(&config.paths.registry_path)?;
    let mut state = store.load_state()?;

    if !config.paths.raw_dir.exists() {
        return Err(crate::error::IngestError::InputMissing(config.paths.raw_dir.display().to_string()).into());
    }
    let documents = discover_documents(&config.paths.raw_dir, options.extra_dir.as_deref(), options.only_document.as_deref());
    if documents.is_empty() {
        return Err(crate::error::IngestError::InputMissing("no documents found to ingest".to_string()).into());
    }

    let mut reports = Vec::with_capacity(documents.len());
    let mut new_hashes: Vec<(String, String)> = Vec::new();

    for path in &documents {
        let stem = stem_of(path);
        let raw_probe = extractor_for(path).extract(path);

        if !options.force {
            if let (Ok(raw), Some(previous_hash)) = (&raw_probe, state.0.get(&stem)) {
                let cleaned_probe = cleaner::clean(raw);
                if &sha256_hex(&cleaned_probe) == previous_hash {
                    reports.push(DocumentReport { document_name: stem, outcome: DocumentOutcome::Skipped });
                    continue;
                }
            }
        }

        let (outcome, _) = process_document(path, &store, &registry, config)?;
        if let DocumentOutcome::Processed { .. } = &outcome {
            if let Ok(Some(cleaned)) = store.read_cleaned(&stem) {
                new_hashes.push((stem.clone(), sha256_hex(&cleaned)));
            }
        }
        reports.push(DocumentReport { document_name: stem, outcome });
    }

    for (name, hash) in new_hashes {
        state.0.insert(name, hash);
    }
    store.save_state(&state)?;

    let all_chunks = store.read_all_chunks()?;
    let embeddings: Result<Vec<Vec<f32>>> = all_chunks
        .par_iter()
        .map(|chunk| embedder.embed_text(&chunk.text))
        .collect();
    let embeddings = embeddings?;

    let mut index = VectorIndex::new();
    index.build(all_chunks.clone(), embeddings)?;
    index_store::save(&config.paths.index_dir, &index, config.retrieval.embedding_dimensions)?;

    let graph_nodes = if options.skip_graph {
        None
    } else {
        let concatenated: String = all_chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let mut graph = KnowledgeGraph::new();
        for chunk in &all_chunks {
            let entities = crate::graph::extract_entities(&chunk.text, &chunk.document_name);
            for entity in entities {
                graph.add_entity(entity);
            }
        }
        let relations = crate::graph::extract_relations(&concatenated, &graph.entities().cloned().collect::<Vec<_>>());
        for relation in relations {
            graph.add_relation(relation);
        }
        let _ = graph.detect_communities();
        graph_store::save(&config.paths.graph_dir, &graph, true)?;
        Some(graph.node_count())
    };

    Ok(IngestReport { documents: reports, total_chunks: all_chunks.len(), graph_nodes })
}
