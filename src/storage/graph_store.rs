//! Knowledge-graph persistence: a full-fidelity JSON dump plus an optional
//! flat visualization export (`persist`/`load`).

use std::path::Path;

use crate::error::{Result, StorageError};
use crate::graph::{FlatDump, KnowledgeGraph};

fn graph_path(dir: &Path) -> std::path::PathBuf {
    dir.join("graph.json")
}

fn visualization_path(dir: &Path) -> std::path::PathBuf {
    dir.join("graph.viz.json")
}

/// Persists `graph` as `graph.json` and, if `with_visualization`, also
/// writes the flat node/edge dump to `graph.viz.json`.
///
/// # Errors
///
/// Returns an error on I/O or serialization failure.
pub fn save(dir: &Path, graph: &KnowledgeGraph, with_visualization: bool) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(StorageError::from)?;
    let dump = graph.to_flat_dump();
    let json = serde_json::to_string_pretty(&dump).map_err(StorageError::from)?;
    std::fs::write(graph_path(dir), &json).map_err(StorageError::from)?;
    if with_visualization {
        std::fs::write(visualization_path(dir), json).map_err(StorageError::from)?;
    }
    Ok(())
}

/// Loads a previously persisted graph from `dir`.
///
/// # Errors
///
/// Returns an error on I/O or deserialization failure.
pub fn load(dir: &Path) -> Result<KnowledgeGraph> {
    let text = std::fs::read_to_string(graph_path(dir)).map_err(StorageError::from)?;
    let dump: FlatDump = serde_json::from_str(&text).map_err(StorageError::from)?;
    Ok(KnowledgeGraph::from_flat_dump(dump))
}
