//! Vector-index persistence: binary index plus a JSON metadata sidecar
//! under `index_dir`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::vector::VectorIndex;

/// Sidecar facts about a persisted index, useful without deserializing the
/// full binary payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Number of vectors in the index.
    pub vector_count: usize,
    /// Embedding dimension.
    pub dimensions: usize,
}

fn index_path(dir: &Path) -> std::path::PathBuf {
    dir.join("index.bin")
}

fn metadata_path(dir: &Path) -> std::path::PathBuf {
    dir.join("index.meta.json")
}

/// Persists `index` as `index.bin` (bincode) plus `index.meta.json`.
///
/// # Errors
///
/// Returns an error on I/O or encoding failure.
pub fn save(dir: &Path, index: &VectorIndex, dimensions: usize) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(StorageError::from)?;
    let encoded = bincode::serialize(index).map_err(StorageError::from)?;
    std::fs::write(index_path(dir), encoded).map_err(StorageError::from)?;

    let metadata = IndexMetadata {
        vector_count: index.len(),
        dimensions,
    };
    let json = serde_json::to_string_pretty(&metadata).map_err(StorageError::from)?;
    std::fs::write(metadata_path(dir), json).map_err(StorageError::from)?;
    Ok(())
}

/// Loads a previously persisted index from `dir`.
///
/// # Errors
///
/// Returns an error on I/O or decoding failure.
pub fn load(dir: &Path) -> Result<VectorIndex> {
    let bytes = std::fs::read(index_path(dir)).map_err(StorageError::from)?;
    bincode::deserialize(&bytes).map_err(|e| StorageError::from(e).into())
}

/// Loads just the metadata sidecar, without the full index.
///
/// # Errors
///
/// Returns an error on I/O or deserialization failure.
pub fn load_metadata(dir: &Path) -> Result<IndexMetadata> {
    let text = std::fs::read_to_string(metadata_path(dir)).map_err(StorageError::from)?;
    serde_json::from_str(&text).map_err(|e| StorageError::from(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChunkBuilder, ChunkStrategy, DocumentType};

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = VectorIndex::new();
        let chunk = ChunkBuilder::new("texto", "doc", DocumentType::Other, 0, ChunkStrategy::Fixed).build();
        index.build(vec![chunk], vec![vec![1.0, 0.0]]).unwrap();

        save(dir.path(), &index, 2).unwrap();
        let restored = load(dir.path()).unwrap();
        assert_eq!(restored.len(), 1);

        let metadata = load_metadata(dir.path()).unwrap();
        assert_eq!(metadata.vector_count, 1);
        assert_eq!(metadata.dimensions, 2);
    }
}
