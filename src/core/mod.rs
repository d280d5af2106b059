//! Core data model: chunks, entities, and relations.

pub mod chunk;
pub mod entity;
pub mod relation;

pub use chunk::{Chunk, ChunkBuilder, ChunkMetadata, ChunkStrategy, DocumentType};
pub use entity::{Entity, EntityKind};
pub use relation::{Relation, RelationKind};
