//! Knowledge graph construction and storage.

pub mod community;
pub mod entity_extractor;
pub mod fuzzy;
pub mod relation_mapper;
pub mod store;

pub use community::Community;
pub use entity_extractor::extract_entities;
pub use relation_mapper::extract_relations;
pub use store::{FlatDump, GraphStatistics, KnowledgeGraph};

/// Builds a [`KnowledgeGraph`] from a document's cleaned text: extracts
/// entities, maps relations, and inserts both (post-ingest graph
/// rebuild step).
#[must_use]
pub fn build_graph_for_document(text: &str, document_name: &str) -> (Vec<crate::core::Entity>, Vec<crate::core::Relation>) {
    let entities = extract_entities(text, document_name);
    let relations = extract_relations(text, &entities);
    (entities, relations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_graph_for_document_extracts_and_maps() {
        let (entities, relations) = build_graph_for_document("La MIA requiere titulo previo de CEIA.", "doc.pdf");
        assert!(!entities.is_empty());
        assert!(!relations.is_empty());
    }
}
