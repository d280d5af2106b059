//! Graph Retriever: grounds a query to known nodes, renders
//! their radius-2 subgraphs, and describes a shortest path when two or more
//! nodes ground.

use crate::core::EntityKind;
use crate::error::Result;
use crate::graph::{fuzzy, KnowledgeGraph};

/// One grounded node's rendered context and confidence.
#[derive(Debug, Clone)]
pub struct GraphResult {
    /// Rendered subgraph text for this grounded node.
    pub text: String,
    /// `min(entity_count / 5, 1.0)`.
    pub confidence: f32,
}

/// Grounds `query` to graph nodes and renders their contexts.
pub struct GraphRetriever<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> GraphRetriever<'a> {
    /// Creates a retriever over `graph`.
    #[must_use]
    pub const fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    fn ground(&self, query_lower: &str) -> Vec<String> {
        let mut grounded = Vec::new();

        for entity in self.graph.entities() {
            if matches!(entity.kind, EntityKind::Program | EntityKind::Subject | EntityKind::Process)
                && entity.matches_lower(query_lower)
                && query_lower.contains(&entity.name.to_lowercase())
            {
                grounded.push(entity.entity_id.clone());
            }
        }
        if !grounded.is_empty() {
            grounded.sort();
            grounded.dedup();
            return grounded;
        }

        let candidates: Vec<(&str, &str)> = self
            .graph
            .entities()
            .map(|e| (e.entity_id.as_str(), e.name.as_str()))
            .collect();
        let matches = fuzzy::top_matches(query_lower, candidates.into_iter(), 5);
        matches.into_iter().map(|(id, _)| id.to_string()).collect()
    }

    /// Retrieves up to `k` grounded nodes' subgraph contexts, plus a
    /// shortest-path description if two or more nodes grounded.
    ///
    /// # Errors
    ///
    /// Returns an error if graph traversal fails unexpectedly (never under
    /// normal operation, since all ids come from `self.graph`).
    pub fn retrieve(&self, query: &str, k: usize) -> Result<(Vec<GraphResult>, Option<String>)> {
        let query_lower = query.to_lowercase();
        let grounded = self.ground(&query_lower);

        let mut results = Vec::new();
        for entity_id in grounded.iter().take(k) {
            let members = self.graph.subgraph(entity_id, 2)?;
            let text = self.graph.render_subgraph_context(entity_id, 2)?;
            #[allow(clippy::cast_precision_loss)]
            let confidence = (members.len() as f32 / 5.0).min(1.0);
            results.push(GraphResult { text, confidence });
        }

        let path_description = if grounded.len() >= 2 {
            self.graph
                .shortest_path(&grounded[0], &grounded[1])?
                .map(|path| describe_path(self.graph, &path))
        } else {
            None
        };

        Ok((results, path_description))
    }
}

fn describe_path(graph: &KnowledgeGraph, path: &[&crate::core::Entity]) -> String {
    let mut parts = Vec::new();
    for window in path.windows(2) {
        let (a, b) = (window[0], window[1]);
        let kind = graph
            .relations()
            .find(|r| {
                (r.source_id == a.entity_id && r.target_id == b.entity_id)
                    || (r.source_id == b.entity_id && r.target_id == a.entity_id)
            })
            .map_or("related_to", |r| r.kind.as_str());
        parts.push(format!("{} --[{kind}]--> {}", a.name, b.name));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Entity, EntityKind, Relation, RelationKind};

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let mia = Entity::new("MIA", EntityKind::Program, "doc.pdf");
        let ceia = Entity::new("CEIA", EntityKind::Program, "doc.pdf");
        let (mia_id, ceia_id) = (mia.entity_id.clone(), ceia.entity_id.clone());
        graph.add_entity(mia);
        graph.add_entity(ceia);
        graph.add_relation(Relation::new(mia_id, ceia_id, RelationKind::RequiresGraduationFrom, "ev"));
        graph
    }

    #[test]
    fn grounds_query_by_exact_program_code() {
        let graph = sample_graph();
        let retriever = GraphRetriever::new(&graph);
        let (results, _) = retriever.retrieve("requisitos para la MIA", 5).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("requires_graduation_from"));
    }

    #[test]
    fn describes_path_when_two_nodes_ground() {
        let graph = sample_graph();
        let retriever = GraphRetriever::new(&graph);
        let (_, path) = retriever.retrieve("camino desde MIA hasta CEIA", 5).unwrap();
        assert!(path.is_some());
        assert!(path.unwrap().contains("requires_graduation_from"));
    }

    #[test]
    fn no_grounding_yields_empty_results() {
        let graph = sample_graph();
        let retriever = GraphRetriever::new(&graph);
        let (results, path) = retriever.retrieve("xyz completamente no relacionado", 5).unwrap();
        assert!(results.is_empty());
        assert!(path.is_none());
    }
}
