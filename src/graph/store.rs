//! Graph Store. Backed by `petgraph::stable_graph::StableDiGraph`
//! keyed by `entity_id` via an index map, so traversal reuses
//! `petgraph::algo`/`petgraph::visit` instead of hand-rolled BFS.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, IntoNodeReferences};
use petgraph::{Direction, Graph};
use serde::{Deserialize, Serialize};

use crate::core::{Entity, EntityKind, Relation, RelationKind};
use crate::error::{GraphError, Result};

/// Aggregate counts returned by [`KnowledgeGraph::statistics`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStatistics {
    /// Node count by kind.
    pub nodes_by_kind: HashMap<String, usize>,
    /// Edge count by kind.
    pub edges_by_kind: HashMap<String, usize>,
    /// `2E / (N * (N-1))` for the underlying undirected projection.
    pub density: f64,
    /// Number of weakly-connected components.
    pub connected_components: usize,
}

/// Flat dump used for external visualization tooling (`persist`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatDump {
    /// Every node's entity record.
    pub nodes: Vec<Entity>,
    /// Every edge's relation record.
    pub edges: Vec<Relation>,
}

/// Directed labeled knowledge graph over entities and relations.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    graph: StableDiGraph<Entity, Relation>,
    index: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Inserts or replaces an entity, keyed by `entity_id`.
    pub fn add_entity(&mut self, entity: Entity) -> NodeIndex {
        if let Some(&idx) = self.index.get(&entity.entity_id) {
            self.graph[idx] = entity;
            idx
        } else {
            let id = entity.entity_id.clone();
            let idx = self.graph.add_node(entity);
            self.index.insert(id, idx);
            idx
        }
    }

    fn ensure_placeholder(&mut self, entity_id: &str, source_document: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(entity_id) {
            return idx;
        }
        let placeholder = crate::core::entity::placeholder(entity_id, source_document);
        self.add_entity(placeholder)
    }

    /// Adds a relation, auto-creating `unknown`-kind placeholder entities for
    /// any endpoint not already present (Relation invariants).
    pub fn add_relation(&mut self, relation: Relation) {
        let source_document = self
            .index
            .get(&relation.source_id)
            .map_or_else(String::new, |&idx| self.graph[idx].source_document.clone());
        let source = self.ensure_placeholder(&relation.source_id, &source_document);
        let target = self.ensure_placeholder(&relation.target_id, &source_document);
        self.graph.add_edge(source, target, relation);
    }

    fn lookup(&self, entity_id: &str) -> Result<NodeIndex> {
        self.index
            .get(entity_id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(entity_id.to_string()).into())
    }

    /// Returns the entity for `entity_id`, if present.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.index.get(entity_id).map(|&idx| &self.graph[idx])
    }

    /// BFS over the undirected projection, up to `radius` hops (
    /// `subgraph`).
    ///
    /// # Errors
    ///
    /// Returns an error if `entity_id` is not a known node.
    pub fn subgraph(&self, entity_id: &str, radius: usize) -> Result<Vec<&Entity>> {
        let start = self.lookup(entity_id)?;
        let mut visited = HashSet::new();
        let mut frontier = vec![start];
        visited.insert(start);

        for _ in 0..radius {
            let mut next = Vec::new();
            for &node in &frontier {
                for neighbor in self
                    .graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .chain(self.graph.neighbors_directed(node, Direction::Incoming))
                {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(visited.into_iter().map(|idx| &self.graph[idx]).collect())
    }

    /// Shortest path over the undirected projection, by hop count. `None` if
    /// disconnected (`shortest_path`).
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is not a known node.
    pub fn shortest_path(&self, source: &str, target: &str) -> Result<Option<Vec<&Entity>>> {
        let source_idx = self.lookup(source)?;
        let target_idx = self.lookup(target)?;

        let undirected: StableGraph<Entity, Relation, petgraph::Undirected> =
            Graph::from(self.graph.clone()).into_edge_type().into();
        let path = petgraph::algo::astar(
            &undirected,
            source_idx,
            |n| n == target_idx,
            |_| 1,
            |_| 0,
        );

        Ok(path.map(|(_, nodes)| nodes.into_iter().map(|idx| &self.graph[idx]).collect()))
    }

    /// Renders a node's own properties and incident edges as multi-line text (
    /// `render_node_context`).
    ///
    /// # Errors
    ///
    /// Returns an error if `entity_id` is not a known node.
    pub fn render_node_context(&self, entity_id: &str) -> Result<String> {
        let idx = self.lookup(entity_id)?;
        let entity = &self.graph[idx];

        let mut lines = vec![format!("{} ({})", entity.name, entity.kind.as_str())];
        for (key, value) in &entity.properties {
            lines.push(format!("  {key}: {value}"));
        }

        for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
            let target = &self.graph[edge.target()];
            lines.push(render_edge_line(edge.weight(), &target.name, true));
        }
        for edge in self.graph.edges_directed(idx, Direction::Incoming) {
            let source = &self.graph[edge.source()];
            lines.push(render_edge_line(edge.weight(), &source.name, false));
        }

        Ok(lines.join("\n"))
    }

    /// Renders the center node's own context plus, over its radius-`radius`
    /// ego subgraph, any neighbor-to-neighbor edge that carries evidence
    /// text. Edges touching the center node are covered by
    /// [`Self::render_node_context`] and not repeated here.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity_id` is not a known node.
    pub fn render_subgraph_context(&self, entity_id: &str, radius: usize) -> Result<String> {
        let idx = self.lookup(entity_id)?;
        let mut lines = vec![self.render_node_context(entity_id)?];

        let members = self.subgraph(entity_id, radius)?;
        let member_idxs: HashSet<NodeIndex> = members
            .iter()
            .filter_map(|e| self.index.get(&e.entity_id).copied())
            .collect();

        for &member_idx in &member_idxs {
            if member_idx == idx {
                continue;
            }
            for edge in self.graph.edges_directed(member_idx, Direction::Outgoing) {
                let other = edge.target();
                if other == idx || !member_idxs.contains(&other) || edge.weight().evidence_text.is_empty() {
                    continue;
                }
                let from = &self.graph[member_idx];
                let to = &self.graph[other];
                lines.push(render_neighbor_edge_line(edge.weight(), &from.name, &to.name));
            }
        }

        Ok(lines.join("\n"))
    }

    /// Aggregate statistics over the whole graph (`statistics`).
    #[must_use]
    pub fn statistics(&self) -> GraphStatistics {
        let mut nodes_by_kind = HashMap::new();
        for (_, entity) in self.graph.node_references() {
            *nodes_by_kind.entry(entity.kind.as_str().to_string()).or_insert(0) += 1;
        }

        let mut edges_by_kind = HashMap::new();
        for edge in self.graph.edge_references() {
            *edges_by_kind.entry(edge.weight().kind.as_str().to_string()).or_insert(0) += 1;
        }

        let n = self.graph.node_count();
        #[allow(clippy::cast_precision_loss)]
        let density = if n > 1 {
            (2.0 * self.graph.edge_count() as f64) / (n as f64 * (n as f64 - 1.0))
        } else {
            0.0
        };

        let undirected: Graph<Entity, Relation, petgraph::Undirected> =
            Graph::from(self.graph.clone()).into_edge_type();
        let connected_components = petgraph::algo::connected_components(&undirected);

        GraphStatistics {
            nodes_by_kind,
            edges_by_kind,
            density,
            connected_components,
        }
    }

    /// Modularity-maximizing community partition (
    /// `detect_communities`). Delegates to [`super::community::detect`].
    ///
    /// # Errors
    ///
    /// Never fails (the caller is expected to treat detection failure as
    /// non-fatal per , but the algorithm used here is total).
    pub fn detect_communities(&self) -> Result<Vec<super::community::Community>> {
        Ok(super::community::detect(&self.graph))
    }

    /// All entities, in node-index order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.graph.node_references().map(|(_, e)| e)
    }

    /// All relations, in edge-index order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.graph.edge_references().map(|e| e.weight())
    }

    /// Flattens the graph into a node/edge dump for persistence or external
    /// visualization tooling (`persist`).
    #[must_use]
    pub fn to_flat_dump(&self) -> FlatDump {
        FlatDump {
            nodes: self.entities().cloned().collect(),
            edges: self.relations().cloned().collect(),
        }
    }

    /// Rebuilds a graph from a flat dump (`load`).
    #[must_use]
    pub fn from_flat_dump(dump: FlatDump) -> Self {
        let mut graph = Self::new();
        for entity in dump.nodes {
            graph.add_entity(entity);
        }
        for relation in dump.edges {
            graph.add_relation(relation);
        }
        graph
    }
}

fn render_edge_line(relation: &Relation, other_name: &str, outgoing: bool) -> String {
    let arrow = if outgoing { "->" } else { "<-" };
    let mut line = format!("  {} {arrow} {other_name}", relation.kind.as_str());
    if let Some(plazo) = relation.properties.get("plazo") {
        line.push_str(&format!(" (plazo: {plazo})"));
    }
    if !relation.evidence_text.is_empty() {
        let snippet: String = relation.evidence_text.chars().take(80).collect();
        line.push_str(&format!(" [{snippet}]"));
    }
    line
}

fn render_neighbor_edge_line(relation: &Relation, from_name: &str, to_name: &str) -> String {
    let mut line = format!("  {from_name} -[{}]-> {to_name}", relation.kind.as_str());
    if let Some(plazo) = relation.properties.get("plazo") {
        line.push_str(&format!(" (plazo: {plazo})"));
    }
    let snippet: String = relation.evidence_text.chars().take(80).collect();
    line.push_str(&format!(" [{snippet}]"));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Entity;

    fn program(name: &str) -> Entity {
        Entity::new(name, EntityKind::Program, "doc.pdf")
    }

    #[test]
    fn add_relation_creates_placeholder_endpoints() {
        let mut graph = KnowledgeGraph::new();
        graph.add_relation(Relation::new("prog_mia", "prog_ceia", RelationKind::RequiresGraduationFrom, "ev"));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.get("prog_mia").unwrap().kind, EntityKind::Unknown);
    }

    #[test]
    fn subgraph_respects_radius() {
        let mut graph = KnowledgeGraph::new();
        let a = program("A");
        let b = program("B");
        let c = program("C");
        let (a_id, b_id, c_id) = (a.entity_id.clone(), b.entity_id.clone(), c.entity_id.clone());
        graph.add_entity(a);
        graph.add_entity(b);
        graph.add_entity(c);
        graph.add_relation(Relation::new(a_id.clone(), b_id.clone(), RelationKind::BelongsTo, "ev"));
        graph.add_relation(Relation::new(b_id.clone(), c_id.clone(), RelationKind::BelongsTo, "ev"));

        let radius1 = graph.subgraph(&a_id, 1).unwrap();
        assert_eq!(radius1.len(), 2);
        let radius2 = graph.subgraph(&a_id, 2).unwrap();
        assert_eq!(radius2.len(), 3);
    }

    #[test]
    fn shortest_path_none_when_disconnected() {
        let mut graph = KnowledgeGraph::new();
        graph.add_entity(program("A"));
        graph.add_entity(program("B"));
        let a_id = program("A").entity_id;
        let b_id = program("B").entity_id;
        assert!(graph.shortest_path(&a_id, &b_id).unwrap().is_none());
    }

    #[test]
    fn statistics_count_nodes_and_edges() {
        let mut graph = KnowledgeGraph::new();
        let a = program("A");
        let b = program("B");
        let (a_id, b_id) = (a.entity_id.clone(), b.entity_id.clone());
        graph.add_entity(a);
        graph.add_entity(b);
        graph.add_relation(Relation::new(a_id, b_id, RelationKind::BelongsTo, "ev"));
        let stats = graph.statistics();
        assert_eq!(stats.nodes_by_kind.get("program"), Some(&2));
        assert_eq!(stats.edges_by_kind.get("belongs_to"), Some(&1));
        assert_eq!(stats.connected_components, 1);
    }

    #[test]
    fn flat_dump_roundtrips() {
        let mut graph = KnowledgeGraph::new();
        let a = program("A");
        let b = program("B");
        let (a_id, b_id) = (a.entity_id.clone(), b.entity_id.clone());
        graph.add_entity(a);
        graph.add_entity(b);
        graph.add_relation(Relation::new(a_id, b_id, RelationKind::BelongsTo, "ev"));

        let dump = graph.to_flat_dump();
        let restored = KnowledgeGraph::from_flat_dump(dump);
        assert_eq!(restored.node_count(), graph.node_count());
        assert_eq!(restored.edge_count(), graph.edge_count());
    }

    #[test]
    fn render_node_context_includes_edges() {
        let mut graph = KnowledgeGraph::new();
        let a = program("A");
        let b = program("B");
        let (a_id, b_id) = (a.entity_id.clone(), b.entity_id.clone());
        graph.add_entity(a);
        graph.add_entity(b);
        graph.add_relation(Relation::new(a_id.clone(), b_id, RelationKind::BelongsTo, "ev"));
        let rendered = graph.render_node_context(&a_id).unwrap();
        assert!(rendered.contains("belongs_to"));
    }

    #[test]
    fn render_subgraph_context_includes_neighbor_to_neighbor_evidence() {
        let mut graph = KnowledgeGraph::new();
        let a = program("A");
        let b = program("B");
        let c = program("C");
        let (a_id, b_id, c_id) = (a.entity_id.clone(), b.entity_id.clone(), c.entity_id.clone());
        graph.add_entity(a);
        graph.add_entity(b);
        graph.add_entity(c);
        graph.add_relation(Relation::new(a_id.clone(), b_id.clone(), RelationKind::BelongsTo, "ev"));
        graph.add_relation(Relation::new(b_id, c_id, RelationKind::RequiresGraduationFrom, "el plan exige C"));

        let rendered = graph.render_subgraph_context(&a_id, 2).unwrap();
        assert!(rendered.contains("requires_graduation_from"));
        assert!(rendered.contains("el plan exige C"));
    }

    #[test]
    fn render_subgraph_context_drops_neighbor_edges_without_evidence() {
        let mut graph = KnowledgeGraph::new();
        let a = program("A");
        let b = program("B");
        let c = program("C");
        let (a_id, b_id, c_id) = (a.entity_id.clone(), b.entity_id.clone(), c.entity_id.clone());
        graph.add_entity(a);
        graph.add_entity(b);
        graph.add_entity(c);
        graph.add_relation(Relation::new(a_id.clone(), b_id.clone(), RelationKind::BelongsTo, "ev"));
        graph.add_relation(Relation::new(b_id, c_id, RelationKind::RequiresGraduationFrom, ""));

        let rendered = graph.render_subgraph_context(&a_id, 2).unwrap();
        assert!(!rendered.contains("requires_graduation_from"));
    }
}
