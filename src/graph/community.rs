//! Community detection (`detect_communities`): greedy modularity
//! maximization via Louvain-style local node moving (single level — this
//! crate has no dependency offering full multilevel Louvain, so the local
//! moving phase alone stands in for it, same as any other pure-Rust
//! implementation would).

use std::collections::HashMap;

use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;

use crate::core::{Entity, Relation};

/// One detected community: its members and a textual summary.
#[derive(Debug, Clone)]
pub struct Community {
    /// Member entity ids.
    pub members: Vec<String>,
    /// Grouped-by-kind, intra-community-edges summary.
    pub summary: String,
}

/// Runs greedy modularity local-moving over the graph's undirected
/// projection and returns one [`Community`] per resulting partition, each
/// with `members` and a rendered `summary`.
#[must_use]
pub fn detect(graph: &StableDiGraph<Entity, Relation>) -> Vec<Community> {
    let node_indices: Vec<_> = graph.node_indices().collect();
    if node_indices.is_empty() {
        return Vec::new();
    }

    let m: f64 = graph.edge_count().max(1) as f64;
    let degree: HashMap<_, f64> = node_indices
        .iter()
        .map(|&n| {
            let d = graph.edges(n).count() + graph.edges_directed(n, petgraph::Direction::Incoming).count();
            #[allow(clippy::cast_precision_loss)]
            (n, d as f64)
        })
        .collect();

    let mut community_of: HashMap<_, usize> = node_indices.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    let mut improved = true;
    let mut iterations = 0;
    while improved && iterations < 20 {
        improved = false;
        iterations += 1;
        for &node in &node_indices {
            let current = community_of[&node];
            let mut neighbor_communities: HashMap<usize, f64> = HashMap::new();
            for edge in graph
                .edges(node)
                .chain(graph.edges_directed(node, petgraph::Direction::Incoming))
            {
                let other = if edge.source() == node { edge.target() } else { edge.source() };
                if other == node {
                    continue;
                }
                *neighbor_communities.entry(community_of[&other]).or_insert(0.0) += 1.0;
            }

            let mut best_community = current;
            let mut best_gain = 0.0f64;
            for (&candidate, &shared_edges) in &neighbor_communities {
                if candidate == current {
                    continue;
                }
                let degree_sum: f64 = node_indices
                    .iter()
                    .filter(|n| community_of[*n] == candidate)
                    .map(|n| degree[n])
                    .sum();
                let gain = shared_edges / m - (degree[&node] * degree_sum) / (2.0 * m * m);
                if gain > best_gain {
                    best_gain = gain;
                    best_community = candidate;
                }
            }

            if best_community != current {
                community_of.insert(node, best_community);
                improved = true;
            }
        }
    }

    let mut grouped: HashMap<usize, Vec<_>> = HashMap::new();
    for (&node, &community) in &community_of {
        grouped.entry(community).or_default().push(node);
    }

    grouped
        .into_values()
        .map(|members| {
            let entities: Vec<&Entity> = members.iter().map(|&idx| &graph[idx]).collect();
            let member_ids: Vec<String> = entities.iter().map(|e| e.entity_id.clone()).collect();
            let member_set: std::collections::HashSet<_> = members.iter().copied().collect();

            let mut by_kind: HashMap<&'static str, Vec<&str>> = HashMap::new();
            for entity in &entities {
                by_kind.entry(entity.kind.as_str()).or_default().push(&entity.name);
            }

            let mut summary = String::new();
            let mut kinds: Vec<_> = by_kind.keys().copied().collect();
            kinds.sort_unstable();
            for kind in kinds {
                summary.push_str(&format!("{kind}: {}\n", by_kind[kind].join(", ")));
            }

            let mut intra_edges = Vec::new();
            for &node in &members {
                for edge in graph.edges(node) {
                    if member_set.contains(&edge.target()) {
                        intra_edges.push(format!(
                            "{} {} {}",
                            graph[node].name,
                            edge.weight().kind.as_str(),
                            graph[edge.target()].name
                        ));
                    }
                }
            }
            intra_edges.truncate(10);
            if !intra_edges.is_empty() {
                summary.push_str(&format!("edges: {}", intra_edges.join("; ")));
            }

            Community {
                members: member_ids,
                summary,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Entity, EntityKind, Relation, RelationKind};

    fn build_two_clusters() -> StableDiGraph<Entity, Relation> {
        let mut g = StableDiGraph::new();
        let a = g.add_node(Entity::new("A", EntityKind::Program, "doc"));
        let b = g.add_node(Entity::new("B", EntityKind::Program, "doc"));
        let c = g.add_node(Entity::new("C", EntityKind::Program, "doc"));
        let d = g.add_node(Entity::new("D", EntityKind::Program, "doc"));
        g.add_edge(a, b, Relation::new("a", "b", RelationKind::BelongsTo, "ev"));
        g.add_edge(c, d, Relation::new("c", "d", RelationKind::BelongsTo, "ev"));
        g
    }

    #[test]
    fn empty_graph_yields_no_communities() {
        let g: StableDiGraph<Entity, Relation> = StableDiGraph::new();
        assert!(detect(&g).is_empty());
    }

    #[test]
    fn disjoint_clusters_separate() {
        let g = build_two_clusters();
        let communities = detect(&g);
        assert!(communities.len() >= 2);
    }

    #[test]
    fn communities_cover_all_nodes() {
        let g = build_two_clusters();
        let communities = detect(&g);
        let total: usize = communities.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, g.node_count());
    }
}
