//! The [`Entity`] data model .

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Closed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An academic program (e.g. a master's degree).
    Program,
    /// An academic subject.
    Subject,
    /// A conferred title.
    Title,
    /// A requirement (e.g. a prerequisite condition).
    Requirement,
    /// A deadline.
    Deadline,
    /// A regulation article.
    Article,
    /// A contact point (office, email).
    Contact,
    /// An institution (department, school, university).
    Institution,
    /// A resolution document.
    Resolution,
    /// A delivery modality (e.g. in-person, virtual).
    Modality,
    /// An administrative process (e.g. "graduation defense").
    Process,
    /// Placeholder created automatically for an edge endpoint that doesn't
    /// otherwise resolve to a known entity (Relation invariants).
    Unknown,
}

impl EntityKind {
    /// Wire name used in `entity_id` derivation and rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Subject => "subject",
            Self::Title => "title",
            Self::Requirement => "requirement",
            Self::Deadline => "deadline",
            Self::Article => "article",
            Self::Contact => "contact",
            Self::Institution => "institution",
            Self::Resolution => "resolution",
            Self::Modality => "modality",
            Self::Process => "process",
            Self::Unknown => "unknown",
        }
    }
}

/// Derives the stable `entity_id` for a kind + canonical name pair (
/// "derived from kind+canonical name").
#[must_use]
pub fn derive_entity_id(kind: EntityKind, canonical_name: &str) -> String {
    let normalized = canonical_name.trim().to_lowercase();
    match kind {
        // Short, human-legible prefixes for the kinds the graph retriever
        // grounds queries against directly.
        EntityKind::Program => format!("prog_{}", slug(&normalized)),
        EntityKind::Subject => format!("mat_{}", slug(&normalized)),
        EntityKind::Process => format!("proc_{}", slug(&normalized)),
        _ => {
            let mut hasher = Sha256::new();
            hasher.update(kind.as_str().as_bytes());
            hasher.update([0x1f]);
            hasher.update(normalized.as_bytes());
            let digest = hasher.finalize();
            let hex: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
            format!("{}_{hex}", kind.as_str())
        }
    }
}

fn slug(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// A typed entity in the knowledge graph .
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id, derived from `(kind, canonical name)`.
    pub entity_id: String,
    /// Canonical display name.
    pub name: String,
    /// The entity's kind.
    pub kind: EntityKind,
    /// Lowercased alternate names this entity may be referred to by.
    pub aliases: Vec<String>,
    /// Kind-specific properties (e.g. `value`/`unit` for a deadline).
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Name of the document this entity was extracted from.
    pub source_document: String,
}

impl Entity {
    /// Creates a new entity, deriving its `entity_id` from `kind` and `name`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        source_document: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let entity_id = derive_entity_id(kind, &name);
        Self {
            entity_id,
            name,
            kind,
            aliases: Vec::new(),
            properties: HashMap::new(),
            source_document: source_document.into(),
        }
    }

    /// Adds a lowercased alias ("aliases are lowercased for match").
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Whether `needle` (already lowercased) matches this entity's name or any alias.
    #[must_use]
    pub fn matches_lower(&self, needle: &str) -> bool {
        self.name.to_lowercase() == needle || self.aliases.iter().any(|a| a == needle)
    }
}

/// Creates an `unknown`-kind placeholder entity for a relation endpoint that
/// doesn't resolve to a known entity (Relation invariants).
#[must_use]
pub fn placeholder(name: &str, source_document: &str) -> Entity {
    Entity::new(name, EntityKind::Unknown, source_document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_entity_id_has_prog_prefix() {
        let id = derive_entity_id(EntityKind::Program, "MIA");
        assert!(id.starts_with("prog_"));
    }

    #[test]
    fn entity_id_is_case_insensitive() {
        let a = derive_entity_id(EntityKind::Program, "MIA");
        let b = derive_entity_id(EntityKind::Program, "mia");
        assert_eq!(a, b);
    }

    #[test]
    fn entity_id_differs_by_kind() {
        let program = derive_entity_id(EntityKind::Program, "x");
        let subject = derive_entity_id(EntityKind::Subject, "x");
        assert_ne!(program, subject);
    }

    #[test]
    fn aliases_are_lowercased() {
        let e = Entity::new("MIA", EntityKind::Program, "doc").with_alias("Maestría en IA");
        assert_eq!(e.aliases[0], "maestría en ia");
    }

    #[test]
    fn matches_lower_checks_name_and_aliases() {
        let e = Entity::new("MIA", EntityKind::Program, "doc").with_alias("maestria en ia");
        assert!(e.matches_lower("mia"));
        assert!(e.matches_lower("maestria en ia"));
        assert!(!e.matches_lower("ceia"));
    }

    #[test]
    fn placeholder_entity_has_unknown_kind() {
        let e = placeholder("CEIA", "doc");
        assert_eq!(e.kind, EntityKind::Unknown);
    }
}
