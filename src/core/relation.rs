//! The [`Relation`] data model .

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Closed set of relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// `X requires_graduation_from Y`.
    RequiresGraduationFrom,
    /// `X combines_with Y`.
    CombinesWith,
    /// `X belongs_to Y`.
    BelongsTo,
    /// `X grants_title Y`.
    GrantsTitle,
    /// `X is_prerequisite_of Y`.
    IsPrerequisiteOf,
    /// `X regulates Y`.
    Regulates,
    /// `X has_deadline Y`.
    HasDeadline,
    /// `X applies_to Y`.
    AppliesTo,
    /// `X contact_for Y`.
    ContactFor,
    /// `X documented_in Y`.
    DocumentedIn,
}

impl RelationKind {
    /// Wire name used for rendering (`<kind> -> <target>`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiresGraduationFrom => "requires_graduation_from",
            Self::CombinesWith => "combines_with",
            Self::BelongsTo => "belongs_to",
            Self::GrantsTitle => "grants_title",
            Self::IsPrerequisiteOf => "is_prerequisite_of",
            Self::Regulates => "regulates",
            Self::HasDeadline => "has_deadline",
            Self::AppliesTo => "applies_to",
            Self::ContactFor => "contact_for",
            Self::DocumentedIn => "documented_in",
        }
    }
}

/// A typed directed edge between two entities .
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Source entity id.
    pub source_id: String,
    /// Target entity id.
    pub target_id: String,
    /// The relation's kind.
    pub kind: RelationKind,
    /// Kind-specific properties (e.g. `plazo` for a deadline link).
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// The source span or domain-axiom string this edge is grounded on.
    pub evidence_text: String,
}

impl Relation {
    /// Creates a new relation.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        kind: RelationKind,
        evidence_text: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind,
            properties: HashMap::new(),
            evidence_text: evidence_text.into(),
        }
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The `(source, target, kind)` tuple used for deduplication.
    #[must_use]
    pub fn dedup_key(&self) -> (String, String, RelationKind) {
        (self.source_id.clone(), self.target_id.clone(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_distinguishes_kind() {
        let a = Relation::new("a", "b", RelationKind::BelongsTo, "ev");
        let b = Relation::new("a", "b", RelationKind::Regulates, "ev");
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn dedup_key_equal_for_identical_edges() {
        let a = Relation::new("a", "b", RelationKind::BelongsTo, "ev1");
        let b = Relation::new("a", "b", RelationKind::BelongsTo, "ev2");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn relation_kind_as_str_matches_spec_names() {
        assert_eq!(
            RelationKind::RequiresGraduationFrom.as_str(),
            "requires_graduation_from"
        );
        assert_eq!(RelationKind::GrantsTitle.as_str(), "grants_title");
    }
}
