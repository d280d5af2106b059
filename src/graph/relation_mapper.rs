//! Relation Mapper: a static table of domain axioms plus a
//! small set of regex axioms over free text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Entity, EntityKind, Relation, RelationKind};

/// Index from `(kind, uppercased name)` to `entity_id`, built once per call
/// so axioms can look up whether their endpoints are present without a full
/// scan each time.
struct EntityIndex<'a> {
    by_name: HashMap<(EntityKind, String), &'a Entity>,
}

impl<'a> EntityIndex<'a> {
    fn build(entities: &'a [Entity]) -> Self {
        let mut by_name = HashMap::new();
        for entity in entities {
            by_name.insert((entity.kind, entity.name.to_uppercase()), entity);
            for alias in &entity.aliases {
                by_name.entry((entity.kind, alias.to_uppercase())).or_insert(entity);
            }
        }
        Self { by_name }
    }

    fn find(&self, kind: EntityKind, name: &str) -> Option<&'a Entity> {
        self.by_name.get(&(kind, name.to_uppercase())).copied()
    }
}

/// Hard-coded domain edges. Each only fires when its endpoints
/// are present in the given entity set.
fn domain_axioms(index: &EntityIndex<'_>) -> Vec<Relation> {
    let mut relations = Vec::new();

    let mut link = |source: Option<&Entity>, target: Option<&Entity>, kind: RelationKind, evidence: &str| {
        if let (Some(s), Some(t)) = (source, target) {
            relations.push(Relation::new(s.entity_id.clone(), t.entity_id.clone(), kind, evidence));
        }
    };

    link(
        index.find(EntityKind::Program, "MIA"),
        index.find(EntityKind::Program, "CEIA"),
        RelationKind::RequiresGraduationFrom,
        "domain axiom: MIA requires_graduation_from CEIA",
    );
    link(
        index.find(EntityKind::Program, "MIAE"),
        index.find(EntityKind::Program, "CEIA"),
        RelationKind::CombinesWith,
        "domain axiom: MIAE combines_with CEIA",
    );
    link(
        index.find(EntityKind::Program, "MIAE"),
        index.find(EntityKind::Program, "CESE"),
        RelationKind::CombinesWith,
        "domain axiom: MIAE combines_with CESE",
    );
    link(
        index.find(EntityKind::Subject, "TTFA"),
        index.find(EntityKind::Subject, "GDP"),
        RelationKind::IsPrerequisiteOf,
        "domain axiom: TTFA is_prerequisite_of GdP",
    );
    link(
        index.find(EntityKind::Subject, "TTFB"),
        index.find(EntityKind::Subject, "TTFA"),
        RelationKind::IsPrerequisiteOf,
        "domain axiom: TTFB is_prerequisite_of TTFA",
    );
    link(
        index.find(EntityKind::Institution, "LSE"),
        index.find(EntityKind::Institution, "FIUBA"),
        RelationKind::BelongsTo,
        "domain axiom: LSE belongs_to FIUBA",
    );
    link(
        index.find(EntityKind::Institution, "FIUBA"),
        index.find(EntityKind::Institution, "UBA"),
        RelationKind::BelongsTo,
        "domain axiom: FIUBA belongs_to UBA",
    );

    for ((kind, _), entity) in &index.by_name {
        if *kind != EntityKind::Program {
            continue;
        }
        if let Some(title_name) = entity.properties.get("title") {
            let title = Entity::new(title_name.clone(), EntityKind::Title, entity.source_document.clone());
            relations.push(Relation::new(
                entity.entity_id.clone(),
                title.entity_id,
                RelationKind::GrantsTitle,
                "domain axiom: program grants_title",
            ));
        }
    }

    // Per-degree-level deadlines: every Deadline entity applies to every
    // known Program present in the same document.
    for entity in index.by_name.values() {
        if entity.kind != EntityKind::Deadline {
            continue;
        }
        for program in index.by_name.values().filter(|e| e.kind == EntityKind::Program) {
            relations.push(Relation::new(
                entity.entity_id.clone(),
                program.entity_id.clone(),
                RelationKind::HasDeadline,
                "domain axiom: deadline applies to co-occurring program",
            ));
        }
    }

    relations
}

fn prerequisite_phrase_re() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)para\s+([A-Za-zÀ-ÿ ]{2,40}?)[,.]?\s+es necesario\s+([A-Za-zÀ-ÿ ]{2,40})").unwrap());
    &RE
}

fn requisite_colon_re() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)requisito para\s+([A-Za-zÀ-ÿ ]{2,40}):\s*([A-Za-zÀ-ÿ ]{2,40})").unwrap());
    &RE
}

fn find_by_name_or_alias<'a>(entities: &'a [Entity], text: &str) -> Option<&'a Entity> {
    let lower = text.trim().to_lowercase();
    entities.iter().find(|e| e.matches_lower(&lower))
}

/// Regex axioms over free text: prerequisite phrasing and article→process
/// regulation links.
fn regex_axioms(text: &str, entities: &[Entity]) -> Vec<Relation> {
    let mut relations = Vec::new();

    for caps in prerequisite_phrase_re().captures_iter(text) {
        if let (Some(x), Some(y)) = (
            find_by_name_or_alias(entities, &caps[1]),
            find_by_name_or_alias(entities, &caps[2]),
        ) {
            relations.push(Relation::new(
                x.entity_id.clone(),
                y.entity_id.clone(),
                RelationKind::IsPrerequisiteOf,
                caps[0].to_string(),
            ));
        }
    }

    for caps in requisite_colon_re().captures_iter(text) {
        if let (Some(x), Some(y)) = (
            find_by_name_or_alias(entities, &caps[1]),
            find_by_name_or_alias(entities, &caps[2]),
        ) {
            relations.push(Relation::new(
                x.entity_id.clone(),
                y.entity_id.clone(),
                RelationKind::IsPrerequisiteOf,
                caps[0].to_string(),
            ));
        }
    }

    let lower = text.to_lowercase();
    for article in entities.iter().filter(|e| e.kind == EntityKind::Article) {
        let Some(content) = article.properties.get("content") else {
            continue;
        };
        let content_lower = content.to_lowercase();
        for process in entities.iter().filter(|e| e.kind == EntityKind::Process) {
            if content_lower.contains(&process.name.to_lowercase())
                || process.aliases.iter().any(|a| content_lower.contains(a))
            {
                relations.push(Relation::new(
                    article.entity_id.clone(),
                    process.entity_id.clone(),
                    RelationKind::Regulates,
                    article.name.clone(),
                ));
            }
        }
    }
    let _ = lower;

    relations
}

/// Maps a document's extracted entities and full cleaned text to relations,
/// deduplicated by `(source, target, kind)`.
#[must_use]
pub fn extract_relations(text: &str, entities: &[Entity]) -> Vec<Relation> {
    let index = EntityIndex::build(entities);
    let mut relations = domain_axioms(&index);
    relations.extend(regex_axioms(text, entities));

    let mut seen = std::collections::HashSet::new();
    relations.retain(|r| seen.insert(r.dedup_key()));
    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::entity_extractor::extract_entities;

    #[test]
    fn mia_requires_graduation_from_ceia() {
        let text = "La MIA requiere titulo previo de CEIA.";
        let entities = extract_entities(text, "doc.pdf");
        let relations = extract_relations(text, &entities);
        assert!(relations
            .iter()
            .any(|r| r.kind == RelationKind::RequiresGraduationFrom));
    }

    #[test]
    fn institution_chain_belongs_to() {
        let text = "El LSE pertenece a FIUBA y a la UBA.";
        let entities = extract_entities(text, "doc.pdf");
        let relations = extract_relations(text, &entities);
        assert!(relations.iter().filter(|r| r.kind == RelationKind::BelongsTo).count() >= 2);
    }

    #[test]
    fn dedup_by_source_target_kind() {
        let text = "La MIA requiere CEIA. La MIA requiere CEIA otra vez.";
        let entities = extract_entities(text, "doc.pdf");
        let relations = extract_relations(text, &entities);
        let mut seen = std::collections::HashSet::new();
        assert!(relations.iter().all(|r| seen.insert(r.dedup_key())));
    }

    #[test]
    fn article_regulates_process_when_content_mentions_it() {
        let text = "Art. 3 regula el proceso de inscripcion de los alumnos. Art. 4 otro tema.";
        let entities = extract_entities(text, "doc.pdf");
        let relations = extract_relations(text, &entities);
        assert!(relations.iter().any(|r| r.kind == RelationKind::Regulates));
    }
}
