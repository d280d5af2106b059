//! Entity Extractor. Pure rule-based: regex and dictionary
//! lookups only, never a language model.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Entity, EntityKind};

/// `(code, full Spanish name)` pairs for known programs (
/// "regex per known code").
const KNOWN_PROGRAMS: &[(&str, &str)] = &[
    ("MIA", "Maestría en Inteligencia Artificial"),
    ("MIAE", "Maestría en Inteligencia Artificial Empresarial"),
    ("CEIA", "Carrera de Especialización en Inteligencia Artificial"),
    ("CESE", "Carrera de Especialización en Sistemas Embebidos"),
];

/// `(code, full Spanish name)` pairs for known subjects/requirement courses.
const KNOWN_SUBJECTS: &[(&str, &str)] = &[
    ("TTFA", "Trabajo Final A"),
    ("TTFB", "Trabajo Final B"),
    ("GDP", "Gestión de Proyectos"),
    ("GTI", "Gestión de Tecnología de la Información"),
];

/// Canonical process name → keyword list. The first matching keyword emits
/// the process entity.
const PROCESS_KEYWORDS: &[(&str, &[&str])] = &[
    ("inscripcion", &["inscripcion", "inscribirse", "matricula"]),
    ("graduacion", &["graduacion", "egreso", "defensa de tesis", "titulacion"]),
    ("trabajo final", &["trabajo final", "tesis", "ttf"]),
];

/// Closed dictionary of institution aliases.
const INSTITUTIONS: &[(&str, &[&str])] = &[
    ("LSE", &["lse", "laboratorio de sistemas embebidos"]),
    ("FIUBA", &["fiuba", "facultad de ingenieria"]),
    ("UBA", &["uba", "universidad de buenos aires"]),
];

fn deadline_re() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(bimestres?|meses?|a[ñn]os?)\s*(corridos?)?").unwrap());
    &RE
}

fn email_re() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
    &RE
}

fn article_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Art\.?\s*(\d+)").unwrap());
    &RE
}

fn code_pattern(code: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(code))).unwrap()
}

fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = start.saturating_sub(radius);
    let to = (end + radius).min(text.len());
    let mut from = from;
    let mut to = to;
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].trim().to_string()
}

/// Extracts every entity mentioned in `text`, in stable emission order.
/// `source_document` is stamped on every emitted entity.
#[must_use]
pub fn extract_entities(text: &str, source_document: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut push = |entity: Entity, seen: &mut std::collections::HashSet<String>| {
        if seen.insert(entity.entity_id.clone()) {
            entities.push(entity);
        }
    };

    for &(code, full_name) in KNOWN_PROGRAMS {
        if code_pattern(code).is_match(text) {
            let entity = Entity::new(code, EntityKind::Program, source_document)
                .with_alias(full_name)
                .with_property("title", format!("título de {full_name}"));
            push(entity, &mut seen);
        }
    }

    for &(code, full_name) in KNOWN_SUBJECTS {
        if code_pattern(code).is_match(text) {
            let entity = Entity::new(code, EntityKind::Subject, source_document).with_alias(full_name);
            push(entity, &mut seen);
        }
    }

    for m in deadline_re().find_iter(text) {
        let caps = deadline_re().captures(m.as_str()).unwrap();
        let value = &caps[1];
        let unit = &caps[2];
        let window = context_window(text, m.start(), m.end(), 50);
        let entity = Entity::new(m.as_str(), EntityKind::Deadline, source_document)
            .with_property("value", value)
            .with_property("unit", unit.to_lowercase())
            .with_property("context", window);
        push(entity, &mut seen);
    }

    for m in email_re().find_iter(text) {
        let entity = Entity::new(m.as_str(), EntityKind::Contact, source_document);
        push(entity, &mut seen);
    }

    let article_matches: Vec<_> = article_re().find_iter(text).collect();
    for (i, m) in article_matches.iter().enumerate() {
        let content_end = article_matches
            .get(i + 1)
            .map_or(text.len(), |next| next.start());
        let content_end = content_end.min(m.start() + 500).min(text.len());
        let content = context_window(text, m.start(), content_end, 0);
        let entity = Entity::new(m.as_str(), EntityKind::Article, source_document)
            .with_property("content", content);
        push(entity, &mut seen);
    }

    let lower = text.to_lowercase();
    for &(name, keywords) in PROCESS_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            let entity = Entity::new(name, EntityKind::Process, source_document);
            push(entity, &mut seen);
        }
    }

    for &(name, aliases) in INSTITUTIONS {
        if aliases.iter().any(|alias| lower.contains(alias)) {
            let mut entity = Entity::new(name, EntityKind::Institution, source_document);
            for alias in aliases {
                entity = entity.with_alias(*alias);
            }
            push(entity, &mut seen);
        }
    }

    entities
}
