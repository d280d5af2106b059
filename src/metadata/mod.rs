//! Metadata Tagger: merges registry data, regex-detected
//! references, and (for QA chunks) nothing else into each chunk's metadata.
//! Deterministic; never calls a language model.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::DocumentRegistry;
use crate::core::{Chunk, ChunkMetadata};

/// Fixed keyword dictionary mapping a topic to the glob-ish stems that
/// indicate it (example: `enrollment → {inscrib*, matric*, admisi*}`).
fn topic_dictionary() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static DICT: LazyLock<HashMap<&'static str, &'static [&'static str]>> = LazyLock::new(|| {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("enrollment", &["inscrib", "matric", "admisi"]);
        m.insert("graduation", &["egres", "titul", "defensa", "tesis"]);
        m.insert("deadlines", &["plazo", "vencimiento", "bimestre"]);
        m.insert("curriculum", &["correlativ", "plan de estudio", "materia"]);
        m
    });
    &DICT
}

fn email_re() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
    &RE
}

fn resolution_id_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bres(?:olucion)?\.?\s*n?°?\s*\d+[/-]\d+\b").unwrap());
    &RE
}

/// Known program codes consulted for the "mentioned programs" regex pass.
/// Kept small and explicit; a full deployment would source this from the
/// same registry consulted in step (a).
const KNOWN_PROGRAM_CODES: &[&str] = &["MIA", "MIAE", "CEIA", "CESE", "TTFA", "TTFB", "GDP", "GTI"];

/// Detects topics whose keyword stems appear (case-insensitively) in `text`.
fn detect_topics(text_lower: &str) -> Vec<String> {
    topic_dictionary()
        .iter()
        .filter(|(_, stems)| stems.iter().any(|stem| text_lower.contains(stem)))
        .map(|(topic, _)| (*topic).to_string())
        .collect()
}

/// Detects known program codes mentioned in the chunk's own text.
fn detect_mentioned_programs(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    KNOWN_PROGRAM_CODES
        .iter()
        .filter(|code| {
            let pattern = format!(r"\b{code}\b");
            Regex::new(&pattern).is_ok_and(|re| re.is_match(&upper))
        })
        .map(|code| (*code).to_string())
        .collect()
}

fn detect_emails(text: &str) -> Vec<String> {
    email_re().find_iter(text).map(|m| m.as_str().to_string()).collect()
}

fn detect_resolution_ids(text: &str) -> Vec<String> {
    resolution_id_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Merges registry data and regex-detected references into `chunk`'s
/// metadata, in place. Preserves any metadata the chunking strategy already
/// set (e.g. `question` for QA chunks).
pub fn tag_chunk(chunk: &mut Chunk, registry: &DocumentRegistry) {
    let text_lower = chunk.text.to_lowercase();

    let mut topics = detect_topics(&text_lower);
    let mut program_codes = Vec::new();

    if let Some(entry) = registry.get(&chunk.document_name) {
        topics.extend(entry.topics.iter().cloned());
        program_codes.extend(entry.program_codes.iter().cloned());
    }

    topics.sort();
    topics.dedup();
    program_codes.sort();
    program_codes.dedup();

    let mut mentioned_programs = detect_mentioned_programs(&chunk.text);
    mentioned_programs.extend(detect_resolution_ids(&chunk.text));
    mentioned_programs.sort();
    mentioned_programs.dedup();

    let mut contact_emails = detect_emails(&chunk.text);
    contact_emails.sort();
    contact_emails.dedup();

    chunk.metadata.topics = topics;
    chunk.metadata.program_codes = program_codes;
    chunk.metadata.mentioned_programs = mentioned_programs;
    chunk.metadata.contact_emails = contact_emails;
}

/// Tags every chunk in `chunks` in place.
pub fn tag_chunks(chunks: &mut [Chunk], registry: &DocumentRegistry) {
    for chunk in chunks {
        tag_chunk(chunk, registry);
    }
}
