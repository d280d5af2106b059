//! Normalized edit-distance similarity used as a grounding fallback when the
//! graph retriever finds no exact entity match.

/// Ratio of the longer string's length minus edit distance, over the longer
/// string's length — `1.0` for identical strings, `0.0` for maximally
/// different ones. Exact substring containment short-circuits to `0.8`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }
    let distance = levenshtein(&a, &b);
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        1.0 - (distance as f32 / longer as f32)
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Best fuzzy match among `candidates` (name/alias strings mapped to an
/// owning key), filtered to similarity `> 0.5`, sorted
/// descending, truncated to `limit`.
#[must_use]
pub fn top_matches<'a>(
    query: &str,
    candidates: impl Iterator<Item = (&'a str, &'a str)>,
    limit: usize,
) -> Vec<(&'a str, f32)> {
    let mut scored: Vec<(&str, f32)> = candidates
        .map(|(key, text)| (key, similarity(query, text)))
        .filter(|&(_, score)| score > 0.5)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored.truncate(limit);
    scored
}
