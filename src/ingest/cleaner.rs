//! Text Cleaner (C0, , supplemented). A pure, total normalization
//! pass: no `Result` return, always succeeds.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

fn blank_lines_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
    &RE
}

fn horizontal_whitespace_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
    &RE
}

fn hyphen_wrap_re() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-záéíóúñ])-\n([a-záéíóúñ])").unwrap());
    &RE
}

/// Normalizes raw extracted text: NFC, `CRLF`→`LF`, collapsed blank lines
/// and horizontal whitespace, stripped control characters, and
/// de-hyphenated line-wrapped words.
#[must_use]
pub fn clean(raw: &str) -> String {
    let normalized: String = raw.nfc().collect();
    let unified_newlines = normalized.replace("\r\n", "\n").replace('\r', "\n");

    let no_control: String = unified_newlines
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect();

    let dehyphenated = hyphen_wrap_re().replace_all(&no_control, "$1$2").into_owned();

    let collapsed_horizontal = dehyphenated
        .lines()
        .map(|line| horizontal_whitespace_re().replace_all(line, " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n");

    blank_lines_re().replace_all(&collapsed_horizontal, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_crlf_to_lf() {
        assert_eq!(clean("linea uno\r\nlinea dos"), "linea uno\nlinea dos");
    }

    #[test]
    fn collapses_excess_blank_lines() {
        let cleaned = clean("parrafo uno\n\n\n\n\nparrafo dos");
        assert_eq!(cleaned, "parrafo uno\n\nparrafo dos");
    }

    #[test]
    fn collapses_horizontal_whitespace() {
        assert_eq!(clean("palabra1    palabra2\tpalabra3"), "palabra1 palabra2 palabra3");
    }

    #[test]
    fn strips_form_feed_and_controls() {
        let cleaned = clean("antes\x0cdespues");
        assert!(!cleaned.contains('\u{c}'));
    }

    #[test]
    fn dehyphenates_line_wrapped_words() {
        assert_eq!(clean("la inscrip-\ncion cierra en marzo"), "la inscripcion cierra en marzo");
    }

    #[test]
    fn is_deterministic_and_total() {
        let input = "texto \r\n con\x0ccontrol\n\n\n\ny mas-\nculo";
        assert_eq!(clean(input), clean(input));
    }
}
