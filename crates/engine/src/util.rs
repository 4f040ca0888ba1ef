//! Internal helpers for label normalization.
//!
//! These utilities are **not** part of the public API (except
//! `normalize_spaces`, used when parsing user amounts). They centralize label
//! handling so breakdown keys are built consistently.

use unicode_normalization::UnicodeNormalization;

/// Replaces the non-breaking space variants browsers emit in formatted
/// numbers (U+00A0, U+202F, U+2007) with a plain space.
pub fn normalize_spaces(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '\u{a0}' | '\u{202f}' | '\u{2007}' => ' ',
            other => other,
        })
        .collect()
}

/// NFC-normalize, trim and collapse inner whitespace.
///
/// Returns `None` for blank input.
pub(crate) fn normalize_label(input: &str) -> Option<String> {
    let composed: String = normalize_spaces(input).nfc().collect();
    let mut out = String::new();
    for token in composed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_trimmed_and_collapsed() {
        assert_eq!(normalize_label("  Frais   de\tgarde "), Some("Frais de garde".to_string()));
        assert_eq!(normalize_label(" \u{a0} "), None);
    }

    #[test]
    fn decomposed_accents_compose() {
        assert_eq!(normalize_label("E\u{301}nergie"), normalize_label("Énergie"));
    }
}
