//! Text normalization for keyword matching and whitespace cleanup for
//! extracted fields.

/// Lower-case text for substring matching.
///
/// Only Unicode simple lower-casing is applied. Diacritics and punctuation are
/// kept because keyword sets match on literal substrings of mixed-language
/// text.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Build the single scan target for a title and description.
pub fn scan_target(title: &str, description: &str) -> String {
    let mut joined = String::with_capacity(title.len() + description.len() + 1);
    joined.push_str(title);
    joined.push(' ');
    joined.push_str(description);
    normalize(&joined)
}

/// Collapse runs of whitespace (including non-breaking spaces) into single
/// spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_mixed_language() {
        assert_eq!(normalize("UI/UX Дизайнер"), "ui/ux дизайнер");
    }

    #[test]
    fn test_normalize_keeps_diacritics() {
        assert_eq!(normalize("Créateur Ёлка"), "créateur ёлка");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for sample in ["Product Designer", "ГРАФИЧЕСКИЙ дизайн", "İstanbul", "ß Straße", ""] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_scan_target_joins_with_space() {
        assert_eq!(scan_target("UI", "Figma"), "ui figma");
        // No accidental word fusion across the boundary.
        assert!(!scan_target("web", "design").contains("webdesign"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\t b\u{a0}\u{a0}c  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
