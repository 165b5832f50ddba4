//! Text patterns that indicate a fillable field.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Filled-square glyph used as a printed checkbox.
pub const CHECKBOX_GLYPH: char = '\u{25A0}';

/// Words that mark a text block as a form section heading.
pub const SECTION_INDICATORS: &[&str] = &[
    "name",
    "address",
    "phone",
    "email",
    "date",
    "signature",
    "client",
    "account",
    "number",
    "institution",
    "contact",
    "information",
    "authorization",
    "transfer",
    "instructions",
];

pub const SIGNATURE_KEYWORDS: &[&str] = &["signature", "sign here", "signed", "signer"];

/// First-page markers of well-known forms, checked in order.
pub const DOCUMENT_TYPES: &[(&str, &str)] = &[
    ("w-9", "IRS Form W-9"),
    ("autorisation de transfert", "Fidelity Transfer Authorization Form"),
    ("1099", "IRS Form 1099"),
    ("fidelity", "Fidelity Form"),
];

/// Runs of underscores, dots or dashes that stand in for a blank.
pub fn underline_patterns() -> &'static [Regex] {
    static RE_UNDERLINES: OnceLock<Vec<Regex>> = OnceLock::new();
    RE_UNDERLINES.get_or_init(|| {
        [r"_{3,}", r"\.{5,}", r"-{5,}"]
            .iter()
            .map(|p| Regex::new(p).unwrap())
            .collect()
    })
}

pub fn date_pattern() -> &'static Regex {
    static RE_DATE: OnceLock<Regex> = OnceLock::new();
    RE_DATE.get_or_init(|| {
        Regex::new(r"(?i)\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|_{2}/_{2}/_{4}|mm/dd/yyyy|dd/mm/yyyy")
            .unwrap()
    })
}

/// `[ ]`, `[]`, `( )` or `()`.
pub fn empty_bracket_pattern() -> &'static Regex {
    static RE_BRACKET: OnceLock<Regex> = OnceLock::new();
    RE_BRACKET.get_or_init(|| Regex::new(r"\[\s*\]|\(\s*\)").unwrap())
}

/// NFKC-normalized, trimmed span text. Folds full-width colons and
/// compatibility glyphs onto their ASCII forms.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().trim().to_string()
}

/// A label is any text ending with a colon.
pub fn is_label(text: &str) -> bool {
    text.ends_with(':')
}

/// `"First Name:"` -> `"text_field_after_first_name"`.
pub fn label_field_name(label: &str) -> String {
    let stem = label.replace(':', "").trim().to_lowercase().replace(' ', "_");
    format!("text_field_after_{stem}")
}

pub fn is_section_heading(text: &str) -> bool {
    let lower = text.to_lowercase();
    SECTION_INDICATORS.iter().any(|k| lower.contains(k))
}

pub fn has_signature_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    SIGNATURE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// The label of the first [`DOCUMENT_TYPES`] marker found in `text`.
pub fn document_type(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    DOCUMENT_TYPES
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underline_runs() {
        let text = "Name: ____ Date: ..... Ref: ----- short: __ ....";
        let found: Vec<&str> = underline_patterns()
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.as_str()))
            .collect();
        assert_eq!(found, vec!["____", ".....", "-----"]);
    }

    #[test]
    fn date_formats() {
        for s in ["12/31/2024", "1-2-24", "3.4.2025", "__/__/____", "MM/DD/YYYY", "dd/mm/yyyy"] {
            assert!(date_pattern().is_match(s), "{s}");
        }
        assert!(!date_pattern().is_match("Date:"));
    }

    #[test]
    fn brackets() {
        assert!(empty_bracket_pattern().is_match("[ ] Yes"));
        assert!(empty_bracket_pattern().is_match("()"));
        assert!(!empty_bracket_pattern().is_match("[x]"));
    }

    #[test]
    fn labels_and_names() {
        assert!(is_label("Full Name:"));
        assert!(!is_label("Name: Jane"));
        assert_eq!(label_field_name("First Name:"), "text_field_after_first_name");
        assert_eq!(normalize("  Name\u{FF1A} "), "Name:");
    }

    #[test]
    fn keywords() {
        assert!(is_section_heading("CLIENT INFORMATION"));
        assert!(!is_section_heading("Terms and conditions"));
        assert!(has_signature_keyword("Applicant Signature"));
        assert!(has_signature_keyword("Sign here"));
        assert!(!has_signature_keyword("Design"));
    }

    #[test]
    fn known_forms_are_recognized() {
        assert_eq!(document_type("Form W-9 (Rev. March 2024)"), Some("IRS Form W-9"));
        assert_eq!(document_type("Form 1099-INT"), Some("IRS Form 1099"));
        assert_eq!(
            document_type("Autorisation de transfert\nFidelity"),
            Some("Fidelity Transfer Authorization Form")
        );
        assert_eq!(document_type("FIDELITY INVESTMENTS"), Some("Fidelity Form"));
        assert_eq!(document_type("Rental application"), None);
    }
}
