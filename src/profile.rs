use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Pattern set and knobs for one document family. Immutable once built;
/// every pipeline stage receives it by reference.
pub struct DocumentProfile {
    pub doc_type: &'static str,
    /// Ordered TOC line patterns, tried first-match-wins.
    pub toc_patterns: Vec<Regex>,
    /// Pattern → replacement pairs applied in order to extracted content.
    pub cleanup_rules: Vec<(Regex, &'static str)>,
    /// Ordered tag → keywords mapping for title classification.
    pub tag_map: Vec<(&'static str, &'static [&'static str])>,
    /// Max pages scanned from the front of the document for TOC lines.
    pub toc_scan_pages: usize,
    pub max_file_size_mb: u64,
}

pub const PROFILE_KEYS: &[(&str, &str)] = &[
    ("usb_pd", "USB Power Delivery specifications"),
    ("generic", "Generic technical specifications"),
    ("ieee", "IEEE standards documents"),
];

/// Look up the profile for a document-type key. Unknown keys degrade to the
/// generic profile rather than failing.
pub fn profile_for(doc_type: &str) -> DocumentProfile {
    match doc_type {
        "usb_pd" => usb_pd(),
        "generic" => generic(),
        "ieee" => ieee(),
        other => {
            warn!("unknown document type '{}', using generic profile", other);
            generic()
        }
    }
}

fn toc_pattern(pat: &str) -> Regex {
    RegexBuilder::new(pat)
        .case_insensitive(true)
        .build()
        .expect("invalid TOC pattern")
}

fn cleanup_rule(pat: &str, replacement: &'static str) -> (Regex, &'static str) {
    let re = RegexBuilder::new(pat)
        .multi_line(true)
        .build()
        .expect("invalid cleanup pattern");
    (re, replacement)
}

fn usb_pd() -> DocumentProfile {
    DocumentProfile {
        doc_type: "usb_pd",
        toc_patterns: vec![
            // Dotted leader: "2.1.2 Power Delivery Contract Negotiation .... 53"
            toc_pattern(r"^(\d+(?:\.\d+)*)\s+(.*?)\s*\.+\s*(\d+)$"),
            // Space-only separator: "2.1.2 Power Delivery Contract Negotiation 53"
            toc_pattern(r"^(\d+(?:\.\d+)*)\s+(.*?)\s+(\d+)$"),
            // Parenthesized title: "2.1.2 (Power Delivery Contract Negotiation) 53"
            toc_pattern(r"^(\d+(?:\.\d+)*)\s*\(?(.*?)\)?\s*\.+\s*(\d+)$"),
            toc_pattern(r"^Chapter\s+(\d+)\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^Section\s+(\d+(?:\.\d+)*)\s+(.*?)\s*\.+\s*(\d+)$"),
            // Letter ids fail numeric validation and are skipped downstream.
            toc_pattern(r"^Annex\s+([A-Z])\s+(.*?)\s*\.+\s*(\d+)$"),
        ],
        cleanup_rules: vec![
            cleanup_rule(r"^\s*\d+\s*$", ""),
            cleanup_rule(r"^\s*USB.*?Specification.*?\s*$", ""),
            cleanup_rule(r"^\s*Page\s+\d+\s*$", ""),
            cleanup_rule(r"\n\s*\n\s*\n", "\n\n"),
        ],
        tag_map: vec![
            ("power_management", &["power", "voltage", "current", "watt"]),
            ("negotiation", &["negotiation", "contract", "agreement"]),
            ("communication", &["communication", "protocol", "message"]),
            ("state_machine", &["state", "machine", "transition"]),
            ("hardware", &["cable", "connector", "plug", "receptacle"]),
            ("compatibility", &["compatibility", "revision", "version"]),
            ("overview", &["overview", "introduction", "background"]),
            ("reference", &["table", "figure", "diagram"]),
            ("safety", &["safety", "protection", "fault"]),
        ],
        toc_scan_pages: 15,
        max_file_size_mb: 100,
    }
}

fn generic() -> DocumentProfile {
    DocumentProfile {
        doc_type: "generic",
        toc_patterns: vec![
            toc_pattern(r"^(\d+(?:\.\d+)*)\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^(\d+(?:\.\d+)*)\s+(.*?)\s+(\d+)$"),
            toc_pattern(r"^Chapter\s+(\d+)\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^Section\s+(\d+(?:\.\d+)*)\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^([A-Z])\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^([IVX]+)\.\s+(.*?)\s*\.+\s*(\d+)$"),
        ],
        cleanup_rules: vec![
            cleanup_rule(r"^\s*\d+\s*$", ""),
            cleanup_rule(r"^\s*[A-Z][a-z]+\s+\d+\s*$", ""),
            cleanup_rule(r"\n\s*\n\s*\n", "\n\n"),
        ],
        tag_map: vec![
            ("overview", &["overview", "introduction", "background"]),
            ("specification", &["specification"]),
            ("requirement", &["requirement"]),
            ("implementation", &["implementation"]),
            ("testing", &["testing"]),
            ("validation", &["validation"]),
            ("reference", &["reference"]),
            ("appendix", &["appendix", "annex"]),
        ],
        toc_scan_pages: 10,
        max_file_size_mb: 50,
    }
}

fn ieee() -> DocumentProfile {
    DocumentProfile {
        doc_type: "ieee",
        toc_patterns: vec![
            toc_pattern(r"^(\d+(?:\.\d+)*)\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^Clause\s+(\d+)\s+(.*?)\s*\.+\s*(\d+)$"),
            toc_pattern(r"^Annex\s+([A-Z])\s+(.*?)\s*\.+\s*(\d+)$"),
        ],
        cleanup_rules: vec![
            cleanup_rule(r"^\s*\d+\s*$", ""),
            cleanup_rule(r"^\s*IEEE\s+Std\s+\d+.*?\s*$", ""),
            cleanup_rule(r"^\s*Copyright\s+.*?\s*$", ""),
            cleanup_rule(r"\n\s*\n\s*\n", "\n\n"),
        ],
        tag_map: vec![
            ("scope", &["scope"]),
            ("normative", &["normative"]),
            ("informative", &["informative"]),
            ("reference", &["reference"]),
            ("definition", &["definition"]),
            ("symbols", &["symbols"]),
            ("abbreviations", &["abbreviations"]),
            ("conformance", &["conformance"]),
            ("testing", &["test"]),
            ("measurement", &["measurement"]),
            ("safety", &["safety"]),
            ("environmental", &["environmental"]),
        ],
        toc_scan_pages: 20,
        max_file_size_mb: 200,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_resolve() {
        for (key, _) in PROFILE_KEYS {
            assert_eq!(profile_for(key).doc_type, *key);
        }
    }

    #[test]
    fn unknown_key_falls_back_to_generic() {
        let profile = profile_for("din_en_iso");
        assert_eq!(profile.doc_type, "generic");
    }

    #[test]
    fn profiles_carry_patterns_and_tags() {
        for (key, _) in PROFILE_KEYS {
            let p = profile_for(key);
            assert!(!p.toc_patterns.is_empty());
            assert!(!p.tag_map.is_empty());
            assert!(p.toc_scan_pages > 0);
        }
    }
}
