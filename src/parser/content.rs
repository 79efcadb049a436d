use regex::Regex;
use serde::{Deserialize, Serialize};

use super::toc::SectionHeading;
use crate::pdf::PageSource;

/// A heading together with the text of the page span it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    #[serde(flatten)]
    pub heading: SectionHeading,
    pub content: String,
}

/// Concatenate the text of every page in `[start_page, end_page]` (1-based,
/// clamped to the document) and apply the profile's cleanup rules.
///
/// `None` means no page in the span produced any text, which drops the
/// section and surfaces as MISSING in the validation report. `Some("")` is a
/// content-free section whose pages had text the cleanup rules removed; that
/// record is kept.
pub fn extract_section_text(
    source: &dyn PageSource,
    start_page: u32,
    end_page: u32,
    rules: &[(Regex, &str)],
) -> Option<String> {
    let start = start_page.saturating_sub(1) as usize;
    let end = (end_page as usize).min(source.page_count());

    let mut parts = Vec::new();
    for page_index in start..end {
        if let Some(text) = source.page_text(page_index) {
            parts.push(text);
        }
    }
    if parts.is_empty() {
        return None;
    }

    let mut text = parts.join("\n");
    for (pattern, replacement) in rules {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    Some(text)
}

// ── Tests ──
