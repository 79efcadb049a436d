use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::tags::classify_tags;
use crate::profile::DocumentProfile;

static LEADING_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-–—]\s*").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One TOC entry, keyed by its dotted numeric section id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionHeading {
    pub doc_title: String,
    pub section_id: String,
    pub title: String,
    /// 1-based page where the section's content begins.
    pub page: u32,
    /// Depth = number of id components; derived from `section_id`.
    pub level: u32,
    /// `section_id` minus its last component; `None` at level 1.
    pub parent_id: Option<String>,
    pub full_path: String,
    pub tags: Vec<String>,
}

/// Split a dotted section id into numeric components.
/// Returns `None` when any component is not a non-negative integer,
/// which is how letter and roman-numeral ids get rejected.
pub fn id_parts(section_id: &str) -> Option<Vec<u64>> {
    section_id
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Try to parse one raw text line as a TOC entry.
///
/// Each profile pattern is attempted in order; a match whose extracted record
/// fails validation (non-numeric id, page < 1) falls through to the next
/// pattern. `None` means "not a heading", which is the common case during a
/// TOC scan, not an error.
pub fn parse_toc_line(
    line: &str,
    profile: &DocumentProfile,
    doc_title: &str,
) -> Option<SectionHeading> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    for pattern in &profile.toc_patterns {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let (Some(id), Some(raw_title), Some(raw_page)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let Some(parts) = id_parts(id.as_str()) else {
            continue;
        };
        let Ok(page) = raw_page.as_str().parse::<u32>() else {
            continue;
        };
        if page == 0 {
            continue;
        }

        let section_id = id.as_str().to_string();
        let title = normalize_title(raw_title.as_str());
        let level = parts.len() as u32;
        let parent_id = section_id.rsplit_once('.').map(|(parent, _)| parent.to_string());
        let full_path = format!("{} {}", section_id, title);
        let tags = classify_tags(&title, &profile.tag_map);

        return Some(SectionHeading {
            doc_title: doc_title.to_string(),
            section_id,
            title,
            page,
            level,
            parent_id,
            full_path,
            tags,
        });
    }

    None
}

fn normalize_title(raw: &str) -> String {
    let trimmed = LEADING_DASH_RE.replace(raw.trim(), "");
    WHITESPACE_RE.replace_all(&trimmed, " ").trim().to_string()
}

// ── Tests ──
