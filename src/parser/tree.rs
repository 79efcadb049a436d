use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use super::toc::{id_parts, SectionHeading};

/// Hierarchy defect found while building the section tree. Reported through
/// the validation summary, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Anomaly {
    DuplicateId {
        section_id: String,
    },
    OrphanParent {
        section_id: String,
        parent_id: String,
    },
    PageBeforeParent {
        section_id: String,
        page: u32,
        parent_page: u32,
    },
    NonMonotonicPage {
        section_id: String,
        page: u32,
        prev_id: String,
        prev_page: u32,
    },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::DuplicateId { section_id } => {
                write!(f, "duplicate section id {}", section_id)
            }
            Anomaly::OrphanParent { section_id, parent_id } => {
                write!(f, "section {} references missing parent {}", section_id, parent_id)
            }
            Anomaly::PageBeforeParent { section_id, page, parent_page } => {
                write!(
                    f,
                    "section {} starts on page {} before its parent's page {}",
                    section_id, page, parent_page
                )
            }
            Anomaly::NonMonotonicPage { section_id, page, prev_id, prev_page } => {
                write!(
                    f,
                    "section {} (page {}) precedes sibling {} (page {})",
                    section_id, page, prev_id, prev_page
                )
            }
        }
    }
}

/// Order headings by their numeric id components and surface hierarchy
/// anomalies. Duplicates keep the first occurrence in scan order; everything
/// else is reported but retained.
pub fn build_tree(headings: Vec<SectionHeading>) -> (Vec<SectionHeading>, Vec<Anomaly>) {
    let mut anomalies = Vec::new();

    // Dedup in scan order before sorting so "first occurrence" is well defined.
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<SectionHeading> = Vec::with_capacity(headings.len());
    for heading in headings {
        if seen.insert(heading.section_id.clone()) {
            unique.push(heading);
        } else {
            anomalies.push(Anomaly::DuplicateId { section_id: heading.section_id });
        }
    }

    // Component-wise numeric order: 2.9 < 2.10.
    unique.sort_by_key(|h| id_parts(&h.section_id).unwrap_or_default());

    let pages: HashMap<&str, u32> = unique
        .iter()
        .map(|h| (h.section_id.as_str(), h.page))
        .collect();

    for heading in &unique {
        if let Some(parent_id) = &heading.parent_id {
            match pages.get(parent_id.as_str()) {
                None => anomalies.push(Anomaly::OrphanParent {
                    section_id: heading.section_id.clone(),
                    parent_id: parent_id.clone(),
                }),
                Some(&parent_page) if heading.page < parent_page => {
                    anomalies.push(Anomaly::PageBeforeParent {
                        section_id: heading.section_id.clone(),
                        page: heading.page,
                        parent_page,
                    });
                }
                Some(_) => {}
            }
        }
    }

    // Sibling page order: within each parent, pages must not decrease.
    let mut children: HashMap<Option<&str>, Vec<&SectionHeading>> = HashMap::new();
    for heading in &unique {
        children
            .entry(heading.parent_id.as_deref())
            .or_default()
            .push(heading);
    }
    let mut sibling_anomalies = Vec::new();
    for siblings in children.values() {
        for pair in siblings.windows(2) {
            if pair[1].page < pair[0].page {
                sibling_anomalies.push(Anomaly::NonMonotonicPage {
                    section_id: pair[1].section_id.clone(),
                    page: pair[1].page,
                    prev_id: pair[0].section_id.clone(),
                    prev_page: pair[0].page,
                });
            }
        }
    }
    sibling_anomalies.sort_by_key(|a| match a {
        Anomaly::NonMonotonicPage { section_id, .. } => {
            id_parts(section_id).unwrap_or_default()
        }
        _ => Vec::new(),
    });
    anomalies.extend(sibling_anomalies);

    for anomaly in &anomalies {
        warn!("{}", anomaly);
    }

    (unique, anomalies)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(id: &str, page: u32) -> SectionHeading {
        let parts = id_parts(id).unwrap();
        SectionHeading {
            doc_title: "Test Spec".into(),
            section_id: id.into(),
            title: format!("Section {}", id),
            page,
            level: parts.len() as u32,
            parent_id: id.rsplit_once('.').map(|(p, _)| p.to_string()),
            full_path: format!("{} Section {}", id, id),
            tags: Vec::new(),
        }
    }

    fn ids(headings: &[SectionHeading]) -> Vec<&str> {
        headings.iter().map(|h| h.section_id.as_str()).collect()
    }

    #[test]
    fn numeric_not_lexicographic_order() {
        let input = vec![heading("2.10", 30), heading("2.2", 10), heading("2.9", 20)];
        let (ordered, anomalies) = build_tree(input);
        assert_eq!(ids(&ordered), vec!["2.2", "2.9", "2.10"]);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn scan_order_input_gets_sorted() {
        let input = vec![
            heading("3", 40),
            heading("1", 1),
            heading("2.1", 12),
            heading("2", 10),
        ];
        let (ordered, _) = build_tree(input);
        assert_eq!(ids(&ordered), vec!["1", "2", "2.1", "3"]);
    }

    #[test]
    fn duplicates_keep_first_and_are_flagged() {
        let mut first = heading("2.1", 10);
        first.title = "kept".into();
        let mut second = heading("2.1", 99);
        second.title = "dropped".into();
        let (ordered, anomalies) = build_tree(vec![first, second, heading("1", 1)]);
        assert_eq!(ids(&ordered), vec!["1", "2.1"]);
        assert_eq!(ordered[1].title, "kept");
        assert_eq!(
            anomalies,
            vec![Anomaly::DuplicateId { section_id: "2.1".into() }]
        );
    }

    #[test]
    fn orphan_parent_is_reported_not_dropped() {
        let (ordered, anomalies) = build_tree(vec![heading("1", 1), heading("3.2", 20)]);
        assert_eq!(ids(&ordered), vec!["1", "3.2"]);
        assert_eq!(
            anomalies,
            vec![Anomaly::OrphanParent { section_id: "3.2".into(), parent_id: "3".into() }]
        );
    }

    #[test]
    fn child_before_parent_page_is_flagged() {
        let (_, anomalies) = build_tree(vec![heading("2", 10), heading("2.1", 5)]);
        assert_eq!(
            anomalies,
            vec![Anomaly::PageBeforeParent { section_id: "2.1".into(), page: 5, parent_page: 10 }]
        );
    }

    #[test]
    fn non_monotonic_sibling_pages_are_flagged() {
        let (_, anomalies) = build_tree(vec![
            heading("1", 1),
            heading("1.1", 2),
            heading("1.2", 8),
            heading("1.3", 4),
        ]);
        assert_eq!(
            anomalies,
            vec![Anomaly::NonMonotonicPage {
                section_id: "1.3".into(),
                page: 4,
                prev_id: "1.2".into(),
                prev_page: 8,
            }]
        );
    }
}
