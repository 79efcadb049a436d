use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::parser::content::SectionContent;
use crate::parser::toc::{id_parts, SectionHeading};
use crate::parser::tree::Anomaly;

/// Same section id parsed on a different page than the TOC announced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderIssue {
    pub section_id: String,
    pub toc_page: u32,
    pub parsed_page: u32,
    pub difference: u32,
}

/// Non-consecutive numbering between adjacent same-parent siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberingGap {
    pub level: u32,
    pub before_section: String,
    pub after_section: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub total_toc_entries: usize,
    pub total_parsed_entries: usize,
    pub missing_from_parsed: Vec<String>,
    pub extra_in_parsed: Vec<String>,
    pub common_entries: usize,
    pub order_issues: Vec<OrderIssue>,
    pub gaps: Vec<NumberingGap>,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub level_distribution: BTreeMap<u32, usize>,
    pub toc_page_range: (u32, u32),
    pub parsed_page_range: (u32, u32),
    pub avg_content_length: f64,
    pub total_content_length: usize,
    pub sections_with_content: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "MISSING")]
    Missing,
    #[serde(rename = "EXTRA")]
    Extra,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Missing => "MISSING",
            Status::Extra => "EXTRA",
        }
    }
}

/// One row of the validation report: every TOC entry, plus any parsed
/// section the TOC never announced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub section_id: String,
    pub title: String,
    pub toc_page: Option<u32>,
    pub in_toc: bool,
    pub in_parsed: bool,
    pub parsed_page: Option<u32>,
    pub status: Status,
    pub level: u32,
    pub parent_id: Option<String>,
    pub content_length: usize,
    pub tags: String,
}

/// Compare the TOC heading set against the parsed content set.
///
/// Pure read-only analysis: identical inputs always produce identical
/// output, so the report can be regenerated at any time.
pub fn reconcile(toc: &[SectionHeading], sections: &[SectionContent]) -> Reconciliation {
    let toc_ids: HashSet<&str> = toc.iter().map(|h| h.section_id.as_str()).collect();
    let parsed_ids: HashSet<&str> = sections
        .iter()
        .map(|s| s.heading.section_id.as_str())
        .collect();

    let mut missing_from_parsed: Vec<String> = toc_ids
        .difference(&parsed_ids)
        .map(|id| (*id).to_string())
        .collect();
    missing_from_parsed.sort_by_key(|id| lenient_parts(id));

    let mut extra_in_parsed: Vec<String> = parsed_ids
        .difference(&toc_ids)
        .map(|id| (*id).to_string())
        .collect();
    extra_in_parsed.sort_by_key(|id| lenient_parts(id));

    let common_entries = toc_ids.intersection(&parsed_ids).count();

    let parsed_pages: HashMap<&str, u32> = sections
        .iter()
        .map(|s| (s.heading.section_id.as_str(), s.heading.page))
        .collect();
    let mut order_issues = Vec::new();
    for entry in toc {
        if let Some(&parsed_page) = parsed_pages.get(entry.section_id.as_str()) {
            if parsed_page != entry.page {
                order_issues.push(OrderIssue {
                    section_id: entry.section_id.clone(),
                    toc_page: entry.page,
                    parsed_page,
                    difference: entry.page.abs_diff(parsed_page),
                });
            }
        }
    }

    let coverage_percentage = if toc_ids.is_empty() {
        0.0
    } else {
        common_entries as f64 / toc_ids.len() as f64 * 100.0
    };

    Reconciliation {
        total_toc_entries: toc.len(),
        total_parsed_entries: sections.len(),
        missing_from_parsed,
        extra_in_parsed,
        common_entries,
        order_issues,
        gaps: find_gaps(toc),
        coverage_percentage,
    }
}

/// Flag non-consecutive numbering between adjacent siblings of the same
/// parent at each level. A parent change (2.9 → 3.1) is not a gap.
pub fn find_gaps(toc: &[SectionHeading]) -> Vec<NumberingGap> {
    let mut by_level: BTreeMap<u32, Vec<&SectionHeading>> = BTreeMap::new();
    for entry in toc {
        by_level.entry(entry.level).or_default().push(entry);
    }

    let mut gaps = Vec::new();
    for (level, mut entries) in by_level {
        entries.sort_by_key(|h| id_parts(&h.section_id).unwrap_or_default());
        for pair in entries.windows(2) {
            let (Some(current), Some(next)) = (
                id_parts(&pair[0].section_id),
                id_parts(&pair[1].section_id),
            ) else {
                continue;
            };
            if has_gap(&current, &next) {
                gaps.push(NumberingGap {
                    level,
                    before_section: pair[0].section_id.clone(),
                    after_section: pair[1].section_id.clone(),
                    description: format!(
                        "Missing sections between {} and {}",
                        pair[0].section_id, pair[1].section_id
                    ),
                });
            }
        }
    }
    gaps
}

fn has_gap(current: &[u64], next: &[u64]) -> bool {
    if current.len() != next.len() || current.is_empty() {
        return false;
    }
    let last = current.len() - 1;
    if current[..last] != next[..last] {
        return false;
    }
    next[last] != current[last] + 1
}

/// Descriptive statistics over both collections.
pub fn summarize(toc: &[SectionHeading], sections: &[SectionContent]) -> SummaryStats {
    let mut level_distribution: BTreeMap<u32, usize> = BTreeMap::new();
    for entry in toc {
        *level_distribution.entry(entry.level).or_default() += 1;
    }

    let content_lengths: Vec<usize> = sections.iter().map(|s| s.content.len()).collect();
    let total_content_length: usize = content_lengths.iter().sum();
    let avg_content_length = if content_lengths.is_empty() {
        0.0
    } else {
        total_content_length as f64 / content_lengths.len() as f64
    };

    SummaryStats {
        level_distribution,
        toc_page_range: page_range(toc.iter().map(|h| h.page)),
        parsed_page_range: page_range(sections.iter().map(|s| s.heading.page)),
        avg_content_length,
        total_content_length,
        sections_with_content: sections.iter().filter(|s| !s.content.is_empty()).count(),
    }
}

fn page_range(pages: impl Iterator<Item = u32>) -> (u32, u32) {
    let mut min = None;
    let mut max = None;
    for page in pages {
        min = Some(min.map_or(page, |m: u32| m.min(page)));
        max = Some(max.map_or(page, |m: u32| m.max(page)));
    }
    (min.unwrap_or(0), max.unwrap_or(0))
}

/// Build the per-section report rows, sorted by numeric section id.
pub fn build_report_rows(toc: &[SectionHeading], sections: &[SectionContent]) -> Vec<ReportRow> {
    let by_id: HashMap<&str, &SectionContent> = sections
        .iter()
        .map(|s| (s.heading.section_id.as_str(), s))
        .collect();
    let toc_ids: HashSet<&str> = toc.iter().map(|h| h.section_id.as_str()).collect();

    let mut rows = Vec::with_capacity(toc.len());
    for entry in toc {
        let parsed = by_id.get(entry.section_id.as_str());
        rows.push(ReportRow {
            section_id: entry.section_id.clone(),
            title: entry.title.clone(),
            toc_page: Some(entry.page),
            in_toc: true,
            in_parsed: parsed.is_some(),
            parsed_page: parsed.map(|s| s.heading.page),
            status: if parsed.is_some() { Status::Ok } else { Status::Missing },
            level: entry.level,
            parent_id: entry.parent_id.clone(),
            content_length: parsed.map_or(0, |s| s.content.len()),
            tags: entry.tags.join(", "),
        });
    }

    for section in sections {
        if !toc_ids.contains(section.heading.section_id.as_str()) {
            rows.push(ReportRow {
                section_id: section.heading.section_id.clone(),
                title: section.heading.title.clone(),
                toc_page: None,
                in_toc: false,
                in_parsed: true,
                parsed_page: Some(section.heading.page),
                status: Status::Extra,
                level: section.heading.level,
                parent_id: section.heading.parent_id.clone(),
                content_length: section.content.len(),
                tags: section.heading.tags.join(", "),
            });
        }
    }

    rows.sort_by(|a, b| {
        lenient_parts(&a.section_id)
            .cmp(&lenient_parts(&b.section_id))
            .then_with(|| a.section_id.cmp(&b.section_id))
    });
    rows
}

// Ad hoc ids injected downstream may carry non-numeric components; sort on
// whatever numeric components they do have.
fn lenient_parts(section_id: &str) -> Vec<u64> {
    section_id
        .split('.')
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// Console summary block printed after a run.
pub fn print_summary(rec: &Reconciliation, stats: &SummaryStats, anomalies: &[Anomaly]) {
    println!("\n{}", "=".repeat(60));
    println!("VALIDATION SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Coverage:      {:.1}%", rec.coverage_percentage);
    println!("TOC entries:   {}", rec.total_toc_entries);
    println!("Parsed:        {}", rec.total_parsed_entries);
    println!("Missing:       {}", rec.missing_from_parsed.len());
    println!("Extra:         {}", rec.extra_in_parsed.len());
    println!("Order issues:  {}", rec.order_issues.len());
    println!("Numbering gaps:{:>2}", rec.gaps.len());

    if !rec.missing_from_parsed.is_empty() {
        println!("\nMissing sections: {}", rec.missing_from_parsed.join(", "));
    }
    for gap in &rec.gaps {
        println!("  gap: {} -> {}", gap.before_section, gap.after_section);
    }
    if !anomalies.is_empty() {
        println!("\nHierarchy anomalies:");
        for anomaly in anomalies {
            println!("  {}", anomaly);
        }
    }

    let levels: Vec<String> = stats
        .level_distribution
        .iter()
        .map(|(level, count)| format!("L{}: {}", level, count))
        .collect();
    println!("\nLevels:        {}", levels.join("  "));
    println!(
        "Pages:         toc {}-{}, parsed {}-{}",
        stats.toc_page_range.0,
        stats.toc_page_range.1,
        stats.parsed_page_range.0,
        stats.parsed_page_range.1
    );
    println!(
        "Content:       {} sections with text, {} chars total, {:.0} avg",
        stats.sections_with_content, stats.total_content_length, stats.avg_content_length
    );
    println!("{}", "=".repeat(60));
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

    fn section(id: &str, page: u32, content: &str) -> SectionContent {
        SectionContent { heading: heading(id, page), content: content.into() }
    }

    #[test]
    fn full_coverage() {
        let toc = vec![heading("1", 1), heading("2", 5)];
        let sections = vec![section("1", 1, "a"), section("2", 5, "b")];
        let rec = reconcile(&toc, &sections);
        assert_eq!(rec.coverage_percentage, 100.0);
        assert!(rec.missing_from_parsed.is_empty());
        assert!(rec.extra_in_parsed.is_empty());
        assert_eq!(rec.common_entries, 2);
    }

    #[test]
    fn missing_and_extra_are_reported() {
        let toc = vec![heading("1", 1), heading("2", 5), heading("3", 9)];
        let sections = vec![section("1", 1, "a"), section("9.9", 40, "injected")];
        let rec = reconcile(&toc, &sections);
        assert_eq!(rec.missing_from_parsed, vec!["2", "3"]);
        assert_eq!(rec.extra_in_parsed, vec!["9.9"]);
        assert!((rec.coverage_percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_heading_set_has_zero_coverage() {
        let rec = reconcile(&[], &[section("1", 1, "a")]);
        assert_eq!(rec.coverage_percentage, 0.0);
        assert_eq!(rec.extra_in_parsed, vec!["1"]);
    }

    #[test]
    fn page_disagreement_is_an_order_issue() {
        let toc = vec![heading("1", 4)];
        let sections = vec![section("1", 7, "a")];
        let rec = reconcile(&toc, &sections);
        assert_eq!(
            rec.order_issues,
            vec![OrderIssue { section_id: "1".into(), toc_page: 4, parsed_page: 7, difference: 3 }]
        );
    }

    #[test]
    fn gap_between_siblings() {
        let toc = vec![heading("2.1", 1), heading("2.2", 2), heading("2.4", 3)];
        let gaps = find_gaps(&toc);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].before_section, "2.2");
        assert_eq!(gaps[0].after_section, "2.4");
    }

    #[test]
    fn consecutive_siblings_have_no_gap() {
        let toc = vec![heading("2.1", 1), heading("2.2", 2), heading("2.3", 3)];
        assert!(find_gaps(&toc).is_empty());
    }

    #[test]
    fn parent_change_is_not_a_gap() {
        let toc = vec![heading("2.9", 1), heading("3.1", 2)];
        assert!(find_gaps(&toc).is_empty());
    }

    #[test]
    fn top_level_gaps_are_detected() {
        let toc = vec![heading("1", 1), heading("3", 2)];
        let gaps = find_gaps(&toc);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].level, 1);
    }

    #[test]
    fn report_rows_cover_toc_and_extras() {
        let toc = vec![heading("1", 1), heading("2", 5)];
        let sections = vec![section("1", 1, "body text"), section("0.5", 2, "extra")];
        let rows = build_report_rows(&toc, &sections);
        assert_eq!(rows.len(), 3);
        // Numeric order: 0.5 sorts before 1.
        assert_eq!(rows[0].section_id, "0.5");
        assert_eq!(rows[0].status, Status::Extra);
        assert_eq!(rows[1].status, Status::Ok);
        assert_eq!(rows[1].content_length, "body text".len());
        assert_eq!(rows[2].status, Status::Missing);
        assert_eq!(rows[2].content_length, 0);
    }

    #[test]
    fn engine_is_idempotent() {
        let toc = vec![heading("1", 1), heading("1.1", 2), heading("2", 5)];
        let sections = vec![section("1", 1, "a"), section("2", 5, "")];
        let first = serde_json::to_string(&(
            reconcile(&toc, &sections),
            summarize(&toc, &sections),
            build_report_rows(&toc, &sections),
        ))
        .unwrap();
        let second = serde_json::to_string(&(
            reconcile(&toc, &sections),
            summarize(&toc, &sections),
            build_report_rows(&toc, &sections),
        ))
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn summary_statistics() {
        let toc = vec![heading("1", 1), heading("1.1", 2), heading("2", 5)];
        let sections = vec![section("1", 1, "abcd"), section("1.1", 2, "")];
        let stats = summarize(&toc, &sections);
        assert_eq!(stats.level_distribution.get(&1), Some(&2));
        assert_eq!(stats.level_distribution.get(&2), Some(&1));
        assert_eq!(stats.toc_page_range, (1, 5));
        assert_eq!(stats.parsed_page_range, (1, 2));
        assert_eq!(stats.total_content_length, 4);
        assert_eq!(stats.avg_content_length, 2.0);
        assert_eq!(stats.sections_with_content, 1);
    }

    #[test]
    fn empty_inputs_produce_zeroed_stats() {
        let stats = summarize(&[], &[]);
        assert_eq!(stats.toc_page_range, (0, 0));
        assert_eq!(stats.parsed_page_range, (0, 0));
        assert_eq!(stats.avg_content_length, 0.0);
    }
}
