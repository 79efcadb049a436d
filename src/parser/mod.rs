pub mod content;
pub mod range;
pub mod tags;
pub mod toc;
pub mod tree;

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::pdf::PageSource;
use crate::profile::DocumentProfile;
use content::{extract_section_text, SectionContent};
use toc::SectionHeading;
use tree::Anomaly;

static FIGURE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Figure\s+\d+").unwrap());

/// Document-level counters emitted as the single metadata record.
#[derive(Debug, Clone, Serialize)]
pub struct DocMetadata {
    pub doc_title: String,
    pub total_pages: usize,
    /// 1-based pages on which TOC lines were observed.
    pub toc_pages: Vec<u32>,
    pub sections_count: usize,
    pub tables_count: usize,
    pub figures_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub doc_title: String,
    /// Overrides the profile's TOC scan depth when set.
    pub toc_scan_pages: Option<usize>,
}

pub struct ParseOutcome {
    /// Ordered, validated section tree.
    pub toc: Vec<SectionHeading>,
    pub sections: Vec<SectionContent>,
    pub anomalies: Vec<Anomaly>,
    pub metadata: DocMetadata,
}

/// Full pipeline: TOC scan → tree build → range resolution → content
/// extraction → metadata. Stages run strictly in dependency order; only the
/// per-section extraction fans out, and it is collected before returning.
pub fn run(source: &dyn PageSource, profile: &DocumentProfile, opts: &ParseOptions) -> ParseOutcome {
    let total_pages = source.page_count();

    let (headings, toc_pages) = scan_toc(source, profile, opts);
    info!("TOC entries found: {}", headings.len());

    let (ordered, anomalies) = tree::build_tree(headings);
    let sections = extract_sections(source, profile, &ordered);
    info!("sections extracted: {}", sections.len());

    let (tables_count, figures_count) = count_tables_and_figures(source);

    ParseOutcome {
        metadata: DocMetadata {
            doc_title: opts.doc_title.clone(),
            total_pages,
            toc_pages,
            sections_count: sections.len(),
            tables_count,
            figures_count,
            generated_at: Utc::now(),
        },
        toc: ordered,
        sections,
        anomalies,
    }
}

/// Scan the leading pages line by line for TOC entries. Non-matching lines
/// are the expected common case and are skipped without comment.
fn scan_toc(
    source: &dyn PageSource,
    profile: &DocumentProfile,
    opts: &ParseOptions,
) -> (Vec<SectionHeading>, Vec<u32>) {
    let total_pages = source.page_count();
    let scan_limit = opts
        .toc_scan_pages
        .unwrap_or(profile.toc_scan_pages)
        .min(total_pages);

    let mut headings = Vec::new();
    let mut toc_pages = Vec::new();
    for page_index in 0..scan_limit {
        let Some(text) = source.page_text(page_index) else {
            continue;
        };
        let mut matched_on_page = false;
        for line in text.lines() {
            let Some(heading) = toc::parse_toc_line(line, profile, &opts.doc_title) else {
                continue;
            };
            if heading.page as usize > total_pages {
                warn!(
                    "section {} points at page {} beyond the document's {} pages, skipping",
                    heading.section_id, heading.page, total_pages
                );
                continue;
            }
            headings.push(heading);
            matched_on_page = true;
        }
        if matched_on_page {
            toc_pages.push(page_index as u32 + 1);
        }
    }

    (headings, toc_pages)
}

/// Per-section content extraction. Each heading's span is independently
/// computed against the read-only source, so the fan-out is safe; the
/// collect is the barrier the validation stage requires.
fn extract_sections(
    source: &dyn PageSource,
    profile: &DocumentProfile,
    ordered: &[SectionHeading],
) -> Vec<SectionContent> {
    let total_pages = source.page_count() as u32;

    let pb = ProgressBar::new(ordered.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let sections: Vec<SectionContent> = ordered
        .par_iter()
        .enumerate()
        .filter_map(|(idx, heading)| {
            let (start, end) = range::resolve_span(ordered, idx, total_pages);
            let section = extract_section_text(source, start, end, &profile.cleanup_rules)
                .map(|content| SectionContent { heading: heading.clone(), content });
            if section.is_none() {
                debug!(
                    "no text in pages {}..{} for section {}",
                    start, end, heading.section_id
                );
            }
            pb.inc(1);
            section
        })
        .collect();

    pb.finish_and_clear();
    sections
}

fn count_tables_and_figures(source: &dyn PageSource) -> (usize, usize) {
    let mut tables = 0;
    let mut figures = 0;
    for page_index in 0..source.page_count() {
        tables += source.table_count(page_index);
        if let Some(text) = source.page_text(page_index) {
            figures += FIGURE_RE.find_iter(text).count();
        }
    }
    (tables, figures)
}

// ── Tests ──
