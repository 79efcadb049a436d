use std::sync::LazyLock;

use regex::Regex;

use crate::pdf::PageSource;

const TOC_INDICATORS: &[&str] = &["table of contents", "contents", "toc", "index"];

static CHAPTER_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b\d+\s+\w+").unwrap(),
        Regex::new(r"(?i)\b\d+\.\d+\s+\w+").unwrap(),
        Regex::new(r"(?i)\b\d+\.\d+\.\d+\s+\w+").unwrap(),
        Regex::new(r"(?i)chapter\s+\d+").unwrap(),
        Regex::new(r"(?i)section\s+\d+").unwrap(),
    ]
});
static LEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)\.+\s*\d+$").unwrap());
static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+(?:\.\d+)*\s+").unwrap());

pub const HIGH_THRESHOLD: f64 = 3.0;
pub const MEDIUM_THRESHOLD: f64 = 1.5;

/// How TOC-like one page looks.
#[derive(Debug, Clone)]
pub struct PageScore {
    /// 1-based page number.
    pub page: u32,
    /// Weight from explicit TOC indicator phrases.
    pub toc_score: f64,
    /// Weight from chapter patterns, dotted leaders and numbered lines.
    pub chapter_score: f64,
}

impl PageScore {
    pub fn total(&self) -> f64 {
        self.toc_score + self.chapter_score
    }

    pub fn is_high(&self) -> bool {
        self.total() > HIGH_THRESHOLD
    }

    pub fn is_medium(&self) -> bool {
        self.total() > MEDIUM_THRESHOLD && !self.is_high()
    }
}

/// Score the first `max_pages` pages by TOC likelihood. Pages scoring zero
/// are omitted.
pub fn score_pages(source: &dyn PageSource, max_pages: usize) -> Vec<PageScore> {
    let limit = max_pages.min(source.page_count());
    let mut scores = Vec::new();

    for page_index in 0..limit {
        let Some(text) = source.page_text(page_index) else {
            continue;
        };
        let lower = text.to_lowercase();

        let mut toc_score = 0.0;
        for indicator in TOC_INDICATORS {
            if lower.contains(indicator) {
                toc_score += 3.0;
            }
        }

        let mut chapter_score = 0.0;
        for pattern in CHAPTER_RES.iter() {
            chapter_score += pattern.find_iter(text).count() as f64 * 0.5;
        }
        chapter_score += LEADER_RE.find_iter(text).count() as f64 * 0.3;
        chapter_score += NUMBERED_RE.find_iter(text).count() as f64 * 0.2;

        if toc_score + chapter_score > 0.0 {
            scores.push(PageScore {
                page: page_index as u32 + 1,
                toc_score,
                chapter_score,
            });
        }
    }

    scores
}

/// Highest-scoring high-probability page, if any.
pub fn best_candidate(scores: &[PageScore]) -> Option<&PageScore> {
    scores
        .iter()
        .filter(|score| score.is_high())
        .max_by(|a, b| a.total().total_cmp(&b.total()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::StaticSource;

    fn sample() -> StaticSource {
        StaticSource::new(&[
            "Revision History\nInitial release.",
            "Table of Contents\n\
             1 Introduction .......... 3\n\
             1.1 Scope .......... 3\n\
             2 Power Negotiation .......... 5",
            "1 Introduction\nThis document describes power delivery.",
        ])
    }

    #[test]
    fn toc_page_scores_highest() {
        let scores = score_pages(&sample(), 100);
        let best = best_candidate(&scores).unwrap();
        assert_eq!(best.page, 2);
        assert!(best.toc_score >= 3.0);
    }

    #[test]
    fn body_pages_are_not_high_probability() {
        let scores = score_pages(&sample(), 100);
        assert!(scores
            .iter()
            .filter(|s| s.page == 3)
            .all(|s| !s.is_high()));
    }

    #[test]
    fn scan_limit_is_respected() {
        let scores = score_pages(&sample(), 1);
        assert!(scores.iter().all(|s| s.page == 1));
    }

    #[test]
    fn textless_document_has_no_candidates() {
        let source = StaticSource::new(&["", ""]);
        let scores = score_pages(&source, 10);
        assert!(scores.is_empty());
        assert!(best_candidate(&scores).is_none());
    }
}
