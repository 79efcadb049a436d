use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use lopdf::Document;
use regex::Regex;
use tracing::debug;

static TABLE_CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bTable\s+\d+(?:[-.]\d+)*\b").unwrap());

/// Read-only view of a paginated document. Implementations must be cheap to
/// query repeatedly; the pipeline reads pages once per owning section.
pub trait PageSource: Sync {
    fn page_count(&self) -> usize;
    /// Plain text of a 0-based page; `None` when the page yields no text
    /// (image-only pages, extraction failures).
    fn page_text(&self, page_index: usize) -> Option<&str>;
    /// Number of tables detected on a 0-based page.
    fn table_count(&self, page_index: usize) -> usize;
}

/// `PageSource` backed by lopdf. The document is loaded once and every
/// page's text is extracted up front, so later reads never touch the file.
#[derive(Debug)]
pub struct LopdfSource {
    pages: Vec<Option<String>>,
    tables: Vec<usize>,
}

impl LopdfSource {
    /// Open a PDF, enforcing the input guards that abort a run: missing
    /// file, non-PDF extension, profile size ceiling, unreadable document.
    pub fn open(path: &Path, max_file_size_mb: u64) -> Result<Self> {
        let meta = fs::metadata(path)
            .with_context(|| format!("PDF file not found: {}", path.display()))?;
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            bail!("file must be a PDF: {}", path.display());
        }
        if meta.len() > max_file_size_mb * 1024 * 1024 {
            bail!(
                "{} is {} bytes, over the {} MB ceiling for this document profile",
                path.display(),
                meta.len(),
                max_file_size_mb
            );
        }

        let doc = Document::load(path)
            .with_context(|| format!("failed to open PDF: {}", path.display()))?;

        let mut pages = Vec::new();
        for (&number, _) in doc.get_pages().iter() {
            // Per-page extraction failures degrade to a textless page.
            let text = match doc.extract_text(&[number]) {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(err) => {
                    debug!("no text extracted from page {}: {}", number, err);
                    None
                }
            };
            pages.push(text);
        }

        let tables = pages
            .iter()
            .map(|page| {
                page.as_deref()
                    .map_or(0, |text| TABLE_CAPTION_RE.find_iter(text).count())
            })
            .collect();

        Ok(Self { pages, tables })
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> Option<&str> {
        self.pages.get(page_index).and_then(|page| page.as_deref())
    }

    fn table_count(&self, page_index: usize) -> usize {
        self.tables.get(page_index).copied().unwrap_or(0)
    }
}

/// In-memory source for tests: one string per page, empty = textless.
#[cfg(test)]
pub struct StaticSource {
    pages: Vec<Option<String>>,
}

#[cfg(test)]
impl StaticSource {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|text| {
                    if text.trim().is_empty() {
                        None
                    } else {
                        Some((*text).to_string())
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
impl PageSource for StaticSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> Option<&str> {
        self.pages.get(page_index).and_then(|page| page.as_deref())
    }

    fn table_count(&self, page_index: usize) -> usize {
        self.page_text(page_index)
            .map_or(0, |text| TABLE_CAPTION_RE.find_iter(text).count())
    }
}

// ── Tests ──
