use super::toc::{id_parts, SectionHeading};

/// Resolve the page span owned by the heading at `idx` in the ordered tree.
///
/// Returns `(start_page, end_page)`, both 1-based; content extraction walks
/// the 0-based indices `start_page - 1 .. end_page`, so the boundary page
/// (where the closing section begins) is included — sections routinely share
/// a page with their successor.
pub fn resolve_span(ordered: &[SectionHeading], idx: usize, total_pages: u32) -> (u32, u32) {
    let current = &ordered[idx];
    let current_parts = id_parts(&current.section_id).unwrap_or_default();

    for next in &ordered[idx + 1..] {
        let next_parts = id_parts(&next.section_id).unwrap_or_default();
        if closes_span(&current_parts, &next_parts) {
            return (current.page, next.page);
        }
    }

    // No closing section: the span runs to the end of the document, and a
    // trailing heading still owns at least its own start page.
    (current.page, total_pages.max(current.page))
}

/// A candidate closes the span when it sits at the same or a shallower level,
/// or when it is a deeper heading that is not a direct child of the current
/// one. Only direct children are skipped over; this asymmetry is intentional.
fn closes_span(current: &[u64], candidate: &[u64]) -> bool {
    if candidate.len() <= current.len() {
        return true;
    }
    if candidate.len() == current.len() + 1 && candidate[..current.len()] == *current {
        return false;
    }
    true
}

// ── Tests ──
