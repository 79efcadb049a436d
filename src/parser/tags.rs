/// Classify a section title against a profile's keyword→tag map.
///
/// Case-insensitive substring matching; a tag is included when any of its
/// keywords appears in the title. Pure function of its inputs, so the same
/// title always yields the same tag set.
pub fn classify_tags(title: &str, tag_map: &[(&str, &[&str])]) -> Vec<String> {
    let lower = title.to_lowercase();
    let mut tags = Vec::new();
    for (tag, keywords) in tag_map {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            tags.push((*tag).to_string());
        }
    }
    tags
}

// ── Tests ──
