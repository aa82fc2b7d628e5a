pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased header used for case-insensitive matching and heuristics.
pub(crate) fn header_key(value: &str) -> String {
    normalize_header(value).to_lowercase()
}

/// Returns the trimmed cell or `None` when the cell is blank or a common
/// spreadsheet null marker.
pub(crate) fn clean_cell(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "na" | "n/a" | "nan" | "nat" | "null" | "none" | "-" => None,
        _ => Some(trimmed),
    }
}
