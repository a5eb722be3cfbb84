//! Free-text cleanup shared by every text attribute of a plant record.

/// ASCII SUB, left behind by lossy transcoding in some agency exports.
const SUBSTITUTE: char = '\u{1A}';

/// Replace newlines and commas with spaces, drop substitute characters,
/// trim surrounding whitespace.
pub fn clean_text(raw: &str) -> String {
    raw.replace(['\n', '\r', ','], " ")
        .replace(SUBSTITUTE, "")
        .trim()
        .to_string()
}

/// Clean an optional field. `None` stays "no data"; a present value is
/// cleaned but kept even when it ends up empty.
pub fn clean_optional(raw: Option<&str>) -> Option<String> {
    raw.map(clean_text)
}

/// Clean a field read from a flat file, where an empty cell means "no data".
pub fn clean_cell(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
