//! Response segmentation along section boundaries.
//!
//! The generation service is instructed to separate answer sections with
//! `---`; each section may open with a `【セクションN: …】` label line that
//! exists only to steer the model and is stripped before display.

/// Section delimiter the model is instructed to emit.
pub const SECTION_DELIMITER: &str = "---";

/// Prefix of section-label lines stripped from each chunk.
const SECTION_LABEL_PREFIX: &str = "【セクション";

/// Split generated text into ordered, non-empty display chunks.
///
/// With no delimiter present the trimmed whole text is the single chunk.
/// Otherwise parts are trimmed, label lines stripped, and empty parts
/// dropped; if that leaves nothing, the whole trimmed text is returned so
/// the output is never empty for non-empty input.
pub fn segment(text: &str) -> Vec<String> {
    if !text.contains(SECTION_DELIMITER) {
        return vec![text.trim().to_owned()];
    }

    let chunks: Vec<String> = text
        .split(SECTION_DELIMITER)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(strip_section_labels)
        .collect();

    if chunks.is_empty() {
        return vec![text.trim().to_owned()];
    }
    chunks
}

/// Remove section-label lines from a part; `None` when nothing remains.
fn strip_section_labels(part: &str) -> Option<String> {
    let kept: Vec<&str> = part
        .lines()
        .filter(|line| !line.trim_start().starts_with(SECTION_LABEL_PREFIX))
        .collect();
    let cleaned = kept.join("\n").trim().to_owned();
    (!cleaned.is_empty()).then_some(cleaned)
}
