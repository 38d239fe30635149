//! File naming for exported documents and reports.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Longest sanitized title, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a document title usable as a file name.
///
/// Each of `<>:"/\|?*` becomes `-`; the result is cut to 255 characters.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '-' } else { c })
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Base name (without extension) of a document's PDF and JSON files.
///
/// Falls back to `document-<id>` when the title leaves nothing usable.
#[must_use]
pub fn artifact_base_name(document_id: i64, title: &str) -> String {
    let sanitized = sanitize_title(title);
    if sanitized.trim().is_empty() {
        format!("document-{document_id}")
    } else {
        sanitized
    }
}

/// First free report path: `##{tag}-{yyyyMMdd}.xlsx`, then `-1`, `-2`, ...
///
/// The tag name is passed through [`sanitize_title`].
#[must_use]
pub fn report_path(dir: &Path, tag_name: &str, date: NaiveDate) -> PathBuf {
    let stem = format!("##{}-{}", sanitize_title(tag_name), date.format("%Y%m%d"));
    let mut candidate = dir.join(format!("{stem}.xlsx"));
    let mut counter = 1_u32;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}-{counter}.xlsx"));
        counter += 1;
    }
    candidate
}
