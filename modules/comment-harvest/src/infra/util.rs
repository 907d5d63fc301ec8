// Filename and timestamp helpers shared by the item pipeline, group
// persistence, the audit log and the exports.

use std::path::{Path, PathBuf};

use chrono::Local;

/// Cap for the title part of per-item file names.
pub const MAX_TITLE_CHARS: usize = 50;

/// Cap for the label part of per-group file names.
pub const MAX_GROUP_LABEL_CHARS: usize = 30;

fn is_safe_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_')
}

/// Keep alphanumerics, space, `-` and `_`; trim; cap the length.
pub fn safe_title(title: &str) -> String {
    let kept: String = title.chars().filter(|c| is_safe_char(*c)).collect();
    kept.trim().chars().take(MAX_TITLE_CHARS).collect()
}

/// Like [`safe_title`] but spaces become underscores and the cap is shorter.
pub fn safe_group_label(label: &str) -> String {
    let kept: String = label.chars().filter(|c| is_safe_char(*c)).collect();
    kept.trim()
        .replace(' ', "_")
        .chars()
        .take(MAX_GROUP_LABEL_CHARS)
        .collect()
}

/// Item id as a file name component: ASCII alphanumerics, `-` and `_` only.
/// Ids come from untrusted hrefs and must not introduce path separators.
pub fn safe_id(id: &str) -> String {
    let kept: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if kept.is_empty() {
        harvest_common::UNKNOWN_ID.to_string()
    } else {
        kept
    }
}

/// `{dir}/{stem}.{ext}`, or `{stem}_2.{ext}` and so on when taken.
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.{ext}"));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{stem}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// `YYYYmmdd_HHMMSS` in local time, for file names.
pub fn file_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `YYYY-mm-dd HH:MM:SS` in local time, for log lines.
pub fn display_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// First `max` characters of `s`, for log lines.
pub fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
