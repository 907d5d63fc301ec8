//! Item identifier extraction from platform URLs.
//!
//! Matching is plain substring search over three known URL shapes, checked in
//! order. No URL parsing: discovery hands us whatever hrefs the page carried.

/// Rendered in human-facing text when an item has no identifier.
pub const UNKNOWN_ID: &str = "unknown";

/// (marker, terminator) pairs, checked in order. First marker found wins.
const ID_PATTERNS: &[(&str, char)] = &[
    ("watch?v=", '&'),
    ("/shorts/", '?'),
    ("youtu.be/", '?'),
];

/// Extract the platform identifier embedded in `url`.
///
/// Returns `None` when no known shape matches or the identifier would be empty.
pub fn extract_id(url: &str) -> Option<String> {
    let (marker, terminator) = ID_PATTERNS
        .iter()
        .find(|(marker, _)| url.contains(marker))?;

    let (_, rest) = url.split_once(marker)?;
    let id = rest
        .split_once(*terminator)
        .map_or(rest, |(id, _)| id)
        .trim();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// True when the URL points at the video platform at all.
pub fn is_platform_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}
