use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::{extract_id, UNKNOWN_ID};

// --- Items ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Primary,
    ShortForm,
}

impl ItemKind {
    pub fn from_url(url: &str) -> Self {
        if url.contains("/shorts/") {
            Self::ShortForm
        } else {
            Self::Primary
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Primary => write!(f, "primary"),
            ItemKind::ShortForm => write!(f, "short_form"),
        }
    }
}

/// A discovered item (video). Identity is derived from `url`; `item_id` is
/// `None` when the URL matches none of the known shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReference {
    pub sequence_number: u32,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub group_label: String,
    #[serde(default = "Utc::now")]
    pub discovered_at: DateTime<Utc>,
}

impl ItemReference {
    pub fn new(
        sequence_number: u32,
        title: impl Into<String>,
        url: impl Into<String>,
        group_label: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            sequence_number,
            title: title.into(),
            item_id: extract_id(&url),
            kind: ItemKind::from_url(&url),
            url,
            group_label: group_label.into(),
            discovered_at: Utc::now(),
        }
    }

    /// Build a reference from a bare URL, titled `Video_<id>`.
    pub fn from_url(url: impl Into<String>, sequence_number: u32, group_label: impl Into<String>) -> Self {
        let url = url.into();
        let title = format!(
            "Video_{}",
            extract_id(&url).as_deref().unwrap_or(UNKNOWN_ID)
        );
        Self::new(sequence_number, title, url, group_label)
    }

    /// Recompute identity from the URL, discarding whatever a loaded file claimed.
    pub fn rederived(mut self) -> Self {
        self.item_id = extract_id(&self.url);
        self.kind = ItemKind::from_url(&self.url);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn display_id(&self) -> &str {
        self.id().unwrap_or(UNKNOWN_ID)
    }
}

// --- Comments ---

/// Canonical comment row. One schema for per-item and merged outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub item_id: String,
    pub item_title: String,
    pub item_url: String,
    pub group_label: Option<String>,
    pub comment_id: String,
    pub text: String,
    pub author: String,
    pub author_channel_id: String,
    pub like_count: u64,
    pub reply_count: u64,
    pub published_time: String,
    pub published_timestamp: Option<f64>,
    pub is_pinned: bool,
    pub is_author_reply: bool,
    pub photo_url: String,
    pub has_heart: bool,
}

// --- Output ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// CSV with a UTF-8 byte-order mark, for spreadsheet tools.
    #[default]
    Tabular,
    /// Pretty-printed JSON array.
    Structured,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tabular => "csv",
            OutputFormat::Structured => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
