//! Item sources: operator URLs and item list files.
//!
//! Keyword discovery lives in [`crate::discovery`]. Every source re-derives item
//! identity from the URL, so a hand-edited or stale list cannot smuggle in a
//! wrong identifier.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use harvest_common::{is_platform_url, HarvestError, ItemReference};

use crate::store::export::GROUP_HEADER;
use crate::store::persist::UTF8_BOM;
use crate::traits::ItemSource;

/// Group label for items read from a list without group headers.
pub const DEFAULT_IMPORT_LABEL: &str = "imported";

/// Group label for operator-supplied URLs.
pub const MANUAL_LABEL: &str = "manual";

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Items sharing one group label, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGroup {
    pub label: String,
    pub items: Vec<ItemReference>,
}

impl ItemGroup {
    pub fn new(label: impl Into<String>, items: Vec<ItemReference>) -> Self {
        Self {
            label: label.into(),
            items,
        }
    }
}

/// Partition items by `key`. Groups appear in first-appearance order and items
/// keep their input order inside each group.
pub fn group_items<F>(items: Vec<ItemReference>, key: F) -> Vec<ItemGroup>
where
    F: Fn(&ItemReference) -> String,
{
    let mut groups: Vec<ItemGroup> = Vec::new();
    for item in items {
        let label = key(&item);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.items.push(item),
            None => groups.push(ItemGroup::new(label, vec![item])),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// ManualUrls
// ---------------------------------------------------------------------------

/// URLs typed by the operator. Anything that is not a platform URL is dropped.
pub struct ManualUrls {
    urls: Vec<String>,
    group_label: String,
}

impl ManualUrls {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            group_label: MANUAL_LABEL.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.group_label = label.into();
        self
    }
}

#[async_trait]
impl ItemSource for ManualUrls {
    fn name(&self) -> String {
        format!("{} manual URL(s)", self.urls.len())
    }

    async fn items(&self) -> Result<Vec<ItemReference>> {
        let mut items = Vec::new();
        for url in self.urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            if !is_platform_url(url) {
                warn!(url, "Skipping URL that is not a video platform URL");
                continue;
            }
            let seq = items.len() as u32 + 1;
            items.push(ItemReference::from_url(url, seq, self.group_label.as_str()));
        }
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// ItemListFile
// ---------------------------------------------------------------------------

/// A previously exported (or hand-written) list of items.
///
/// `.json`: an array of items, `{"items": [...]}`, or a discovery export with a
/// `details` map of label → items. `.csv`: item rows as written by the
/// discovery export. `.txt`: one URL per line; `#` starts a comment and
/// `# group: <label>` switches the label for the lines that follow.
pub struct ItemListFile {
    path: PathBuf,
}

impl ItemListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> harvest_common::Result<Vec<ItemReference>> {
        let format = ListFormat::from_path(&self.path)
            .ok_or_else(|| HarvestError::UnsupportedFormat(self.path.display().to_string()))?;

        let bytes = std::fs::read(&self.path).map_err(|e| HarvestError::item_source(&self.path, e))?;
        let text = String::from_utf8_lossy(strip_bom(&bytes));
        let items = match format {
            ListFormat::Json => parse_json_list(&text),
            ListFormat::Csv => parse_csv_list(&text),
            ListFormat::Text => Ok(parse_text_list(&text)),
        }
        .map_err(|e| HarvestError::item_source(&self.path, e))?;

        Ok(items.into_iter().map(ItemReference::rederived).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListFormat {
    Json,
    Csv,
    Text,
}

impl ListFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

#[async_trait]
impl ItemSource for ItemListFile {
    fn name(&self) -> String {
        format!("item list {}", self.path.display())
    }

    async fn items(&self) -> Result<Vec<ItemReference>> {
        let items = self.load()?;
        info!(path = %self.path.display(), items = items.len(), "Item list loaded");
        Ok(items)
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

#[derive(Deserialize)]
struct ItemsDocument {
    items: Vec<ItemReference>,
}

fn parse_json_list(text: &str) -> std::result::Result<Vec<ItemReference>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(|e| e.to_string()),
        Value::Object(ref fields) if fields.contains_key("items") => {
            let doc: ItemsDocument = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(doc.items)
        }
        Value::Object(mut fields) => match fields.remove("details") {
            Some(Value::Object(details)) => {
                let mut items = Vec::new();
                for (label, group) in details {
                    let group: Vec<ItemReference> =
                        serde_json::from_value(group).map_err(|e| format!("group {label}: {e}"))?;
                    items.extend(group.into_iter().map(|mut item| {
                        if item.group_label.is_empty() {
                            item.group_label = label.clone();
                        }
                        item
                    }));
                }
                Ok(items)
            }
            _ => Err("expected an item array, `items`, or a `details` map".to_string()),
        },
        _ => Err("expected an item array, `items`, or a `details` map".to_string()),
    }
}

fn parse_csv_list(text: &str) -> std::result::Result<Vec<ItemReference>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<ItemReference>, _>>()
        .map_err(|e| e.to_string())
}

fn parse_text_list(text: &str) -> Vec<ItemReference> {
    let mut label = DEFAULT_IMPORT_LABEL.to_string();
    let mut items = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(GROUP_HEADER) {
            let rest = rest.trim();
            label = if rest.is_empty() {
                DEFAULT_IMPORT_LABEL.to_string()
            } else {
                rest.to_string()
            };
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let seq = items.len() as u32 + 1;
        items.push(ItemReference::from_url(line, seq, label.as_str()));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_common::ItemKind;

    fn item(seq: u32, label: &str) -> ItemReference {
        ItemReference::from_url(format!("https://youtu.be/id{seq}"), seq, label)
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let items = vec![item(1, "b"), item(2, "a"), item(3, "b"), item(4, "c")];
        let groups = group_items(items, |i| i.group_label.clone());

        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["b", "a", "c"]);
        let seqs: Vec<u32> = groups[0].items.iter().map(|i| i.sequence_number).collect();
        assert_eq!(seqs, [1, 3]);
    }

    #[test]
    fn text_list_switches_groups_and_skips_comments() {
        let text = "https://youtu.be/first\n\
                    # a note\n\
                    # group: cats\n\
                    https://www.youtube.com/shorts/sh1?x=1\n\
                    \n\
                    # group: dogs\n\
                    https://www.youtube.com/watch?v=w1&t=2\n";
        let items = parse_text_list(text);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].group_label, DEFAULT_IMPORT_LABEL);
        assert_eq!(items[1].group_label, "cats");
        assert_eq!(items[1].kind, ItemKind::ShortForm);
        assert_eq!(items[2].group_label, "dogs");
        assert_eq!(items[2].id(), Some("w1"));
        assert_eq!(items[2].sequence_number, 3);
    }

    #[test]
    fn json_list_accepts_all_shapes() {
        let array = r#"[{"sequence_number": 1, "title": "a", "url": "https://youtu.be/a1"}]"#;
        assert_eq!(parse_json_list(array).unwrap().len(), 1);

        let wrapped = r#"{"items": [{"sequence_number": 1, "title": "a", "url": "https://youtu.be/a1"}]}"#;
        assert_eq!(parse_json_list(wrapped).unwrap().len(), 1);

        let export = r#"{
            "summary": {"total_groups": 2},
            "details": {
                "cats": [{"sequence_number": 1, "title": "a", "url": "https://youtu.be/a1"}],
                "dogs": [{"sequence_number": 1, "title": "b", "url": "https://youtu.be/b1", "group_label": "dogs"}]
            }
        }"#;
        let items = parse_json_list(export).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].group_label, "cats");
        assert_eq!(items[1].group_label, "dogs");
    }

    #[test]
    fn json_list_rejects_other_shapes() {
        assert!(parse_json_list(r#"{"videos": []}"#).is_err());
        assert!(parse_json_list("42").is_err());
        assert!(parse_json_list("not json").is_err());
    }

    #[tokio::test]
    async fn manual_urls_filter_and_number() {
        let source = ManualUrls::new(vec![
            "https://www.youtube.com/watch?v=abc".into(),
            "https://vimeo.com/1".into(),
            "  ".into(),
            "https://youtu.be/def".into(),
        ]);
        let items = source.items().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Video_abc");
        assert_eq!(items[1].sequence_number, 2);
        assert_eq!(items[1].group_label, MANUAL_LABEL);
    }

    #[tokio::test]
    async fn list_file_rederives_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("items.json");
        std::fs::write(
            &path,
            r#"[{"sequence_number": 1, "title": "t", "url": "https://youtu.be/real", "item_id": "stale", "kind": "short_form"}]"#,
        )
        .unwrap();

        let items = ItemListFile::new(&path).items().await.unwrap();
        assert_eq!(items[0].id(), Some("real"));
        assert_eq!(items[0].kind, ItemKind::Primary);
    }

    #[tokio::test]
    async fn list_file_tolerates_bom() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("items.txt");
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"https://youtu.be/x1\n");
        std::fs::write(&path, bytes).unwrap();

        let items = ItemListFile::new(&path).items().await.unwrap();
        assert_eq!(items[0].id(), Some("x1"));
    }

    #[tokio::test]
    async fn unsupported_extension_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("items.xml");
        std::fs::write(&path, "<items/>").unwrap();

        let err = ItemListFile::new(&path).load().unwrap_err();
        assert!(matches!(err, HarvestError::UnsupportedFormat(_)));
    }
}
