//! Discovery exports and failed-item lists under `{output}/urls/`.
//!
//! All three discovery files share one timestamp so they can be matched up.
//! The `.txt` reference list is also what [`crate::sources::ItemListFile`]
//! reads back, which is how failed items get resubmitted.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::info;

use harvest_common::{HarvestError, ItemReference, Result};

use crate::infra::util::file_timestamp;
use crate::sources::{group_items, ItemGroup};
use crate::store::persist::{write_csv, write_json};

/// Prefix of the line that starts a group block in a reference list.
pub const GROUP_HEADER: &str = "# group:";

/// Paths written by [`export_discovery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryExport {
    pub json: PathBuf,
    /// Absent when there were no items to write.
    pub csv: Option<PathBuf>,
    pub txt: PathBuf,
}

pub fn export_discovery(groups: &[ItemGroup], urls_dir: &Path) -> Result<DiscoveryExport> {
    let ts = file_timestamp();
    let total_items: usize = groups.iter().map(|g| g.items.len()).sum();

    let mut per_group = Map::new();
    let mut details = Map::new();
    for group in groups {
        per_group.insert(group.label.clone(), json!(group.items.len()));
        let items = serde_json::to_value(&group.items).map_err(|e| HarvestError::persistence(urls_dir, e))?;
        details.insert(group.label.clone(), items);
    }

    let document = json!({
        "summary": {
            "total_groups": groups.len(),
            "total_items": total_items,
            "generated_at": Utc::now(),
            "per_group": Value::Object(per_group),
        },
        "details": Value::Object(details),
    });

    let json_path = urls_dir.join(format!("video_urls_{ts}.json"));
    write_json(&document, &json_path)?;

    let csv_path = if total_items > 0 {
        let path = urls_dir.join(format!("video_urls_{ts}.csv"));
        let rows: Vec<&ItemReference> = groups.iter().flat_map(|g| g.items.iter()).collect();
        write_csv(&rows, &path)?;
        Some(path)
    } else {
        None
    };

    let txt_path = urls_dir.join(format!("urls_only_{ts}.txt"));
    write_reference_list(groups, &txt_path)?;

    info!(
        groups = groups.len(),
        items = total_items,
        json = %json_path.display(),
        "Discovery results exported"
    );

    Ok(DiscoveryExport {
        json: json_path,
        csv: csv_path,
        txt: txt_path,
    })
}

/// Plain-text list: a `# group: <label>` line, then one URL per line, with a
/// blank line between groups.
pub fn write_reference_list(groups: &[ItemGroup], path: &Path) -> Result<()> {
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{GROUP_HEADER} {}", group.label);
        for item in &group.items {
            let _ = writeln!(out, "{}", item.url);
        }
    }
    std::fs::write(path, out).map_err(|e| HarvestError::persistence(path, e))
}

/// Write the failed items of a run as a reference list, grouped by label.
/// Returns `None` when nothing failed.
pub fn export_failed_items(items: &[ItemReference], urls_dir: &Path) -> Result<Option<PathBuf>> {
    if items.is_empty() {
        return Ok(None);
    }

    let groups = group_items(items.to_vec(), |item| item.group_label.clone());
    let path = urls_dir.join(format!("failed_items_{}.txt", file_timestamp()));
    write_reference_list(&groups, &path)?;

    info!(items = items.len(), path = %path.display(), "Failed items exported");
    Ok(Some(path))
}
