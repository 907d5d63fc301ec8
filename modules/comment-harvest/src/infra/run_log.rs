//! Audit log: a plain-text timeline of one batch run.
//!
//! One file per run under `{output}/logs/`. The header is written on create,
//! then one multi-line entry per processed item, group headers and footers in
//! grouped mode, and a single summary block at the end. Every write is flushed
//! so an interrupted run leaves a complete record of the items it finished.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use uuid::Uuid;

use harvest_common::{ItemReference, OutputFormat};

use crate::infra::util::{display_timestamp, file_timestamp, unique_path};
use crate::pipeline::item::{ItemFailure, ItemOutput, ItemSuccess};
use crate::pipeline::stats::{GroupResult, RunResult};

const SEPARATOR: &str = "------------------------------------------------------------";
const RULE: &str = "============================================================";

/// What the header line block describes.
pub struct RunHeader<'a> {
    pub run_id: Uuid,
    pub source: &'a str,
    pub mode: &'a str,
    pub total_items: usize,
    pub format: OutputFormat,
}

pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create `download_log_{ts}.txt` in `logs_dir` and write the header.
    /// Runs started in the same second get `_2`, `_3`, ... so no two runs
    /// share a file.
    pub fn create(logs_dir: &Path, header: &RunHeader<'_>) -> Result<Self> {
        let stem = format!("download_log_{}", file_timestamp());
        let (path, file) = loop {
            let path = unique_path(logs_dir, &stem, "txt");
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                // Taken between the existence check and the open.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create audit log {}", path.display()))
                }
            }
        };

        let mut log = Self { path, file };
        log.write(&format!(
            "{RULE}\n\
             Comment harvest run {}\n\
             started: {}\n\
             source: {}\n\
             mode: {}\n\
             items: {}\n\
             format: {}\n\
             {RULE}\n\n",
            header.run_id,
            display_timestamp(),
            header.source,
            header.mode,
            header.total_items,
            header.format,
        ))?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn group_started(&mut self, index: usize, total: usize, label: &str, items: usize) -> Result<()> {
        self.write(&format!(
            "{RULE}\n[{}] group {index}/{total}: {label} ({items} items)\n{RULE}\n\n",
            display_timestamp()
        ))
    }

    /// One entry per processed item, success or failure.
    pub fn item(
        &mut self,
        position: usize,
        total: usize,
        item: &ItemReference,
        outcome: &std::result::Result<ItemSuccess, ItemFailure>,
        elapsed: Duration,
    ) -> Result<()> {
        let mut entry = format!(
            "[{}] item {position}/{total}: {}\n\
             item_id: {}\n\
             url: {}\n\
             group: {}\n",
            display_timestamp(),
            item.title,
            item.display_id(),
            item.url,
            item.group_label,
        );

        match outcome {
            Ok(success) => {
                entry.push_str("status: succeeded\n");
                entry.push_str(&format!("records: {}\n", success.records));
                if success.skipped > 0 {
                    entry.push_str(&format!("skipped: {}\n", success.skipped));
                }
                if success.repaired {
                    entry.push_str("repaired: truncated payload\n");
                }
                let output = match &success.output {
                    ItemOutput::Written(Some(path)) => path.display().to_string(),
                    ItemOutput::Written(None) => "none (no records)".to_string(),
                    ItemOutput::Collected(_) => "collected into group file".to_string(),
                };
                entry.push_str(&format!("output: {output}\n"));
            }
            Err(failure) => {
                entry.push_str("status: failed\n");
                entry.push_str(&format!("reason: {failure}\n"));
            }
        }

        entry.push_str(&format!("duration: {:.2}s\n{SEPARATOR}\n", elapsed.as_secs_f64()));
        self.write(&entry)
    }

    pub fn group_finished(&mut self, group: &GroupResult) -> Result<()> {
        let output = match (&group.output_file, &group.persist_error) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(err)) => format!("write failed: {err}"),
            (None, None) => "none (no records)".to_string(),
        };
        self.write(&format!(
            "group finished: {}\n\
             items: {} (succeeded {}, failed {})\n\
             records: {}\n\
             output: {output}\n\n",
            group.group_label, group.total_items, group.succeeded, group.failed, group.total_records,
        ))
    }

    /// The trailing summary block. Written once per run.
    pub fn finish(&mut self, result: &RunResult) -> Result<()> {
        let mut block = format!(
            "\n{RULE}\n\
             Batch finished: {}\n\
             total items: {}\n\
             succeeded: {}\n\
             failed: {}\n\
             success rate: {:.1}%\n\
             total records: {}\n\
             elapsed: {}s\n",
            display_timestamp(),
            result.total_items,
            result.succeeded,
            result.failed,
            result.success_rate(),
            result.total_records,
            result.elapsed().num_seconds(),
        );
        if !result.failed_items.is_empty() {
            block.push_str("failed items:\n");
            for item in &result.failed_items {
                block.push_str(&format!("  - {} ({})\n", item.display_id(), item.url));
            }
        }
        block.push_str(RULE);
        block.push('\n');
        self.write(&block)
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.file
            .write_all(text.as_bytes())
            .and_then(|_| self.file.flush())
            .with_context(|| format!("Failed to write audit log {}", self.path.display()))
    }
}
