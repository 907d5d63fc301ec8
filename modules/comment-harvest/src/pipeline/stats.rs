use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use harvest_common::ItemReference;

/// Running counters for one run or one group. Owned by the run that fills it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: u32,
    pub failed: u32,
    pub records: usize,
}

impl Tally {
    pub fn record_success(&mut self, records: usize) {
        self.succeeded += 1;
        self.records += records;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.succeeded + self.failed
    }

    /// Percentage of items that succeeded; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        success_rate(self.succeeded, self.total())
    }

    pub fn absorb(&mut self, other: &Tally) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.records += other.records;
    }
}

fn success_rate(succeeded: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        succeeded as f64 / total as f64 * 100.0
    }
}

/// Outcome of one group in a grouped run.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub group_label: String,
    pub total_items: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub total_records: usize,
    /// Absent when the group yielded no records or its write failed.
    pub output_file: Option<PathBuf>,
    pub persist_error: Option<String>,
}

impl GroupResult {
    pub fn new(group_label: impl Into<String>, tally: Tally) -> Self {
        Self {
            group_label: group_label.into(),
            total_items: tally.total(),
            succeeded: tally.succeeded,
            failed: tally.failed,
            total_records: tally.records,
            output_file: None,
            persist_error: None,
        }
    }

    pub fn success_rate(&self) -> f64 {
        success_rate(self.succeeded, self.total_items)
    }
}

/// Everything a batch run produced. Built once, at the end of the run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_items: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub total_records: usize,
    /// In processing order.
    pub failed_items: Vec<ItemReference>,
    /// Per-item files written in flat mode.
    pub item_outputs: Vec<PathBuf>,
    pub log_file: PathBuf,
    /// Empty in flat mode.
    pub groups: Vec<GroupResult>,
}

impl RunResult {
    pub fn success_rate(&self) -> f64 {
        success_rate(self.succeeded, self.total_items)
    }

    pub fn is_grouped(&self) -> bool {
        !self.groups.is_empty()
    }

    pub fn group(&self, label: &str) -> Option<&GroupResult> {
        self.groups.iter().find(|g| g.group_label == label)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
