//! Sequential batch runs over many items.
//!
//! Items are processed one at a time with a fixed pause between them. Per-item
//! failures are recorded and the run moves on; only losing the output
//! directories or the audit log aborts a run.
//!
//! Flat mode writes one file per item. Grouped mode partitions items by a key,
//! merges each group's records in memory and writes one file per group when
//! the group is done.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use harvest_common::{CommentRecord, ItemReference, OutputFormat};

use crate::infra::run_log::{RunHeader, RunLog};
use crate::infra::util::{clip, file_timestamp, safe_group_label, unique_path};
use crate::pipeline::item::{
    Harvester, ItemFailure, ItemOutput, ItemOutputMode, ItemSuccess, RetrievalSettings,
};
use crate::pipeline::stats::{GroupResult, RunResult, Tally};
use crate::sources::{group_items, ItemGroup};
use crate::store::persist;
use crate::traits::{CommentRetriever, ItemSource};

/// Pause between consecutive items.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_secs(2);

/// Maps an item to the label of the group it belongs to.
pub type GroupKey = Arc<dyn Fn(&ItemReference) -> String + Send + Sync>;

/// How a run partitions its items.
#[derive(Clone)]
pub enum Grouping {
    /// One output file per item.
    Flat,
    /// One merged output file per distinct key, in first-appearance order.
    ByKey(GroupKey),
}

impl Grouping {
    /// Group by each item's own `group_label`.
    pub fn by_label() -> Self {
        Self::by_key(|item: &ItemReference| item.group_label.clone())
    }

    pub fn by_key<F>(key: F) -> Self
    where
        F: Fn(&ItemReference) -> String + Send + Sync + 'static,
    {
        Grouping::ByKey(Arc::new(key))
    }
}

impl fmt::Debug for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Flat => f.write_str("Flat"),
            Grouping::ByKey(_) => f.write_str("ByKey(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub settings: RetrievalSettings,
    pub format: OutputFormat,
    pub grouping: Grouping,
    pub item_delay: Duration,
    pub group_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            settings: RetrievalSettings::default(),
            format: OutputFormat::default(),
            grouping: Grouping::Flat,
            item_delay: DEFAULT_ITEM_DELAY,
            group_delay: DEFAULT_ITEM_DELAY,
        }
    }
}

enum Plan {
    Flat(Vec<ItemReference>),
    Grouped(Vec<ItemGroup>),
}

impl Plan {
    fn total_items(&self) -> usize {
        match self {
            Plan::Flat(items) => items.len(),
            Plan::Grouped(groups) => groups.iter().map(|g| g.items.len()).sum(),
        }
    }

    fn mode(&self) -> String {
        match self {
            Plan::Flat(_) => "flat".to_string(),
            Plan::Grouped(groups) => format!("grouped ({} groups)", groups.len()),
        }
    }
}

/// Counters and collections filled while a run executes.
#[derive(Default)]
struct RunState {
    tally: Tally,
    position: usize,
    failed_items: Vec<ItemReference>,
    item_outputs: Vec<PathBuf>,
    groups: Vec<GroupResult>,
}

impl<R: CommentRetriever> Harvester<R> {
    /// Load items from `source` and run them.
    pub async fn run(&self, source: &dyn ItemSource, options: &BatchOptions) -> Result<RunResult> {
        let name = source.name();
        let items = source
            .items()
            .await
            .with_context(|| format!("Failed to load items from {name}"))?;
        self.run_named(&name, items, options).await
    }

    pub async fn run_items(&self, items: Vec<ItemReference>, options: &BatchOptions) -> Result<RunResult> {
        self.run_named("item list", items, options).await
    }

    /// Run pre-partitioned groups as given. `options.grouping` is ignored.
    pub async fn run_groups(&self, groups: Vec<ItemGroup>, options: &BatchOptions) -> Result<RunResult> {
        self.execute("item groups", Plan::Grouped(groups), options).await
    }

    async fn run_named(&self, name: &str, items: Vec<ItemReference>, options: &BatchOptions) -> Result<RunResult> {
        let plan = match &options.grouping {
            Grouping::Flat => Plan::Flat(items),
            Grouping::ByKey(key) => Plan::Grouped(group_items(items, |item| key(item))),
        };
        self.execute(name, plan, options).await
    }

    async fn execute(&self, source: &str, plan: Plan, options: &BatchOptions) -> Result<RunResult> {
        self.layout().ensure()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = plan.total_items();
        let mode = plan.mode();

        let mut log = RunLog::create(
            &self.layout().logs_dir,
            &RunHeader {
                run_id,
                source,
                mode: &mode,
                total_items: total,
                format: options.format,
            },
        )?;
        info!(%run_id, source, mode = mode.as_str(), items = total, log = %log.path().display(), "Batch started");

        let mut state = RunState::default();

        match plan {
            Plan::Flat(items) => {
                let item_mode = ItemOutputMode::PerItemFile(options.format);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        pause(options.item_delay).await;
                    }
                    let outcome = self
                        .process_logged(item, total, item_mode, options, &mut state, &mut log)
                        .await?;
                    match outcome {
                        Ok(success) => {
                            state.tally.record_success(success.records);
                            if let ItemOutput::Written(Some(path)) = success.output {
                                state.item_outputs.push(path);
                            }
                        }
                        Err(_) => {
                            state.tally.record_failure();
                            state.failed_items.push(item.clone());
                        }
                    }
                }
            }
            Plan::Grouped(groups) => {
                let group_count = groups.len();
                for (g, group) in groups.iter().enumerate() {
                    if g > 0 {
                        pause(options.group_delay).await;
                    }
                    info!(group = group.label.as_str(), items = group.items.len(), "Group started");
                    log.group_started(g + 1, group_count, &group.label, group.items.len())?;

                    let mut tally = Tally::default();
                    let mut records: Vec<CommentRecord> = Vec::new();
                    for (i, item) in group.items.iter().enumerate() {
                        if i > 0 {
                            pause(options.item_delay).await;
                        }
                        let outcome = self
                            .process_logged(item, total, ItemOutputMode::Collect, options, &mut state, &mut log)
                            .await?;
                        match outcome {
                            Ok(success) => {
                                tally.record_success(success.records);
                                if let ItemOutput::Collected(collected) = success.output {
                                    records.extend(collected);
                                }
                            }
                            Err(_) => {
                                tally.record_failure();
                                state.failed_items.push(item.clone());
                            }
                        }
                    }

                    state.tally.absorb(&tally);
                    let result = self.finish_group(&group.label, tally, &records, options.format);
                    log.group_finished(&result)?;
                    state.groups.push(result);
                }
            }
        }

        let result = RunResult {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total_items: state.tally.total(),
            succeeded: state.tally.succeeded,
            failed: state.tally.failed,
            total_records: state.tally.records,
            failed_items: state.failed_items,
            item_outputs: state.item_outputs,
            log_file: log.path().to_path_buf(),
            groups: state.groups,
        };
        log.finish(&result)?;

        info!(
            %run_id,
            succeeded = result.succeeded,
            failed = result.failed,
            records = result.total_records,
            "Batch finished"
        );
        Ok(result)
    }

    /// Process one item and append its audit entry. The outer error is a
    /// log write failure; the inner result is the item's own outcome.
    async fn process_logged(
        &self,
        item: &ItemReference,
        total: usize,
        mode: ItemOutputMode,
        options: &BatchOptions,
        state: &mut RunState,
        log: &mut RunLog,
    ) -> Result<std::result::Result<ItemSuccess, ItemFailure>> {
        state.position += 1;
        let position = state.position;
        info!(
            position,
            total,
            item_id = item.display_id(),
            title = clip(&item.title, 60),
            "Processing item"
        );

        let started = Instant::now();
        let outcome = self.process_item(item, &options.settings, mode).await;
        if let Err(failure) = &outcome {
            warn!(position, item_id = item.display_id(), error = %failure, "Item failed");
        }

        log.item(position, total, item, &outcome, started.elapsed())?;
        Ok(outcome)
    }

    fn finish_group(
        &self,
        label: &str,
        tally: Tally,
        records: &[CommentRecord],
        format: OutputFormat,
    ) -> GroupResult {
        let mut result = GroupResult::new(label, tally);
        if records.is_empty() {
            info!(group = label, "Group yielded no records, nothing written");
            return result;
        }

        // Two labels can reduce to the same safe name within one second.
        let destination = unique_path(
            &self.layout().comments_dir,
            &format!("comments_{}_{}", safe_group_label(label), file_timestamp()),
            format.extension(),
        );
        match persist(records, &destination, format) {
            Ok(true) => result.output_file = Some(destination),
            Ok(false) => {}
            Err(e) => {
                error!(group = label, error = %e, "Failed to write group records");
                result.persist_error = Some(e.to_string());
            }
        }
        result
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_label_uses_group_label() {
        let item = ItemReference::from_url("https://youtu.be/a", 1, "cats");
        match Grouping::by_label() {
            Grouping::ByKey(key) => assert_eq!(key(&item), "cats"),
            Grouping::Flat => panic!("expected keyed grouping"),
        }
    }

    #[test]
    fn key_function_can_capture_state() {
        let prefix = String::from("topic-");
        let grouping = Grouping::by_key(move |item: &ItemReference| format!("{prefix}{}", item.group_label));
        let item = ItemReference::from_url("https://youtu.be/a", 1, "cats");
        match grouping {
            Grouping::ByKey(key) => assert_eq!(key(&item), "topic-cats"),
            Grouping::Flat => panic!("expected keyed grouping"),
        }
    }

    #[test]
    fn default_options() {
        let options = BatchOptions::default();
        assert_eq!(options.item_delay, Duration::from_secs(2));
        assert_eq!(options.group_delay, options.item_delay);
        assert_eq!(options.settings.limit, 1000);
        assert!(matches!(options.grouping, Grouping::Flat));
    }
}
