use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use comment_fetcher::{FetchError, FetchRequest, SortMode};
use harvest_common::{CommentRecord, HarvestError, ItemReference, OutputFormat};

use crate::infra::util::{safe_id, safe_title};
use crate::pipeline::reconcile::reconcile;
use crate::store::{persist, OutputLayout};
use crate::traits::CommentRetriever;

/// Comments requested per item unless the operator says otherwise.
pub const DEFAULT_LIMIT: u32 = 1000;

/// Downloader parameters shared by every item of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSettings {
    pub limit: u32,
    pub sort: SortMode,
    pub locale: Option<String>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sort: SortMode::default(),
            locale: None,
        }
    }
}

/// Where an item's records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutputMode {
    /// Write `{id}_{title}.{ext}` next to the other comment files.
    PerItemFile(OutputFormat),
    /// Hand the records back for the caller to merge.
    Collect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutput {
    /// `None` when there were no records to write.
    Written(Option<PathBuf>),
    Collected(Vec<CommentRecord>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSuccess {
    pub records: usize,
    pub skipped: usize,
    pub repaired: bool,
    pub output: ItemOutput,
}

#[derive(Error, Debug)]
pub enum ItemFailure {
    #[error("No item identifier in URL {0}")]
    InvalidIdentifier(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] FetchError),

    #[error("Payload unreadable: {0}")]
    PayloadUnreadable(String),

    #[error("Payload rejected: {0}")]
    PayloadRejected(String),

    #[error(transparent)]
    Persistence(#[from] HarvestError),
}

/// Runs items through retrieval, reconciliation and (in flat mode) persistence.
pub struct Harvester<R> {
    retriever: R,
    layout: OutputLayout,
}

impl<R: CommentRetriever> Harvester<R> {
    pub fn new(retriever: R, layout: OutputLayout) -> Self {
        Self { retriever, layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    /// Process one item. Failures are values; nothing here aborts a batch.
    pub async fn process_item(
        &self,
        item: &ItemReference,
        settings: &RetrievalSettings,
        mode: ItemOutputMode,
    ) -> Result<ItemSuccess, ItemFailure> {
        let Some(item_id) = item.id() else {
            warn!(url = item.url.as_str(), "No item identifier, skipping retrieval");
            return Err(ItemFailure::InvalidIdentifier(item.url.clone()));
        };

        let base_name = format!("{}_{}", safe_id(item_id), safe_title(&item.title));
        let transient = TransientPayload::claim(
            self.layout
                .comments_dir
                .join(format!("{base_name}_temp.json")),
        );

        let request = FetchRequest {
            item_id: item_id.to_string(),
            limit: settings.limit,
            sort: settings.sort,
            locale: settings.locale.clone(),
            output: transient.path().to_path_buf(),
        };
        let payload_path = self.retriever.retrieve(&request).await?;

        let bytes = tokio::fs::read(&payload_path)
            .await
            .map_err(|e| ItemFailure::PayloadUnreadable(format!("{}: {e}", payload_path.display())))?;
        let raw = String::from_utf8_lossy(&bytes);

        let reconciliation = reconcile(&raw, item);
        if let Some(reason) = reconciliation.rejection {
            return Err(ItemFailure::PayloadRejected(reason));
        }

        let records = reconciliation.records;
        let count = records.len();
        let output = match mode {
            ItemOutputMode::PerItemFile(format) => {
                let destination = self
                    .layout
                    .comments_dir
                    .join(format!("{base_name}.{}", format.extension()));
                let written = persist(&records, &destination, format)?;
                ItemOutput::Written(written.then_some(destination))
            }
            ItemOutputMode::Collect => ItemOutput::Collected(records),
        };

        info!(
            item_id,
            records = count,
            skipped = reconciliation.skipped,
            repaired = reconciliation.repaired,
            "Item harvested"
        );

        Ok(ItemSuccess {
            records: count,
            skipped: reconciliation.skipped,
            repaired: reconciliation.repaired,
            output,
        })
    }
}

/// Owns the transient payload path for one item and removes the file when
/// dropped, on every exit path of [`Harvester::process_item`].
struct TransientPayload {
    path: PathBuf,
}

impl TransientPayload {
    /// A leftover from an earlier interrupted run is removed up front so it
    /// cannot be mistaken for this run's payload.
    fn claim(path: PathBuf) -> Self {
        remove_quietly(&path);
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientPayload {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed transient payload"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove transient payload"),
    }
}
