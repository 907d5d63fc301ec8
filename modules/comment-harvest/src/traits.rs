// Trait seams for the harvest pipeline.
//
// CommentRetriever: one downloader run per item (real: CommentFetcher).
// ItemSource: where a batch gets its items (manual URLs, list files, discovery).
// Discoverer: keyword → candidate items (real: CommandDiscoverer).
//
// MockRetriever and MockDiscoverer in `testing` stand in for the external
// programs, so the orchestrators are tested without a Python toolchain.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use comment_fetcher::{CommentFetcher, FetchRequest};
use harvest_common::ItemReference;

// ---------------------------------------------------------------------------
// CommentRetriever
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CommentRetriever: Send + Sync {
    /// Write the raw payload for `request.item_id` to `request.output`.
    async fn retrieve(&self, request: &FetchRequest) -> comment_fetcher::Result<PathBuf>;
}

#[async_trait]
impl CommentRetriever for CommentFetcher {
    async fn retrieve(&self, request: &FetchRequest) -> comment_fetcher::Result<PathBuf> {
        self.fetch(request).await
    }
}

// ---------------------------------------------------------------------------
// ItemSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Short description for logs and the audit header.
    fn name(&self) -> String;

    /// Items in processing order. Group labels are already set.
    async fn items(&self) -> Result<Vec<ItemReference>>;
}

// ---------------------------------------------------------------------------
// Discoverer
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Candidate items for one keyword. Sequence numbers and labels are
    /// assigned by the caller.
    async fn discover(
        &self,
        keyword: &str,
        max_results: usize,
        scroll_times: u32,
    ) -> Result<Vec<ItemReference>>;
}
