// Test mocks for the harvest pipeline.
//
// - MockRetriever (CommentRetriever): item id → canned downloader outcome
// - MockDiscoverer (Discoverer): keyword → canned search results
//
// Plus payload builders shaped like the downloader's `--pretty` output.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;

use comment_fetcher::{FetchError, FetchRequest};
use harvest_common::ItemReference;

use crate::traits::{CommentRetriever, Discoverer};

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

fn comment_json(i: usize) -> serde_json::Value {
    json!({
        "cid": format!("c{i}"),
        "text": format!("comment number {i}"),
        "time": format!("{i} days ago"),
        "author": format!("@user{i}"),
        "channel": format!("UC{i:04}"),
        "votes": format!("{},{:03}", i + 1, i),
        "replies": i.to_string(),
        "photo": format!("https://yt3.example/{i}.jpg"),
        "heart": i % 2 == 0,
        "reply": false,
        "time_parsed": 1_700_000_000.0 + i as f64,
        "pinned": i == 0,
        "author_is_uploader": false,
    })
}

/// Pretty `{"comments": [...]}` payload with `n` complete comments.
pub fn comments_payload(n: usize) -> String {
    let comments: Vec<_> = (0..n).map(comment_json).collect();
    serde_json::to_string_pretty(&json!({ "comments": comments })).unwrap_or_default()
}

/// Bare-array payload with `n` complete comments.
pub fn array_payload(n: usize) -> String {
    let comments: Vec<_> = (0..n).map(comment_json).collect();
    serde_json::to_string_pretty(&comments).unwrap_or_default()
}

/// A `{"comments": [...]}` payload cut off inside comment `n + 1`, as left
/// behind by a downloader killed mid-write.
pub fn truncated_payload(n: usize) -> String {
    let full = comments_payload(n + 1);
    let marker = format!("\"cid\": \"c{n}\"");
    match full.find(&marker) {
        Some(pos) => full[..pos + marker.len()].to_string(),
        None => full,
    }
}

/// Expected like count of comment `i` in the builders above.
pub fn expected_likes(i: usize) -> u64 {
    ((i + 1) * 1000 + i) as u64
}

// ---------------------------------------------------------------------------
// MockRetriever
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Outcome {
    Payload(String),
    Failure { code: Option<i32>, stderr: String },
    Timeout { partial: Option<String> },
}

/// Item-id-keyed stand-in for the downloader. Unregistered ids fail with
/// exit status 1. Builder pattern: `.on_payload()`, `.on_failure()`,
/// `.on_timeout()`, `.on_truncated_timeout()`.
#[derive(Default)]
pub struct MockRetriever {
    outcomes: HashMap<String, Outcome>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl MockRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit cleanly after writing `payload`.
    pub fn on_payload(mut self, item_id: &str, payload: impl Into<String>) -> Self {
        self.outcomes
            .insert(item_id.to_string(), Outcome::Payload(payload.into()));
        self
    }

    /// Exit with a non-zero status and write nothing.
    pub fn on_failure(mut self, item_id: &str, code: i32, stderr: &str) -> Self {
        self.outcomes.insert(
            item_id.to_string(),
            Outcome::Failure {
                code: Some(code),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Time out without writing anything.
    pub fn on_timeout(mut self, item_id: &str) -> Self {
        self.outcomes
            .insert(item_id.to_string(), Outcome::Timeout { partial: None });
        self
    }

    /// Time out after writing a partial payload.
    pub fn on_truncated_timeout(mut self, item_id: &str, partial: impl Into<String>) -> Self {
        self.outcomes.insert(
            item_id.to_string(),
            Outcome::Timeout {
                partial: Some(partial.into()),
            },
        );
        self
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Item ids requested, in order.
    pub fn requested_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.item_id).collect()
    }
}

#[async_trait]
impl CommentRetriever for MockRetriever {
    async fn retrieve(&self, request: &FetchRequest) -> comment_fetcher::Result<PathBuf> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let write = |text: &str| {
            std::fs::write(&request.output, text).map_err(|e| FetchError::Launch(e.to_string()))
        };

        match self.outcomes.get(&request.item_id) {
            Some(Outcome::Payload(payload)) => {
                write(payload)?;
                Ok(request.output.clone())
            }
            Some(Outcome::Failure { code, stderr }) => Err(FetchError::Failed {
                code: *code,
                stderr: stderr.clone(),
            }),
            Some(Outcome::Timeout { partial }) => {
                if let Some(partial) = partial {
                    write(partial)?;
                }
                Err(FetchError::Timeout(Duration::from_secs(300)))
            }
            None => Err(FetchError::Failed {
                code: Some(1),
                stderr: format!("no mock outcome for {}", request.item_id),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MockDiscoverer
// ---------------------------------------------------------------------------

/// Keyword-keyed search results. Unregistered keywords return no items.
#[derive(Default)]
pub struct MockDiscoverer {
    results: HashMap<String, Vec<(String, String)>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `results` are (title, url) pairs.
    pub fn on_keyword(mut self, keyword: &str, results: &[(&str, &str)]) -> Self {
        self.results.insert(
            keyword.to_string(),
            results
                .iter()
                .map(|(t, u)| (t.to_string(), u.to_string()))
                .collect(),
        );
        self
    }

    pub fn failing(mut self, keyword: &str) -> Self {
        self.failing.insert(keyword.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Discoverer for MockDiscoverer {
    async fn discover(
        &self,
        keyword: &str,
        _max_results: usize,
        _scroll_times: u32,
    ) -> Result<Vec<ItemReference>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(keyword.to_string());
        }
        if self.failing.contains(keyword) {
            bail!("search page for {keyword:?} did not load");
        }

        Ok(self
            .results
            .get(keyword)
            .map(|results| {
                results
                    .iter()
                    .enumerate()
                    .map(|(i, (title, url))| ItemReference::new(i as u32 + 1, title, url, ""))
                    .collect()
            })
            .unwrap_or_default())
    }
}
