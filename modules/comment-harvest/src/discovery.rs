//! Keyword discovery: search keywords → grouped candidate items.
//!
//! The search page itself is scraped by an external program
//! ([`CommandDiscoverer`]); this module sequences keywords, labels results and
//! keeps one bad keyword from sinking the rest.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use harvest_common::{HarvestError, ItemReference};

use crate::sources::ItemGroup;
use crate::traits::{Discoverer, ItemSource};

pub const DEFAULT_MAX_RESULTS: usize = 40;
pub const DEFAULT_SCROLL_TIMES: u32 = 5;
/// Pause between consecutive keyword searches.
pub const DEFAULT_KEYWORD_DELAY: Duration = Duration::from_secs(5);

const PLATFORM_ORIGIN: &str = "https://www.youtube.com";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// KeywordDiscovery
// ---------------------------------------------------------------------------

pub struct KeywordDiscovery<D> {
    discoverer: D,
    keywords: Vec<String>,
    max_results: usize,
    scroll_times: u32,
    keyword_delay: Duration,
}

impl<D: Discoverer> KeywordDiscovery<D> {
    pub fn new(discoverer: D, keywords: Vec<String>) -> Self {
        Self {
            discoverer,
            keywords,
            max_results: DEFAULT_MAX_RESULTS,
            scroll_times: DEFAULT_SCROLL_TIMES,
            keyword_delay: DEFAULT_KEYWORD_DELAY,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_scroll_times(mut self, scroll_times: u32) -> Self {
        self.scroll_times = scroll_times;
        self
    }

    pub fn with_keyword_delay(mut self, delay: Duration) -> Self {
        self.keyword_delay = delay;
        self
    }

    /// One group per keyword, in keyword order. A keyword whose search fails
    /// yields an empty group.
    pub async fn discover_groups(&self) -> Vec<ItemGroup> {
        let mut groups = Vec::with_capacity(self.keywords.len());

        for (i, keyword) in self.keywords.iter().enumerate() {
            if i > 0 && !self.keyword_delay.is_zero() {
                tokio::time::sleep(self.keyword_delay).await;
            }

            info!(keyword = keyword.as_str(), max_results = self.max_results, "Searching");
            let found = match self
                .discoverer
                .discover(keyword, self.max_results, self.scroll_times)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    warn!(keyword = keyword.as_str(), error = %e, "Keyword search failed");
                    Vec::new()
                }
            };

            let items: Vec<ItemReference> = found
                .into_iter()
                .take(self.max_results)
                .enumerate()
                .map(|(n, mut item)| {
                    item.sequence_number = n as u32 + 1;
                    item.group_label = keyword.clone();
                    item.rederived()
                })
                .collect();

            info!(keyword = keyword.as_str(), items = items.len(), "Keyword search finished");
            groups.push(ItemGroup::new(keyword.as_str(), items));
        }

        groups
    }
}

#[async_trait]
impl<D: Discoverer> ItemSource for KeywordDiscovery<D> {
    fn name(&self) -> String {
        format!("keyword search: {}", self.keywords.join(", "))
    }

    async fn items(&self) -> Result<Vec<ItemReference>> {
        Ok(self
            .discover_groups()
            .await
            .into_iter()
            .flat_map(|g| g.items)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// CommandDiscoverer
// ---------------------------------------------------------------------------

/// Runs an external search program once per keyword.
///
/// The program gets `--keyword K --max-results N --scrolls S` appended to its
/// configured arguments and prints a JSON array of `{"title", "url"}` objects
/// on stdout.
#[derive(Debug)]
pub struct CommandDiscoverer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    url: String,
}

impl CommandDiscoverer {
    /// Split a whitespace-separated command line, e.g. `python3 -m discover_videos`.
    pub fn from_command_line(command_line: &str) -> harvest_common::Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| HarvestError::Discovery("empty discovery command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout: DISCOVERY_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Discoverer for CommandDiscoverer {
    async fn discover(
        &self,
        keyword: &str,
        max_results: usize,
        scroll_times: u32,
    ) -> Result<Vec<ItemReference>> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--keyword")
            .arg(keyword)
            .arg("--max-results")
            .arg(max_results.to_string())
            .arg("--scrolls")
            .arg(scroll_times.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| HarvestError::Discovery(format!("search for {keyword:?} timed out")))?
            .with_context(|| format!("Failed to launch discovery program {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "discovery program exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        parse_hits(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_hits(stdout: &str) -> Result<Vec<ItemReference>> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(stdout.trim()).context("Discovery output is not a JSON array of {title, url}")?;

    Ok(hits
        .into_iter()
        .filter(|hit| !hit.url.trim().is_empty())
        .enumerate()
        .map(|(i, hit)| {
            let url = absolute_url(hit.url.trim());
            match hit.title.filter(|t| !t.trim().is_empty()) {
                Some(title) => ItemReference::new(i as u32 + 1, title.trim(), url, ""),
                None => ItemReference::from_url(url, i as u32 + 1, ""),
            }
        })
        .collect())
}

/// Search pages link with relative hrefs like `/watch?v=...`.
fn absolute_url(href: &str) -> String {
    if href.starts_with('/') {
        format!("{PLATFORM_ORIGIN}{href}")
    } else {
        href.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_hrefs_get_the_origin() {
        assert_eq!(absolute_url("/watch?v=abc"), "https://www.youtube.com/watch?v=abc");
        assert_eq!(absolute_url("https://youtu.be/x"), "https://youtu.be/x");
    }

    #[test]
    fn hits_parse_into_references() {
        let items = parse_hits(
            r#"[
                {"title": " First ", "url": "/watch?v=a1&pp=x"},
                {"url": "https://www.youtube.com/shorts/s1"},
                {"title": "no url", "url": ""}
            ]"#,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[0].id(), Some("a1"));
        assert_eq!(items[1].title, "Video_s1");
        assert_eq!(items[1].sequence_number, 2);
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(parse_hits("Traceback (most recent call last):").is_err());
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(CommandDiscoverer::from_command_line("   ").is_err());
        let discoverer = CommandDiscoverer::from_command_line("python3 -m finder").unwrap();
        assert_eq!(discoverer.program, "python3");
        assert_eq!(discoverer.args, ["-m", "finder"]);
    }
}
