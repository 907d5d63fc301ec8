pub mod error;
pub mod types;

pub use error::{FetchError, Result};
pub use types::{FetchRequest, SortMode};

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Wall-clock budget for one downloader run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs the external comment downloader once per item.
///
/// The downloader writes its JSON payload to the requested output path and
/// signals the result through its exit status. This client never retries and
/// never reads the payload; a timed-out run is killed and may leave a
/// truncated file behind.
pub struct CommentFetcher {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl CommentFetcher {
    /// `base_args` go before the per-item flags, e.g. `["-m", "youtube_comment_downloader"]`.
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download comments for one item into `request.output`.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf> {
        info!(
            item_id = request.item_id.as_str(),
            limit = request.limit,
            sort = %request.sort,
            "Starting comment download"
        );
        let started = Instant::now();

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(request.args())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                info!(
                    item_id = request.item_id.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Comment download finished"
                );
                Ok(request.output.clone())
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!(
                    item_id = request.item_id.as_str(),
                    code = ?output.status.code(),
                    stderr = %stderr,
                    "Downloader exited with error"
                );
                Err(FetchError::Failed {
                    code: output.status.code(),
                    stderr,
                })
            }
            Ok(Err(e)) => {
                warn!(program = self.program.as_str(), error = %e, "Failed to launch downloader");
                Err(FetchError::Launch(e.to_string()))
            }
            Err(_) => {
                warn!(
                    item_id = request.item_id.as_str(),
                    timeout_secs = self.timeout.as_secs(),
                    "Downloader timed out"
                );
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }
}
