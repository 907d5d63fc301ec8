use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::{HarvestError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root for `comments/`, `logs/` and `urls/`.
    pub output_dir: PathBuf,

    // Retrieval
    pub python_bin: String,
    pub downloader_module: String,
    pub retrieval_timeout: Duration,

    // Discovery (optional external program)
    pub discovery_cmd: Option<String>,
}

pub const DEFAULT_OUTPUT_DIR: &str = "batch_comments_output";
pub const DEFAULT_RETRIEVAL_TIMEOUT_SECS: u64 = 300;

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            output_dir: PathBuf::from(
                env::var("HARVEST_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            python_bin: env::var("HARVEST_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            downloader_module: env::var("HARVEST_DOWNLOADER_MODULE")
                .unwrap_or_else(|_| "youtube_comment_downloader".to_string()),
            retrieval_timeout: Duration::from_secs(parse_env_u64(
                "HARVEST_RETRIEVAL_TIMEOUT_SECS",
                DEFAULT_RETRIEVAL_TIMEOUT_SECS,
            )?),
            discovery_cmd: env::var("HARVEST_DISCOVERY_CMD")
                .ok()
                .filter(|cmd| !cmd.trim().is_empty()),
        })
    }

    /// Arguments placed before the per-item downloader flags.
    pub fn downloader_args(&self) -> Vec<String> {
        vec!["-m".to_string(), self.downloader_module.clone()]
    }

    pub fn log(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            python = self.python_bin.as_str(),
            module = self.downloader_module.as_str(),
            timeout_secs = self.retrieval_timeout.as_secs(),
            discovery = self.discovery_cmd.as_deref().unwrap_or("(none)"),
            "Loaded harvest config"
        );
    }
}

fn parse_env_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => parse_u64(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| HarvestError::Config(format!("{key} must be a whole number, got {raw:?}")))
}
