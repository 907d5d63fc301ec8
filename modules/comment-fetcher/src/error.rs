use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to launch downloader: {0}")]
    Launch(String),

    #[error("Downloader exited with status {}: {stderr}", status_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("Downloader timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

fn status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}
