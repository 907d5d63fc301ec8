use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    #[error("Failed to read item list {path}: {message}")]
    ItemSource { path: PathBuf, message: String },

    #[error("Unsupported item list format: {0}")]
    UnsupportedFormat(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl HarvestError {
    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        HarvestError::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn item_source(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        HarvestError::ItemSource {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
