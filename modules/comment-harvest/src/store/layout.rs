use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory layout under the output root.
///
/// ```text
/// {root}/comments/   per-item and per-group record files, transient payloads
/// {root}/logs/       audit logs
/// {root}/urls/       discovery exports and failed-item lists
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub comments_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub urls_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            comments_dir: root.join("comments"),
            logs_dir: root.join("logs"),
            urls_dir: root.join("urls"),
            root,
        }
    }

    /// Build the layout and create every directory in it.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = Self::new(root);
        layout.ensure()?;
        Ok(layout)
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.comments_dir, &self.logs_dir, &self.urls_dir] {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}
