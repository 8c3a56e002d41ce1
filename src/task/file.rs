//! Task catalog read from a static JSON file.

use super::{project, TaskCatalog, TaskFilter};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default catalog file, relative to the working directory
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";

/// Serves descriptors from a JSON array on disk.
///
/// The file is re-read on every lookup so edits are picked up without a
/// restart. A missing or malformed file is a lookup failure.
#[derive(Debug, Clone)]
pub struct FileTaskCatalog {
    path: PathBuf,
}

impl FileTaskCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TaskCatalog for FileTaskCatalog {
    async fn lookup(&self, filter: &TaskFilter) -> Result<Vec<Value>> {
        let contents = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read task file {}", self.path.display()))?;

        let parsed: Value = serde_json::from_slice(&contents)
            .with_context(|| format!("Failed to parse task file {}", self.path.display()))?;
        let Value::Array(descriptors) = parsed else {
            return Err(anyhow!(
                "Task file {} must contain a JSON array",
                self.path.display()
            ));
        };

        Ok(descriptors
            .into_iter()
            .filter(|d| filter.matches(d))
            .map(project)
            .collect())
    }
}
