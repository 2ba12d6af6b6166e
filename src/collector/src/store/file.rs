//! JSON file backed collaborators.
//!
//! The activity snapshot is a JSON array of [`ActivityRecord`]s. Deletes
//! rewrite the whole file through a temporary file in the same directory
//! followed by a rename, so readers never observe a partially written
//! snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::model::ActivityRecord;
use tokio::sync::Mutex;

use super::{ActivityStore, JobRegistry, StoreError, StoreResult};
use crate::jobs::{JobNode, flatten_job_names};

/// Activity store persisted as a JSON array.
#[derive(Debug)]
pub struct JsonFileActivityStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl JsonFileActivityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StoreResult<Vec<ActivityRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Activity snapshot does not exist");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
            path: self.path.display().to_string(),
            source,
        })
    }

    async fn write(&self, activities: &[ActivityRecord]) -> StoreResult<()> {
        let serialized =
            serde_json::to_vec_pretty(activities).map_err(|source| StoreError::Serialization {
                path: self.path.display().to_string(),
                source,
            })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&path, &serialized))
            .await
            .map_err(|e| StoreError::Unavailable(format!("snapshot writer panicked: {e}")))?
    }
}

fn persist_atomically(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let io_error = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
    temp.write_all(contents).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[async_trait]
impl ActivityStore for JsonFileActivityStore {
    async fn list_activities(&self) -> StoreResult<Vec<ActivityRecord>> {
        self.read().await
    }

    async fn delete_activity(&self, name: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut activities = self.read().await?;
        let index = activities
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        activities.remove(index);

        self.write(&activities).await
    }
}

/// Job registry read from a JSON job tree.
///
/// Unlike the activity snapshot a missing file is an error: an empty
/// registry would mark every activity as orphaned.
#[derive(Debug, Clone)]
pub struct JsonFileJobRegistry {
    path: PathBuf,
}

impl JsonFileJobRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobRegistry for JsonFileJobRegistry {
    async fn list_job_names(&self) -> StoreResult<Vec<String>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let roots: Vec<JobNode> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(flatten_job_names(&roots))
    }
}
