use std::sync::Arc;

use async_trait::async_trait;
use common::model::ActivityRecord;
use tokio::sync::Mutex;

use super::{ActivityStore, JobRegistry, ModeDetector, StoreError, StoreResult};

/// In-memory activity store
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityStore {
    activities: Arc<Mutex<Vec<ActivityRecord>>>,
}

impl InMemoryActivityStore {
    pub fn new(activities: Vec<ActivityRecord>) -> Self {
        Self {
            activities: Arc::new(Mutex::new(activities)),
        }
    }

    /// Current contents of the store.
    pub async fn snapshot(&self) -> Vec<ActivityRecord> {
        self.activities.lock().await.clone()
    }

    /// Names of the stored activities, in insertion order.
    pub async fn names(&self) -> Vec<String> {
        self.activities
            .lock()
            .await
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn list_activities(&self) -> StoreResult<Vec<ActivityRecord>> {
        Ok(self.snapshot().await)
    }

    async fn delete_activity(&self, name: &str) -> StoreResult<()> {
        let mut activities = self.activities.lock().await;
        let index = activities
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        activities.remove(index);
        Ok(())
    }
}

/// Job registry with a fixed list of job names
#[derive(Debug, Clone, Default)]
pub struct StaticJobRegistry {
    job_names: Vec<String>,
}

impl StaticJobRegistry {
    pub fn new<I, S>(job_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            job_names: job_names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl JobRegistry for StaticJobRegistry {
    async fn list_job_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.job_names.clone())
    }
}

/// Mode detector with a fixed answer, usually taken from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticModeDetector {
    event_driven: bool,
}

impl StaticModeDetector {
    pub fn new(event_driven: bool) -> Self {
        Self { event_driven }
    }
}

#[async_trait]
impl ModeDetector for StaticModeDetector {
    async fn is_event_driven(&self) -> StoreResult<bool> {
        Ok(self.event_driven)
    }
}
