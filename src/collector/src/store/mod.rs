//! Collaborators the garbage collector reads from and deletes through.
//!
//! - [`ActivityStore`]: lists and deletes activity records
//! - [`JobRegistry`]: enumerates the jobs known to the CI server
//! - [`ModeDetector`]: reports whether an event-driven front end triggers
//!   the jobs, in which case there is no registry to check against

pub mod file;
pub mod memory;

use async_trait::async_trait;
use common::model::ActivityRecord;
use thiserror::Error;

pub use file::{JsonFileActivityStore, JsonFileJobRegistry};
pub use memory::{InMemoryActivityStore, StaticJobRegistry, StaticModeDetector};

/// Errors returned by collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("activity '{0}' not found")]
    NotFound(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for collaborator calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage of activity records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// List every stored activity.
    async fn list_activities(&self) -> StoreResult<Vec<ActivityRecord>>;

    /// Delete the activity named `name`.
    ///
    /// Returns [`StoreError::NotFound`] when no such activity exists.
    async fn delete_activity(&self, name: &str) -> StoreResult<()>;
}

/// Registry of jobs configured on the CI server.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Full names of every pipeline job, e.g. `org/repo/master`.
    async fn list_job_names(&self) -> StoreResult<Vec<String>>;
}

/// Detects which CI front end is active.
#[async_trait]
pub trait ModeDetector: Send + Sync {
    /// True when an event-driven front end triggers the jobs.
    async fn is_event_driven(&self) -> StoreResult<bool>;
}
