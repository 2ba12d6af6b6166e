//! Retention thresholds.

use common::config::GcConfig;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Thresholds the retention policy applies to an activity snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Number of most recent builds kept per pipeline.
    ///
    /// Env: ACTIVITY_GC__GC__REVISION_HISTORY_LIMIT
    pub revision_history_limit: usize,

    /// Hours a completed pull request activity is kept for.
    ///
    /// Env: ACTIVITY_GC__GC__PULL_REQUEST_HOURS
    pub pull_request_hours: u32,

    /// Substring of an activity name marking a pull request run.
    ///
    /// Env: ACTIVITY_GC__GC__PULL_REQUEST_MARKER
    pub pull_request_marker: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::from(&GcConfig::default())
    }
}

impl From<&GcConfig> for RetentionConfig {
    fn from(config: &GcConfig) -> Self {
        Self {
            revision_history_limit: config.revision_history_limit,
            pull_request_hours: config.pull_request_hours,
            pull_request_marker: config.pull_request_marker.clone(),
        }
    }
}

impl RetentionConfig {
    /// Retention window for completed pull request activities.
    pub fn pull_request_retention(&self) -> Duration {
        Duration::hours(i64::from(self.pull_request_hours))
    }

    /// Validate the thresholds.
    pub fn validate(&self) -> Result<(), RetentionConfigError> {
        if self.pull_request_marker.is_empty() {
            return Err(RetentionConfigError::EmptyPullRequestMarker);
        }

        if self.pull_request_marker.contains(char::is_whitespace) {
            return Err(RetentionConfigError::InvalidPullRequestMarker(
                self.pull_request_marker.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during retention configuration validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetentionConfigError {
    /// An empty marker would classify every activity as a pull request run.
    #[error("Pull request marker cannot be empty")]
    EmptyPullRequestMarker,

    #[error("Pull request marker '{0}' contains whitespace")]
    InvalidPullRequestMarker(String),
}
