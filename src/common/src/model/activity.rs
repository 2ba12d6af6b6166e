use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::ParseIntError;

/// A stored description of one executed CI pipeline run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Unique activity name.
    pub name: String,
    /// Logical pipeline identifier, e.g. `org/repo/master`.
    pub pipeline: String,
    /// Build ordinal as stored. Must parse to a non-negative integer.
    pub build: String,
    /// Completion time. Absent while the run is in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ActivityRecord {
    pub fn new(
        name: impl Into<String>,
        pipeline: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pipeline: pipeline.into(),
            build: build.into(),
            completed_at: None,
        }
    }

    /// Mark the record as completed at `completed_at`.
    pub fn completed(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Parse the stored build ordinal.
    pub fn build_number(&self) -> Result<u64, ParseIntError> {
        self.build.parse::<u64>()
    }
}

/// Derive the store name of the activity for `pipeline` at build `build`.
///
/// The store names activities `<pipeline>-<build>`, lowercased, with every
/// `/` and `_` replaced by `-`.
pub fn activity_name(pipeline: &str, build: u64) -> String {
    format!("{pipeline}-{build}")
        .replace(['/', '_'], "-")
        .to_lowercase()
}
