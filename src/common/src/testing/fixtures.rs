//! Activity record fixtures.

use crate::model::{ActivityRecord, activity_name};
use chrono::{DateTime, Utc};

/// A finished activity named the way the store names it.
pub fn completed_activity(
    pipeline: &str,
    build: u64,
    completed_at: DateTime<Utc>,
) -> ActivityRecord {
    running_activity(pipeline, build).completed(completed_at)
}

/// An in-flight activity named the way the store names it.
pub fn running_activity(pipeline: &str, build: u64) -> ActivityRecord {
    ActivityRecord::new(
        activity_name(pipeline, build),
        pipeline,
        build.to_string(),
    )
}
