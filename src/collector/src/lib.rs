//! Pipeline activity garbage collection
//!
//! Deletes stale pipeline activity records:
//! - completed pull request runs older than the retention window
//! - activities whose pipeline no longer exists as a CI job
//! - builds beyond the per-pipeline revision history limit
//!
//! [`GcPlanner`] computes a [`DeletionPlan`] from a snapshot of the store,
//! [`GcExecutor`] applies it, and [`GcRunner`] wires both to a
//! configuration.

pub mod error;
pub mod executor;
pub mod jobs;
pub mod metrics;
pub mod planner;
pub mod retention;
pub mod runner;
pub mod store;

// Re-export commonly used types
pub use error::{GcError, GcResult};
pub use executor::{ExecutorConfig, GcExecutor, GcRunResult};
pub use jobs::{JobNode, flatten_job_names};
pub use metrics::{GcMetrics, MetricsSummary};
pub use planner::{GcPlanner, PlanOutcome};
pub use retention::{
    DeletionPlan, DeletionReason, PlannedDeletion, RetentionConfig, RetentionConfigError,
    RetentionError, RetentionPolicy,
};
pub use runner::GcRunner;
pub use store::{
    ActivityStore, InMemoryActivityStore, JobRegistry, JsonFileActivityStore,
    JsonFileJobRegistry, ModeDetector, StaticJobRegistry, StaticModeDetector, StoreError,
    StoreResult,
};
