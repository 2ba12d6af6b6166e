//! Deletion execution
//!
//! Applies a [`DeletionPlan`] to the activity store one entry at a time.
//! The first store failure aborts the remaining deletions; an activity that
//! is already gone only counts as skipped when `ignore_not_found` is set.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::config::GcConfig;
use serde::Serialize;
use uuid::Uuid;

use crate::error::GcResult;
use crate::metrics::GcMetrics;
use crate::retention::{DeletionPlan, DeletionReason, PlannedDeletion};
use crate::store::ActivityStore;

/// Configuration for deletion execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Log deletions without performing them
    pub dry_run: bool,
    /// Treat an activity that no longer exists as already deleted
    pub ignore_not_found: bool,
}

impl From<&GcConfig> for ExecutorConfig {
    fn from(config: &GcConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            ignore_not_found: config.ignore_not_found,
        }
    }
}

/// Outcome of one executed plan
#[derive(Debug, Clone, Serialize)]
pub struct GcRunResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Deleted activities, or the ones that would be deleted in dry-run mode
    pub deleted: Vec<PlannedDeletion>,
    /// Planned activities that were already gone
    pub skipped_not_found: Vec<String>,
    pub by_reason: BTreeMap<DeletionReason, usize>,
}

impl GcRunResult {
    fn new(run_id: Uuid, started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            run_id,
            started_at,
            completed_at: started_at,
            dry_run,
            deleted: Vec::new(),
            skipped_not_found: Vec::new(),
            by_reason: BTreeMap::new(),
        }
    }

    fn record_deleted(&mut self, deletion: PlannedDeletion) {
        *self.by_reason.entry(deletion.reason).or_default() += 1;
        self.deleted.push(deletion);
    }

    /// Number of deleted (or would-be deleted) activities
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Executes deletion plans against an activity store
pub struct GcExecutor {
    store: Arc<dyn ActivityStore>,
    config: ExecutorConfig,
    metrics: GcMetrics,
}

impl GcExecutor {
    pub fn new(store: Arc<dyn ActivityStore>, config: ExecutorConfig, metrics: GcMetrics) -> Self {
        Self {
            store,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> ExecutorConfig {
        self.config
    }

    /// Execute `plan`, deleting sequentially in plan order.
    ///
    /// # Errors
    ///
    /// Returns the first store error. Deletions already performed are not
    /// rolled back.
    pub async fn execute(&self, plan: &DeletionPlan) -> GcResult<GcRunResult> {
        let run_id = Uuid::new_v4();
        let mut result = GcRunResult::new(run_id, Utc::now(), self.config.dry_run);

        if plan.is_empty() {
            tracing::info!(%run_id, "Nothing to delete");
            result.completed_at = Utc::now();
            return Ok(result);
        }

        tracing::info!(
            %run_id,
            planned = plan.len(),
            dry_run = self.config.dry_run,
            "Starting activity deletion"
        );

        for deletion in plan {
            if self.config.dry_run {
                tracing::info!(
                    activity = %deletion.name,
                    pipeline = %deletion.pipeline,
                    reason = %deletion.reason,
                    "[DRY-RUN] Would delete activity"
                );
                result.record_deleted(deletion.clone());
                continue;
            }

            match self.store.delete_activity(&deletion.name).await {
                Ok(()) => {
                    tracing::info!(
                        activity = %deletion.name,
                        pipeline = %deletion.pipeline,
                        reason = %deletion.reason,
                        "Deleted activity"
                    );
                    self.metrics.record_deleted();
                    result.record_deleted(deletion.clone());
                }
                Err(e) if e.is_not_found() && self.config.ignore_not_found => {
                    tracing::warn!(
                        activity = %deletion.name,
                        reason = %deletion.reason,
                        "Activity already deleted, skipping"
                    );
                    self.metrics.record_not_found_skipped();
                    result.skipped_not_found.push(deletion.name.clone());
                }
                Err(e) => {
                    tracing::error!(
                        %run_id,
                        activity = %deletion.name,
                        deleted = result.deleted.len(),
                        error = %e,
                        "Failed to delete activity, aborting run"
                    );
                    return Err(e.into());
                }
            }
        }

        result.completed_at = Utc::now();

        tracing::info!(
            %run_id,
            deleted = result.deleted.len(),
            skipped_not_found = result.skipped_not_found.len(),
            dry_run = self.config.dry_run,
            "Activity deletion complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GcError;
    use crate::store::{InMemoryActivityStore, MockActivityStore, StoreError};
    use common::testing::running_activity;

    fn plan_of(names: &[(&str, DeletionReason)]) -> DeletionPlan {
        let mut plan = DeletionPlan::new();
        for (name, reason) in names {
            plan.push(*name, "app", *reason);
        }
        plan
    }

    #[tokio::test]
    async fn test_deletes_every_planned_activity() {
        let store = InMemoryActivityStore::new(vec![
            running_activity("app", 1),
            running_activity("app", 2),
            running_activity("app", 3),
        ]);
        let metrics = GcMetrics::new();
        let executor = GcExecutor::new(
            Arc::new(store.clone()),
            ExecutorConfig::default(),
            metrics.clone(),
        );

        let plan = plan_of(&[
            ("app-1", DeletionReason::OverLimit),
            ("app-2", DeletionReason::Orphaned),
        ]);
        let result = executor.execute(&plan).await.unwrap();

        assert!(!result.dry_run);
        assert_eq!(result.deleted_count(), 2);
        assert_eq!(result.by_reason.get(&DeletionReason::OverLimit), Some(&1));
        assert_eq!(result.by_reason.get(&DeletionReason::Orphaned), Some(&1));
        assert!(result.completed_at >= result.started_at);
        assert_eq!(store.names().await, vec!["app-3".to_string()]);
        assert_eq!(metrics.activities_deleted(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_never_touches_store() {
        // No expectations: any store call fails the test
        let store = MockActivityStore::new();
        let executor = GcExecutor::new(
            Arc::new(store),
            ExecutorConfig {
                dry_run: true,
                ignore_not_found: false,
            },
            GcMetrics::new(),
        );

        let plan = plan_of(&[("app-1", DeletionReason::OverLimit)]);
        let result = executor.execute(&plan).await.unwrap();

        assert!(result.dry_run);
        assert_eq!(result.deleted_count(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_error_by_default() {
        let mut store = MockActivityStore::new();
        store
            .expect_delete_activity()
            .times(1)
            .returning(|name| Err(StoreError::NotFound(name.to_string())));

        let executor = GcExecutor::new(
            Arc::new(store),
            ExecutorConfig::default(),
            GcMetrics::new(),
        );

        let plan = plan_of(&[
            ("app-1", DeletionReason::OverLimit),
            ("app-2", DeletionReason::OverLimit),
        ]);
        let err = executor.execute(&plan).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_not_found_skipped_when_ignored() {
        let mut store = MockActivityStore::new();
        store.expect_delete_activity().times(2).returning(|name| {
            if name == "app-1" {
                Err(StoreError::NotFound(name.to_string()))
            } else {
                Ok(())
            }
        });

        let metrics = GcMetrics::new();
        let executor = GcExecutor::new(
            Arc::new(store),
            ExecutorConfig {
                dry_run: false,
                ignore_not_found: true,
            },
            metrics.clone(),
        );

        let plan = plan_of(&[
            ("app-1", DeletionReason::OverLimit),
            ("app-2", DeletionReason::OverLimit),
        ]);
        let result = executor.execute(&plan).await.unwrap();

        assert_eq!(result.skipped_not_found, vec!["app-1".to_string()]);
        assert_eq!(result.deleted_count(), 1);
        assert_eq!(metrics.not_found_skipped(), 1);
        assert_eq!(metrics.activities_deleted(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_remaining_deletions() {
        let mut store = MockActivityStore::new();
        store
            .expect_delete_activity()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection reset".to_string())));

        let executor = GcExecutor::new(
            Arc::new(store),
            ExecutorConfig {
                dry_run: false,
                ignore_not_found: true,
            },
            GcMetrics::new(),
        );

        let plan = plan_of(&[
            ("app-1", DeletionReason::OverLimit),
            ("app-2", DeletionReason::OverLimit),
            ("app-3", DeletionReason::OverLimit),
        ]);
        let err = executor.execute(&plan).await.unwrap_err();
        assert!(matches!(err, GcError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let executor = GcExecutor::new(
            Arc::new(MockActivityStore::new()),
            ExecutorConfig::default(),
            GcMetrics::new(),
        );

        let result = executor.execute(&DeletionPlan::new()).await.unwrap();
        assert_eq!(result.deleted_count(), 0);
        assert!(result.by_reason.is_empty());
    }

    #[test]
    fn test_config_from_gc_config() {
        let gc = GcConfig {
            dry_run: true,
            ignore_not_found: true,
            ..Default::default()
        };
        assert_eq!(
            ExecutorConfig::from(&gc),
            ExecutorConfig {
                dry_run: true,
                ignore_not_found: true,
            }
        );
    }
}
