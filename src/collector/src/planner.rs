//! Deletion planning
//!
//! Gathers the inputs of a retention computation from the collaborators:
//! the activity snapshot, the active front end and, when no event-driven
//! front end is in use, the job registry listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::GcResult;
use crate::retention::{DeletionPlan, RetentionPolicy};
use crate::store::{ActivityStore, JobRegistry, ModeDetector};

/// Plans which activities a run deletes
pub struct GcPlanner {
    store: Arc<dyn ActivityStore>,
    registry: Arc<dyn JobRegistry>,
    mode: Arc<dyn ModeDetector>,
    policy: RetentionPolicy,
}

/// A plan together with the size of the snapshot it was computed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub evaluated: usize,
    pub plan: DeletionPlan,
}

impl GcPlanner {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        registry: Arc<dyn JobRegistry>,
        mode: Arc<dyn ModeDetector>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            mode,
            policy,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Compute the deletion plan as of `now`.
    ///
    /// An empty snapshot short-circuits: neither the mode detector nor the
    /// registry is consulted.
    pub async fn plan(&self, now: DateTime<Utc>) -> GcResult<PlanOutcome> {
        let activities = self.store.list_activities().await?;

        if activities.is_empty() {
            tracing::info!("no activities found");
            return Ok(PlanOutcome {
                evaluated: 0,
                plan: DeletionPlan::new(),
            });
        }

        let event_driven = self.mode.is_event_driven().await?;
        let known_jobs = if event_driven {
            tracing::debug!("Event-driven front end active, skipping orphan check");
            None
        } else {
            let names = self.registry.list_job_names().await?;
            tracing::debug!(jobs = names.len(), "Loaded job registry");
            Some(names)
        };

        let plan = self
            .policy
            .compute_deletions(&activities, known_jobs.as_deref(), now)?;

        tracing::info!(
            activities = activities.len(),
            planned = plan.len(),
            event_driven,
            "Deletion plan ready"
        );

        Ok(PlanOutcome {
            evaluated: activities.len(),
            plan,
        })
    }
}
