//! Retention policy: decides which activities to delete.
//!
//! Three passes run over an immutable snapshot:
//!
//! 1. **Age expiry**: completed pull request activities older than the
//!    pull request retention window.
//! 2. **Orphans**: activities whose pipeline is not a known job. Only runs
//!    when a job registry is consulted.
//! 3. **Revision cap**: per pipeline, everything but the most recent
//!    `revision_history_limit` builds among the activities passes 1 and 2
//!    kept.
//!
//! Build numbers are checked for every activity the age pass keeps, orphans
//! included; one invalid build fails the whole computation.
//!
//! Nothing is mutated; the result is a [`DeletionPlan`] for the caller to
//! execute.

use super::config::{RetentionConfig, RetentionConfigError};
use chrono::{DateTime, Utc};
use common::model::{ActivityRecord, activity_name};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

/// Why an activity is planned for deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionReason {
    /// Completed pull request run past its retention window
    AgeExpired,
    /// Pipeline unknown to the job registry
    Orphaned,
    /// Older than the most recent builds kept per pipeline
    OverLimit,
}

impl DeletionReason {
    pub const ALL: [DeletionReason; 3] = [
        DeletionReason::AgeExpired,
        DeletionReason::Orphaned,
        DeletionReason::OverLimit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionReason::AgeExpired => "age-expired",
            DeletionReason::Orphaned => "orphaned",
            DeletionReason::OverLimit => "over-limit",
        }
    }
}

impl fmt::Display for DeletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity to delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedDeletion {
    /// Name of the activity in the store.
    pub name: String,
    /// Pipeline the activity belongs to.
    pub pipeline: String,
    pub reason: DeletionReason,
}

/// Activities to delete, in the order they were discovered.
///
/// Each name appears at most once. Entries are independent of each other
/// and may be executed in any order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DeletionPlan {
    deletions: Vec<PlannedDeletion>,
    #[serde(skip)]
    names: HashSet<String>,
}

impl PartialEq for DeletionPlan {
    fn eq(&self, other: &Self) -> bool {
        self.deletions == other.deletions
    }
}

impl Eq for DeletionPlan {}

impl DeletionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deletion. Returns false if `name` is already planned.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        pipeline: impl Into<String>,
        reason: DeletionReason,
    ) -> bool {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return false;
        }

        self.deletions.push(PlannedDeletion {
            name,
            pipeline: pipeline.into(),
            reason,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.deletions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedDeletion> {
        self.deletions.iter()
    }

    /// Names of the planned deletions, in discovery order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.deletions.iter().map(|d| d.name.as_str())
    }

    /// Number of deletions planned for `reason`.
    pub fn count(&self, reason: DeletionReason) -> usize {
        self.deletions.iter().filter(|d| d.reason == reason).count()
    }

    /// Reason the activity `name` is planned for deletion, if it is.
    pub fn reason_for(&self, name: &str) -> Option<DeletionReason> {
        self.deletions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.reason)
    }
}

impl IntoIterator for DeletionPlan {
    type Item = PlannedDeletion;
    type IntoIter = std::vec::IntoIter<PlannedDeletion>;

    fn into_iter(self) -> Self::IntoIter {
        self.deletions.into_iter()
    }
}

impl<'a> IntoIterator for &'a DeletionPlan {
    type Item = &'a PlannedDeletion;
    type IntoIter = std::slice::Iter<'a, PlannedDeletion>;

    fn into_iter(self) -> Self::IntoIter {
        self.deletions.iter()
    }
}

/// Applies [`RetentionConfig`] thresholds to activity snapshots.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    config: RetentionConfig,
    pull_request_retention: chrono::Duration,
}

impl RetentionPolicy {
    /// Create a new policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration validation fails.
    pub fn new(config: RetentionConfig) -> Result<Self, RetentionConfigError> {
        config.validate()?;

        let pull_request_retention = config.pull_request_retention();

        Ok(Self {
            config,
            pull_request_retention,
        })
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// The activity belongs to a pull request run.
    pub fn is_pull_request(&self, activity: &ActivityRecord) -> bool {
        activity.name.contains(&self.config.pull_request_marker)
    }

    /// The activity is a completed pull request run whose retention window
    /// ended strictly before `now`.
    pub fn is_age_expired(&self, activity: &ActivityRecord, now: DateTime<Utc>) -> bool {
        if !self.is_pull_request(activity) {
            return false;
        }

        let Some(completed_at) = activity.completed_at else {
            return false;
        };

        completed_at
            .checked_add_signed(self.pull_request_retention)
            .is_some_and(|expires_at| expires_at < now)
    }

    /// Compute the activities to delete from `activities`.
    ///
    /// `known_jobs` is the job registry listing; pass `None` when an
    /// event-driven front end is active to skip the orphan pass.
    ///
    /// # Errors
    ///
    /// Returns [`RetentionError::InvalidBuildNumber`] for the first activity
    /// whose build is not a non-negative integer. Only age-expired activities
    /// are exempt; orphans are checked too. No partial plan is returned.
    pub fn compute_deletions(
        &self,
        activities: &[ActivityRecord],
        known_jobs: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<DeletionPlan, RetentionError> {
        let mut plan = DeletionPlan::new();
        let mut marked = vec![false; activities.len()];

        self.age_expiry_pass(activities, now, &mut marked, &mut plan);
        let builds = parse_builds(activities, &marked)?;

        if let Some(known_jobs) = known_jobs {
            orphan_pass(activities, known_jobs, &mut marked, &mut plan);
        }

        self.revision_cap_pass(activities, &builds, &marked, &mut plan);

        tracing::debug!(
            activities = activities.len(),
            age_expired = plan.count(DeletionReason::AgeExpired),
            orphaned = plan.count(DeletionReason::Orphaned),
            over_limit = plan.count(DeletionReason::OverLimit),
            orphan_check = known_jobs.is_some(),
            "Computed deletion plan"
        );

        Ok(plan)
    }

    fn age_expiry_pass(
        &self,
        activities: &[ActivityRecord],
        now: DateTime<Utc>,
        marked: &mut [bool],
        plan: &mut DeletionPlan,
    ) {
        for (activity, marked) in activities.iter().zip(marked.iter_mut()) {
            if !self.is_age_expired(activity, now) {
                continue;
            }

            tracing::trace!(
                activity = %activity.name,
                pipeline = %activity.pipeline,
                completed_at = ?activity.completed_at,
                "Pull request activity past retention window"
            );

            plan.push(
                activity.name.as_str(),
                activity.pipeline.as_str(),
                DeletionReason::AgeExpired,
            );
            *marked = true;
        }
    }

    fn revision_cap_pass(
        &self,
        activities: &[ActivityRecord],
        builds: &[Option<u64>],
        marked: &[bool],
        plan: &mut DeletionPlan,
    ) {
        // Ordered by pipeline so plans are reproducible
        let mut builds_by_pipeline: BTreeMap<&str, Vec<u64>> = BTreeMap::new();

        for ((activity, build), _) in activities
            .iter()
            .zip(builds)
            .zip(marked)
            .filter(|(_, marked)| !**marked)
        {
            if let Some(build) = build {
                builds_by_pipeline
                    .entry(activity.pipeline.as_str())
                    .or_default()
                    .push(*build);
            }
        }

        let limit = self.config.revision_history_limit;
        for (pipeline, mut builds) in builds_by_pipeline {
            builds.sort_unstable();

            let excess = builds.len().saturating_sub(limit);
            if excess == 0 {
                continue;
            }

            tracing::trace!(
                pipeline = %pipeline,
                builds = builds.len(),
                limit,
                excess,
                "Pipeline exceeds revision history limit"
            );

            for &build in &builds[..excess] {
                plan.push(
                    activity_name(pipeline, build),
                    pipeline,
                    DeletionReason::OverLimit,
                );
            }
        }
    }
}

/// Parse the build number of every activity not already marked.
fn parse_builds(
    activities: &[ActivityRecord],
    marked: &[bool],
) -> Result<Vec<Option<u64>>, RetentionError> {
    activities
        .iter()
        .zip(marked)
        .map(|(activity, &marked)| {
            if marked {
                return Ok(None);
            }

            activity
                .build_number()
                .map(Some)
                .map_err(|source| RetentionError::InvalidBuildNumber {
                    activity: activity.name.clone(),
                    pipeline: activity.pipeline.clone(),
                    build: activity.build.clone(),
                    source,
                })
        })
        .collect()
}

fn orphan_pass(
    activities: &[ActivityRecord],
    known_jobs: &[String],
    marked: &mut [bool],
    plan: &mut DeletionPlan,
) {
    let known_jobs: HashSet<&str> = known_jobs.iter().map(String::as_str).collect();

    for (activity, marked) in activities.iter().zip(marked.iter_mut()) {
        if *marked || known_jobs.contains(activity.pipeline.as_str()) {
            continue;
        }

        tracing::trace!(
            activity = %activity.name,
            pipeline = %activity.pipeline,
            "Activity has no matching job"
        );

        plan.push(
            activity.name.as_str(),
            activity.pipeline.as_str(),
            DeletionReason::Orphaned,
        );
        *marked = true;
    }
}

/// Errors that abort a retention computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetentionError {
    #[error(
        "activity '{activity}' of pipeline '{pipeline}' has invalid build number '{build}': {source}"
    )]
    InvalidBuildNumber {
        activity: String,
        pipeline: String,
        build: String,
        #[source]
        source: ParseIntError,
    },
}
