//! Garbage collection metrics tracking
//!
//! Provides thread-safe metrics collection for collection runs using atomic counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::retention::{DeletionPlan, DeletionReason};

/// Thread-safe metrics for tracking collection runs
#[derive(Debug, Clone)]
pub struct GcMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    runs_started: AtomicUsize,
    runs_succeeded: AtomicUsize,
    runs_failed: AtomicUsize,
    activities_evaluated: AtomicUsize,
    planned_age_expired: AtomicUsize,
    planned_orphaned: AtomicUsize,
    planned_over_limit: AtomicUsize,
    activities_deleted: AtomicUsize,
    not_found_skipped: AtomicUsize,
    total_duration_ms: AtomicU64,
}

impl Default for GcMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GcMetrics {
    /// Create a new metrics tracker
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                runs_started: AtomicUsize::new(0),
                runs_succeeded: AtomicUsize::new(0),
                runs_failed: AtomicUsize::new(0),
                activities_evaluated: AtomicUsize::new(0),
                planned_age_expired: AtomicUsize::new(0),
                planned_orphaned: AtomicUsize::new(0),
                planned_over_limit: AtomicUsize::new(0),
                activities_deleted: AtomicUsize::new(0),
                not_found_skipped: AtomicUsize::new(0),
                total_duration_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Record the start of a run
    pub fn record_run_start(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run that completed
    pub fn record_run_success(&self, duration: Duration) {
        self.inner.runs_succeeded.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_duration_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record a run that was aborted by an error
    pub fn record_run_failure(&self) {
        self.inner.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the size of the evaluated snapshot
    pub fn record_activities_evaluated(&self, count: usize) {
        self.inner
            .activities_evaluated
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Record the deletions of a plan, per reason
    pub fn record_plan(&self, plan: &DeletionPlan) {
        for reason in DeletionReason::ALL {
            let counter = match reason {
                DeletionReason::AgeExpired => &self.inner.planned_age_expired,
                DeletionReason::Orphaned => &self.inner.planned_orphaned,
                DeletionReason::OverLimit => &self.inner.planned_over_limit,
            };
            counter.fetch_add(plan.count(reason), Ordering::Relaxed);
        }
    }

    /// Record an executed deletion
    pub fn record_deleted(&self) {
        self.inner.activities_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a deletion skipped because the activity was already gone
    pub fn record_not_found_skipped(&self) {
        self.inner.not_found_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn runs_started(&self) -> usize {
        self.inner.runs_started.load(Ordering::Relaxed)
    }

    pub fn runs_succeeded(&self) -> usize {
        self.inner.runs_succeeded.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> usize {
        self.inner.runs_failed.load(Ordering::Relaxed)
    }

    pub fn activities_evaluated(&self) -> usize {
        self.inner.activities_evaluated.load(Ordering::Relaxed)
    }

    /// Deletions planned for `reason` across all runs
    pub fn planned(&self, reason: DeletionReason) -> usize {
        match reason {
            DeletionReason::AgeExpired => &self.inner.planned_age_expired,
            DeletionReason::Orphaned => &self.inner.planned_orphaned,
            DeletionReason::OverLimit => &self.inner.planned_over_limit,
        }
        .load(Ordering::Relaxed)
    }

    pub fn activities_deleted(&self) -> usize {
        self.inner.activities_deleted.load(Ordering::Relaxed)
    }

    pub fn not_found_skipped(&self) -> usize {
        self.inner.not_found_skipped.load(Ordering::Relaxed)
    }

    /// Average duration of successful runs in milliseconds
    pub fn avg_duration_ms(&self) -> f64 {
        let runs = self.runs_succeeded();
        if runs == 0 {
            return 0.0;
        }
        self.inner.total_duration_ms.load(Ordering::Relaxed) as f64 / runs as f64
    }

    /// Snapshot of all counters
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            runs_started: self.runs_started(),
            runs_succeeded: self.runs_succeeded(),
            runs_failed: self.runs_failed(),
            activities_evaluated: self.activities_evaluated(),
            planned_age_expired: self.planned(DeletionReason::AgeExpired),
            planned_orphaned: self.planned(DeletionReason::Orphaned),
            planned_over_limit: self.planned(DeletionReason::OverLimit),
            activities_deleted: self.activities_deleted(),
            not_found_skipped: self.not_found_skipped(),
            avg_duration_ms: self.avg_duration_ms(),
        }
    }
}

/// Point-in-time view of [`GcMetrics`]
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub runs_started: usize,
    pub runs_succeeded: usize,
    pub runs_failed: usize,
    pub activities_evaluated: usize,
    pub planned_age_expired: usize,
    pub planned_orphaned: usize,
    pub planned_over_limit: usize,
    pub activities_deleted: usize,
    pub not_found_skipped: usize,
    pub avg_duration_ms: f64,
}

impl MetricsSummary {
    /// Log the metrics summary
    pub fn log(&self) {
        log::info!("=== Activity GC Metrics Summary ===");
        log::info!(
            "Runs: {} started, {} succeeded, {} failed",
            self.runs_started,
            self.runs_succeeded,
            self.runs_failed
        );
        log::info!(
            "Planned: {} age-expired, {} orphaned, {} over-limit (of {} evaluated)",
            self.planned_age_expired,
            self.planned_orphaned,
            self.planned_over_limit,
            self.activities_evaluated
        );
        log::info!(
            "Deleted: {} activities, {} already gone",
            self.activities_deleted,
            self.not_found_skipped
        );
        log::info!("Average run duration: {:.2}ms", self.avg_duration_ms);
    }
}
