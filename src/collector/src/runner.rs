//! One garbage collection pass: plan, then execute.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::Configuration;

use crate::error::GcResult;
use crate::executor::{ExecutorConfig, GcExecutor, GcRunResult};
use crate::metrics::GcMetrics;
use crate::planner::GcPlanner;
use crate::retention::{RetentionConfig, RetentionPolicy};
use crate::store::{
    ActivityStore, JobRegistry, JsonFileActivityStore, JsonFileJobRegistry, ModeDetector,
    StaticModeDetector,
};

/// Runs collection passes against a fixed set of collaborators
pub struct GcRunner {
    planner: GcPlanner,
    executor: GcExecutor,
    metrics: GcMetrics,
}

impl GcRunner {
    /// Wire a runner from explicit collaborators.
    pub fn new(
        store: Arc<dyn ActivityStore>,
        registry: Arc<dyn JobRegistry>,
        mode: Arc<dyn ModeDetector>,
        retention: RetentionConfig,
        executor_config: ExecutorConfig,
    ) -> GcResult<Self> {
        let metrics = GcMetrics::new();
        let policy = RetentionPolicy::new(retention)?;

        Ok(Self {
            planner: GcPlanner::new(store.clone(), registry, mode, policy),
            executor: GcExecutor::new(store, executor_config, metrics.clone()),
            metrics,
        })
    }

    /// Wire a runner backed by the JSON files named in `config`.
    pub fn from_config(config: &Configuration) -> GcResult<Self> {
        tracing::debug!(
            activities = %config.store.activities_path,
            jobs = %config.registry.jobs_path,
            event_driven = config.registry.event_driven,
            "Creating collection runner"
        );

        Self::new(
            Arc::new(JsonFileActivityStore::new(&config.store.activities_path)),
            Arc::new(JsonFileJobRegistry::new(&config.registry.jobs_path)),
            Arc::new(StaticModeDetector::new(config.registry.event_driven)),
            RetentionConfig::from(&config.gc),
            ExecutorConfig::from(&config.gc),
        )
    }

    pub fn metrics(&self) -> &GcMetrics {
        &self.metrics
    }

    /// Plan and execute one pass as of `now`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> GcResult<GcRunResult> {
        self.metrics.record_run_start();
        let started = Instant::now();

        let result = self.plan_and_execute(now).await;
        match &result {
            Ok(_) => self.metrics.record_run_success(started.elapsed()),
            Err(_) => self.metrics.record_run_failure(),
        }

        result
    }

    async fn plan_and_execute(&self, now: DateTime<Utc>) -> GcResult<GcRunResult> {
        let outcome = self.planner.plan(now).await?;
        self.metrics.record_activities_evaluated(outcome.evaluated);
        self.metrics.record_plan(&outcome.plan);

        self.executor.execute(&outcome.plan).await
    }
}
