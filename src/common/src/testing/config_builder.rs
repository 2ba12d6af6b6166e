//! Test configuration builder for creating test setups quickly.

use crate::config::{Configuration, GcConfig, RegistryConfig, StoreConfig};
use std::time::Duration;

/// Builder for creating test configurations.
///
/// Provides a fluent API for creating configurations suitable for testing,
/// with sensible defaults that can be customized as needed.
///
/// # Example
///
/// ```rust,ignore
/// use common::testing::TestConfigBuilder;
///
/// // File-backed collaborators inside a temporary directory
/// let config = TestConfigBuilder::new()
///     .with_data_dir(temp.path().to_str().unwrap())
///     .with_revision_history_limit(2)
///     .build();
///
/// // No job registry
/// let config = TestConfigBuilder::new().event_driven().build();
/// ```
#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: Configuration,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    /// Create a new test configuration builder with the production defaults.
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
        }
    }

    /// Point the activity store and job registry at files inside `dir`.
    ///
    /// This sets:
    /// - Activities path to `{dir}/activities.json`
    /// - Jobs path to `{dir}/jobs.json`
    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.config.store = StoreConfig {
            activities_path: format!("{dir}/activities.json"),
        };
        self.config.registry = RegistryConfig {
            jobs_path: format!("{dir}/jobs.json"),
            ..self.config.registry
        };
        self
    }

    /// Set the number of builds kept per pipeline.
    pub fn with_revision_history_limit(mut self, limit: usize) -> Self {
        self.config.gc.revision_history_limit = limit;
        self
    }

    /// Set the pull request retention window.
    pub fn with_pull_request_hours(mut self, hours: u32) -> Self {
        self.config.gc.pull_request_hours = hours;
        self
    }

    /// Set the run interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.config.gc.interval = Some(interval);
        self
    }

    /// Log deletions instead of executing them.
    pub fn dry_run(mut self) -> Self {
        self.config.gc.dry_run = true;
        self
    }

    /// Treat deletes of missing activities as success.
    pub fn ignore_not_found(mut self) -> Self {
        self.config.gc.ignore_not_found = true;
        self
    }

    /// Mark the event-driven front end as active (no job registry).
    pub fn event_driven(mut self) -> Self {
        self.config.registry.event_driven = true;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Configuration {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_configuration() {
        let config = TestConfigBuilder::new().build();
        let defaults = GcConfig::default();

        assert_eq!(
            config.gc.revision_history_limit,
            defaults.revision_history_limit
        );
        assert_eq!(config.gc.pull_request_hours, defaults.pull_request_hours);
        assert!(!config.registry.event_driven);
    }

    #[test]
    fn test_with_data_dir() {
        let config = TestConfigBuilder::new()
            .event_driven()
            .with_data_dir("/tmp/gc")
            .build();

        assert_eq!(config.store.activities_path, "/tmp/gc/activities.json");
        assert_eq!(config.registry.jobs_path, "/tmp/gc/jobs.json");
        // Keeps flags set before the directory
        assert!(config.registry.event_driven);
    }

    #[test]
    fn test_flags() {
        let config = TestConfigBuilder::new()
            .with_revision_history_limit(2)
            .with_pull_request_hours(1)
            .with_interval(Duration::from_secs(60))
            .dry_run()
            .ignore_not_found()
            .build();

        assert_eq!(config.gc.revision_history_limit, 2);
        assert_eq!(config.gc.pull_request_hours, 1);
        assert_eq!(config.gc.interval, Some(Duration::from_secs(60)));
        assert!(config.gc.dry_run);
        assert!(config.gc.ignore_not_found);
    }
}
