use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "activity-gc.toml";

/// Prefix of environment variable overrides, e.g. `ACTIVITY_GC__GC__DRY_RUN`.
pub const ENV_PREFIX: &str = "ACTIVITY_GC__";

/// Garbage collection thresholds and run behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GcConfig {
    /// Minimum number of activities kept per pipeline
    pub revision_history_limit: usize,
    /// Hours a completed pull request activity is kept for
    pub pull_request_hours: u32,
    /// Substring of an activity name that marks a pull request run
    pub pull_request_marker: String,
    /// Log planned deletions without executing them
    pub dry_run: bool,
    /// Treat deletes of already removed activities as success
    pub ignore_not_found: bool,
    /// Repeat the collection on this interval instead of running once
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            revision_history_limit: 5,
            pull_request_hours: 48,
            pull_request_marker: "-pr-".to_string(),
            dry_run: false,
            ignore_not_found: false,
            interval: None,
        }
    }
}

/// Location of the activity snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding the array of activity records
    pub activities_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            activities_path: ".data/activities.json".to_string(),
        }
    }
}

/// CI job registry settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// An event-driven front end triggers the jobs, so there is no
    /// registry to check activities against
    pub event_driven: bool,
    /// JSON file holding the job tree
    pub jobs_path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_driven: false,
            jobs_path: ".data/jobs.json".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Retention thresholds and run behaviour
    pub gc: GcConfig,
    /// Activity store
    pub store: StoreConfig,
    /// Job registry (ignored when `event_driven` is set)
    pub registry: RegistryConfig,
}

impl Configuration {
    /// Load defaults, then `activity-gc.toml`, then `ACTIVITY_GC__*` variables.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Path::new(DEFAULT_CONFIG_FILE))
            .extract()
            .map_err(Box::new)
    }

    /// Load defaults, then the TOML file at `path`, then `ACTIVITY_GC__*` variables.
    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(path).extract().map_err(Box::new)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();

        assert_eq!(config.gc.revision_history_limit, 5);
        assert_eq!(config.gc.pull_request_hours, 48);
        assert_eq!(config.gc.pull_request_marker, "-pr-");
        assert!(!config.gc.dry_run);
        assert!(!config.gc.ignore_not_found);
        assert_eq!(config.gc.interval, None);
        assert_eq!(config.store.activities_path, ".data/activities.json");
        assert!(!config.registry.event_driven);
        assert_eq!(config.registry.jobs_path, ".data/jobs.json");
    }

    #[test]
    fn test_configless_operation() {
        Jail::expect_with(|_jail| {
            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.gc.revision_history_limit, 5);
            assert_eq!(config.gc.pull_request_hours, 48);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [gc]
                revision_history_limit = 10
                dry_run = true
                interval = "1h"

                [registry]
                event_driven = true
                "#,
            )?;

            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.gc.revision_history_limit, 10);
            assert!(config.gc.dry_run);
            assert_eq!(config.gc.interval, Some(Duration::from_secs(3600)));
            assert!(config.registry.event_driven);
            // Untouched keys keep their defaults
            assert_eq!(config.gc.pull_request_hours, 48);
            assert_eq!(config.store.activities_path, ".data/activities.json");
            Ok(())
        });
    }

    #[test]
    fn test_env_var_override() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[gc]\npull_request_hours = 12\n")?;
            jail.set_env("ACTIVITY_GC__GC__PULL_REQUEST_HOURS", "24");
            jail.set_env("ACTIVITY_GC__STORE__ACTIVITIES_PATH", "/tmp/activities.json");

            let config =
                Configuration::load_from_path(Path::new("custom.toml")).map_err(|e| *e)?;
            assert_eq!(config.gc.pull_request_hours, 24);
            assert_eq!(config.store.activities_path, "/tmp/activities.json");
            Ok(())
        });
    }
}
