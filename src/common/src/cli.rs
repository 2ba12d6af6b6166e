use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared by every command
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Subcommands that only inspect the configuration or the binary
#[derive(Subcommand, Debug, Clone)]
pub enum CommonCommands {
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Initialize logging based on CLI arguments. `RUST_LOG` wins when set.
    pub fn init_logging(args: &CommonArgs) {
        let level = if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        // Stdout carries command output. A subscriber may already be installed.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("Activity GC Configuration:");
            println!("==========================");
            println!(
                "Revision history limit: {}",
                config.gc.revision_history_limit
            );
            println!("Pull request hours: {}", config.gc.pull_request_hours);
            println!("Pull request marker: {}", config.gc.pull_request_marker);
            println!("Dry run: {}", config.gc.dry_run);
            println!("Ignore not found: {}", config.gc.ignore_not_found);
            match config.gc.interval {
                Some(interval) => println!("Interval: {interval:?}"),
                None => println!("Interval: run once"),
            }
            println!("Activities path: {}", config.store.activities_path);

            if config.registry.event_driven {
                println!("Job registry: disabled (event-driven front end)");
            } else {
                println!("Jobs path: {}", config.registry.jobs_path);
            }
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        log::info!("Validating configuration...");

        if config.store.activities_path.is_empty() {
            anyhow::bail!("Activities path cannot be empty");
        }

        if config.gc.pull_request_marker.is_empty() {
            anyhow::bail!("Pull request marker cannot be empty");
        }

        if !config.registry.event_driven && config.registry.jobs_path.is_empty() {
            anyhow::bail!("Jobs path cannot be empty when the job registry is used");
        }

        if let Some(interval) = config.gc.interval
            && interval.is_zero()
        {
            anyhow::bail!("Interval must be greater than zero");
        }

        log::info!("Configuration validation passed");
        Ok(())
    }

    /// Handle the configuration/version commands
    pub fn handle_common_command(command: &CommonCommands, config: &Configuration) -> Result<()> {
        match command {
            CommonCommands::Config { json } => display_config(config, *json),
            CommonCommands::Validate => validate_config(config),
            CommonCommands::Version => {
                println!("{}", version_info());
                Ok(())
            }
        }
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}
