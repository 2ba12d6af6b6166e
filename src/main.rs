use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use collector::{GcRunResult, GcRunner};
use common::Configuration;
use common::cli::{CommonArgs, CommonCommands, utils};
use common::model::RefSet;

#[derive(Parser)]
#[command(name = "activity-gc")]
#[command(about = "Garbage collection of stale pipeline activities")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Garbage collect pipeline resources
    #[command(subcommand)]
    Gc(GcCommands),

    /// Inspect pull request ref sets
    #[command(subcommand)]
    Refs(RefsCommands),

    #[command(flatten)]
    Common(CommonCommands),
}

#[derive(Subcommand)]
enum GcCommands {
    /// Delete expired pull request runs, orphaned activities and builds over the history limit
    Activities(ActivitiesArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ActivitiesArgs {
    #[arg(
        short = 'l',
        long,
        help = "Number of most recent builds kept per pipeline [default: 5]"
    )]
    revision_history_limit: Option<usize>,

    #[arg(
        short = 'p',
        long,
        help = "Hours a completed pull request run is kept [default: 48]"
    )]
    pull_request_hours: Option<u32>,

    #[arg(long, help = "Log deletions without performing them")]
    dry_run: bool,

    #[arg(long, help = "Treat activities that are already gone as deleted")]
    ignore_not_found: bool,

    #[arg(
        long,
        value_parser = humantime::parse_duration,
        help = "Repeat every interval (e.g. 10m) until interrupted"
    )]
    interval: Option<Duration>,
}

impl ActivitiesArgs {
    /// Command line flags take precedence over file and environment settings.
    fn apply(&self, config: &mut Configuration) {
        if let Some(limit) = self.revision_history_limit {
            config.gc.revision_history_limit = limit;
        }
        if let Some(hours) = self.pull_request_hours {
            config.gc.pull_request_hours = hours;
        }
        if self.dry_run {
            config.gc.dry_run = true;
        }
        if self.ignore_not_found {
            config.gc.ignore_not_found = true;
        }
        if self.interval.is_some() {
            config.gc.interval = self.interval;
        }
    }
}

#[derive(Subcommand)]
enum RefsCommands {
    /// Decode a ref set and print it as JSON
    Parse {
        /// Encoded ref set, e.g. master:abc,12:def
        #[arg(required_unless_present = "from_env")]
        value: Option<String>,

        #[arg(long, conflicts_with = "value", help = "Read the ref set from PULL_REFS")]
        from_env: bool,
    },
}

/// Waits for a shutdown signal (SIGINT or SIGTERM)
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            _ = sigint.recv() => log::info!("Received SIGINT"),
            _ = sigterm.recv() => log::info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        log::info!("Received Ctrl+C");
    }

    Ok(())
}

fn log_run_result(result: &GcRunResult) {
    let verb = if result.dry_run { "Would delete" } else { "Deleted" };

    log::info!(
        "Run {}: {} {} activities ({} already gone)",
        result.run_id,
        verb,
        result.deleted_count(),
        result.skipped_not_found.len()
    );
    for (reason, count) in &result.by_reason {
        log::info!("  {reason}: {count}");
    }
}

async fn run_activities_gc(config: &Configuration) -> Result<()> {
    utils::validate_config(config)?;

    let runner =
        GcRunner::from_config(config).context("Failed to create activity garbage collector")?;

    let Some(interval) = config.gc.interval else {
        let result = runner
            .run_once(Utc::now())
            .await
            .context("Activity garbage collection failed")?;
        log_run_result(&result);
        return Ok(());
    };

    log::info!(
        "Running activity garbage collection every {}",
        humantime::format_duration(interval)
    );

    let mut ticker = tokio::time::interval(interval);
    let shutdown = wait_for_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                break;
            }
            _ = ticker.tick() => {
                log::debug!("Running activity garbage collection cycle");

                match runner.run_once(Utc::now()).await {
                    Ok(result) => log_run_result(&result),
                    Err(e) => log::error!("Activity garbage collection cycle failed: {e:#}"),
                }
            }
        }
    }

    log::info!("Stopping activity garbage collection");
    runner.metrics().summary().log();

    Ok(())
}

fn parse_refs(value: Option<&str>, from_env: bool) -> Result<()> {
    let refs = match value {
        Some(value) if !from_env => value.parse::<RefSet>(),
        _ => RefSet::from_env(),
    }
    .context("Failed to decode ref set")?;

    log::debug!(
        "Decoded ref set for {} with {} change(s), batch: {}",
        refs.base_branch,
        refs.to_merge.len(),
        refs.is_batch()
    );

    let json = serde_json::to_string_pretty(&refs).context("Failed to serialize ref set")?;
    println!("{json}");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on CLI arguments
    utils::init_logging(&cli.common);

    // Load application configuration
    let mut config = utils::load_config(cli.common.config.as_ref())?;

    match cli.command {
        Commands::Common(ref command) => utils::handle_common_command(command, &config),
        Commands::Refs(RefsCommands::Parse {
            ref value,
            from_env,
        }) => parse_refs(value.as_deref(), from_env),
        Commands::Gc(GcCommands::Activities(ref args)) => {
            args.apply(&mut config);
            run_activities_gc(&config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_gc_activities_flags() {
        let cli = Cli::try_parse_from([
            "activity-gc",
            "gc",
            "activities",
            "-l",
            "3",
            "-p",
            "12",
            "--dry-run",
            "--interval",
            "10m",
        ])
        .unwrap();

        let Commands::Gc(GcCommands::Activities(args)) = cli.command else {
            panic!("expected gc activities");
        };

        let mut config = Configuration::default();
        args.apply(&mut config);
        assert_eq!(config.gc.revision_history_limit, 3);
        assert_eq!(config.gc.pull_request_hours, 12);
        assert!(config.gc.dry_run);
        assert!(!config.gc.ignore_not_found);
        assert_eq!(config.gc.interval, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_gc_activities_defaults_keep_config() {
        let cli = Cli::try_parse_from(["activity-gc", "gc", "activities"]).unwrap();
        let Commands::Gc(GcCommands::Activities(args)) = cli.command else {
            panic!("expected gc activities");
        };

        let mut config = Configuration::default();
        config.gc.revision_history_limit = 9;
        args.apply(&mut config);
        assert_eq!(config.gc.revision_history_limit, 9);
        assert_eq!(config.gc.pull_request_hours, 48);
        assert_eq!(config.gc.interval, None);
    }

    #[test]
    fn test_refs_parse_requires_input() {
        assert!(Cli::try_parse_from(["activity-gc", "refs", "parse"]).is_err());
        assert!(Cli::try_parse_from(["activity-gc", "refs", "parse", "--from-env"]).is_ok());
        assert!(Cli::try_parse_from(["activity-gc", "refs", "parse", "master:abc"]).is_ok());
        assert!(
            Cli::try_parse_from(["activity-gc", "refs", "parse", "master:abc", "--from-env"])
                .is_err()
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["activity-gc", "gc", "activities", "--verbose"]).unwrap();
        assert!(cli.common.verbose);
    }

    #[test]
    fn test_parse_refs_rejects_malformed() {
        assert!(parse_refs(Some("master:abc,12"), false).is_err());
        assert!(parse_refs(Some("master:abc,12:def"), false).is_ok());
    }
}
