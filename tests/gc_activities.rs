use chrono::{Duration, Utc};
use collector::{DeletionReason, GcRunner, JobNode};
use common::model::ActivityRecord;
use common::testing::{TestConfigBuilder, completed_activity, running_activity};
use std::path::Path;
use tempfile::TempDir;

fn write_activities(path: &str, activities: &[ActivityRecord]) {
    std::fs::write(path, serde_json::to_vec_pretty(activities).unwrap()).unwrap();
}

fn write_jobs(path: &str, jobs: &[JobNode]) {
    std::fs::write(path, serde_json::to_vec_pretty(jobs).unwrap()).unwrap();
}

fn read_names(path: impl AsRef<Path>) -> Vec<String> {
    let activities: Vec<ActivityRecord> =
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    activities.into_iter().map(|a| a.name).collect()
}

#[tokio::test]
async fn test_full_pass_against_files() {
    let temp = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .with_data_dir(temp.path().to_str().unwrap())
        .build();

    let now = Utc::now();
    let mut activities: Vec<_> = (1..=7)
        .map(|b| completed_activity("org/repo/master", b, now - Duration::hours(1)))
        .collect();
    // Expired and in-flight pull request runs
    activities.push(completed_activity("org/repo/PR-4", 1, now - Duration::hours(49)));
    activities.push(running_activity("org/repo/PR-4", 2));
    // Job removed from the CI server
    activities.push(running_activity("org/old", 3));

    write_activities(&config.store.activities_path, &activities);
    write_jobs(
        &config.registry.jobs_path,
        &[JobNode::folder(
            "org",
            vec![JobNode::folder(
                "repo",
                vec![JobNode::leaf("master"), JobNode::leaf("PR-4")],
            )],
        )],
    );

    let runner = GcRunner::from_config(&config).unwrap();
    let result = runner.run_once(now).await.unwrap();

    assert_eq!(result.by_reason.get(&DeletionReason::AgeExpired), Some(&1));
    assert_eq!(result.by_reason.get(&DeletionReason::Orphaned), Some(&1));
    assert_eq!(result.by_reason.get(&DeletionReason::OverLimit), Some(&2));

    let remaining = read_names(&config.store.activities_path);
    assert_eq!(
        remaining,
        vec![
            "org-repo-master-3",
            "org-repo-master-4",
            "org-repo-master-5",
            "org-repo-master-6",
            "org-repo-master-7",
            "org-repo-pr-4-2",
        ]
    );
}

#[tokio::test]
async fn test_event_driven_mode_keeps_unknown_pipelines() {
    let temp = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .with_data_dir(temp.path().to_str().unwrap())
        .event_driven()
        .build();

    write_activities(
        &config.store.activities_path,
        &[running_activity("org/old", 1), running_activity("org/new", 1)],
    );

    // No jobs file is needed without a job registry
    let runner = GcRunner::from_config(&config).unwrap();
    let result = runner.run_once(Utc::now()).await.unwrap();

    assert_eq!(result.deleted_count(), 0);
    assert_eq!(read_names(&config.store.activities_path).len(), 2);
}

#[tokio::test]
async fn test_invalid_build_leaves_store_untouched() {
    let temp = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .with_data_dir(temp.path().to_str().unwrap())
        .with_revision_history_limit(0)
        .event_driven()
        .build();

    write_activities(
        &config.store.activities_path,
        &[
            running_activity("app", 1),
            ActivityRecord::new("app-latest", "app", "latest"),
        ],
    );

    let runner = GcRunner::from_config(&config).unwrap();
    let err = runner.run_once(Utc::now()).await.unwrap_err();

    assert!(err.to_string().contains("latest"));
    assert_eq!(read_names(&config.store.activities_path).len(), 2);
}

#[tokio::test]
async fn test_missing_snapshot_is_empty_run() {
    let temp = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .with_data_dir(temp.path().to_str().unwrap())
        .build();

    // Neither file exists: the registry is never consulted
    let runner = GcRunner::from_config(&config).unwrap();
    let result = runner.run_once(Utc::now()).await.unwrap();

    assert_eq!(result.deleted_count(), 0);
    assert!(!Path::new(&config.store.activities_path).exists());
}

#[tokio::test]
async fn test_repeated_runs_converge() {
    let temp = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .with_data_dir(temp.path().to_str().unwrap())
        .with_revision_history_limit(2)
        .event_driven()
        .build();

    write_activities(
        &config.store.activities_path,
        &(1..=5).map(|b| running_activity("app", b)).collect::<Vec<_>>(),
    );

    let runner = GcRunner::from_config(&config).unwrap();
    assert_eq!(runner.run_once(Utc::now()).await.unwrap().deleted_count(), 3);
    assert_eq!(runner.run_once(Utc::now()).await.unwrap().deleted_count(), 0);

    assert_eq!(
        read_names(&config.store.activities_path),
        vec!["app-4", "app-5"]
    );
    assert_eq!(runner.metrics().runs_succeeded(), 2);
}
