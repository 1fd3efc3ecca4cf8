//! End-to-end sweeps over the in-memory cloud.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use reaper_core::{FixedClock, Instance, InstanceStatus, RegionMatch, StopOutcome};
use reaper_gcp::InMemoryCloud;
use reaper_policy::{IdlePolicy, RegionFilter};
use reaper_sweep::{Reaper, SweepError, SweepSummary};

const KEY: &str = "auto-shutdown-seconds";

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn name(project: &str, location: &str, id: &str) -> String {
    format!("projects/{project}/locations/{location}/instances/{id}")
}

fn notebook(
    project: &str,
    location: &str,
    id: &str,
    state: InstanceStatus,
    threshold: Option<&str>,
    idle_secs: i64,
) -> Instance {
    let mut metadata = HashMap::new();
    if let Some(t) = threshold {
        metadata.insert(KEY.to_string(), t.to_string());
    }
    Instance {
        name: name(project, location, id),
        state,
        metadata,
        update_time: Some(
            (now() - Duration::seconds(idle_secs))
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        ),
    }
}

fn reaper(cloud: &Arc<InMemoryCloud>) -> Reaper {
    Reaper::new(
        cloud.clone(),
        cloud.clone(),
        IdlePolicy::new(KEY),
        RegionFilter::new(vec!["us-central1".to_string()], RegionMatch::SubLocation),
    )
    .with_clock(Arc::new(FixedClock(now())))
}

/// One project, one zone, the four canonical instances.
fn scenario_cloud() -> Arc<InMemoryCloud> {
    let cloud = Arc::new(InMemoryCloud::new());
    cloud.add_project("p1");
    cloud.add_location("p1", "us-central1-a");
    let zone = |id, state, threshold, idle| notebook("p1", "us-central1-a", id, state, threshold, idle);
    cloud.add_instance("p1", "us-central1-a", zone("a-due", InstanceStatus::Active, Some("3600"), 4000));
    cloud.add_instance("p1", "us-central1-a", zone("b-fresh", InstanceStatus::Active, Some("3600"), 1000));
    cloud.add_instance("p1", "us-central1-a", zone("c-untagged", InstanceStatus::Active, None, 100_000));
    cloud.add_instance("p1", "us-central1-a", zone("d-stopped", InstanceStatus::Stopped, Some("0"), 50_000));
    cloud
}

#[tokio::test]
async fn only_due_active_opted_in_instances_are_stopped() {
    let cloud = scenario_cloud();
    let report = reaper(&cloud).run().await.unwrap();

    let due = name("p1", "us-central1-a", "a-due");
    assert_eq!(report.results.keys().collect::<Vec<_>>(), vec![&due]);
    assert!(report.results[&due].is_stopped());
    assert_eq!(cloud.stop_calls(), vec![due]);
    assert_eq!(
        report.summary,
        SweepSummary {
            projects: 1,
            locations: 1,
            instances: 4,
            stopped: 1,
            stop_failures: 0,
        }
    );
}

#[tokio::test]
async fn stop_result_carries_operation_response() {
    let cloud = scenario_cloud();
    let results = reaper(&cloud).sweep().await.unwrap();

    match &results[&name("p1", "us-central1-a", "a-due")] {
        StopOutcome::Stopped { response, .. } => assert_eq!(response["state"], "STOPPED"),
        other => panic!("expected a stopped outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn second_sweep_does_not_stop_again() {
    let cloud = scenario_cloud();
    let reaper = reaper(&cloud);

    assert_eq!(reaper.sweep().await.unwrap().len(), 1);
    assert!(reaper.sweep().await.unwrap().is_empty());
    assert_eq!(cloud.stop_calls().len(), 1);
}

#[tokio::test]
async fn failed_location_listing_does_not_hide_other_projects() {
    let cloud = Arc::new(InMemoryCloud::new());
    cloud.add_project("p1");
    cloud.add_project("p2");
    cloud.add_location("p1", "us-central1-a");
    cloud.add_location("p2", "us-central1-b");
    cloud.add_instance(
        "p1",
        "us-central1-a",
        notebook("p1", "us-central1-a", "nb", InstanceStatus::Active, Some("60"), 600),
    );
    cloud.add_instance(
        "p2",
        "us-central1-b",
        notebook("p2", "us-central1-b", "nb", InstanceStatus::Active, Some("60"), 600),
    );
    cloud.fail_locations("p1");

    let results = reaper(&cloud).sweep().await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results.contains_key(&name("p2", "us-central1-b", "nb")));
}

#[tokio::test]
async fn failed_instance_listing_does_not_hide_other_locations() {
    let cloud = Arc::new(InMemoryCloud::new());
    cloud.add_project("p1");
    cloud.add_location("p1", "us-central1-a");
    cloud.add_location("p1", "us-central1-b");
    for location in ["us-central1-a", "us-central1-b"] {
        cloud.add_instance(
            "p1",
            location,
            notebook("p1", location, "nb", InstanceStatus::Active, Some("0"), 10),
        );
    }
    cloud.fail_instances("p1", "us-central1-a");

    let results = reaper(&cloud).sweep().await.unwrap();
    assert_eq!(
        results.keys().cloned().collect::<Vec<_>>(),
        vec![name("p1", "us-central1-b", "nb")]
    );
}

#[tokio::test]
async fn locations_outside_the_allow_list_are_not_swept() {
    let cloud = Arc::new(InMemoryCloud::new());
    cloud.add_project("p1");
    for location in ["us-central1", "europe-west4-a"] {
        cloud.add_location("p1", location);
        cloud.add_instance(
            "p1",
            location,
            notebook("p1", location, "nb", InstanceStatus::Active, Some("0"), 10),
        );
    }

    let report = reaper(&cloud).run().await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.summary.locations, 0);
    assert!(cloud.stop_calls().is_empty());
}

#[tokio::test]
async fn failed_stop_is_recorded_and_sweep_continues() {
    let cloud = Arc::new(InMemoryCloud::new());
    cloud.add_project("p1");
    cloud.add_location("p1", "us-central1-a");
    for id in ["first", "second"] {
        cloud.add_instance(
            "p1",
            "us-central1-a",
            notebook("p1", "us-central1-a", id, InstanceStatus::Active, Some("0"), 10),
        );
    }
    let first = name("p1", "us-central1-a", "first");
    let second = name("p1", "us-central1-a", "second");
    cloud.fail_stop(&first);

    let report = reaper(&cloud).run().await.unwrap();
    assert!(matches!(report.results[&first], StopOutcome::Failed { .. }));
    assert!(report.results[&second].is_stopped());
    assert_eq!(report.summary.stopped, 1);
    assert_eq!(report.summary.stop_failures, 1);
}

#[tokio::test]
async fn failed_stop_is_retried_by_the_next_sweep() {
    let cloud = scenario_cloud();
    let due = name("p1", "us-central1-a", "a-due");
    cloud.fail_stop(&due);

    let reaper = reaper(&cloud);
    reaper.sweep().await.unwrap();
    reaper.sweep().await.unwrap();
    assert_eq!(cloud.stop_calls(), vec![due.clone(), due]);
}

#[tokio::test]
async fn auth_failure_aborts_the_sweep() {
    let cloud = scenario_cloud();
    cloud.fail_auth();

    let err = reaper(&cloud).sweep().await.unwrap_err();
    assert!(matches!(err, SweepError::Auth(_)));
    assert!(cloud.stop_calls().is_empty());
}

#[tokio::test]
async fn failed_project_search_yields_an_empty_result() {
    let cloud = scenario_cloud();
    cloud.fail_project_search();

    let report = reaper(&cloud).run().await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.summary.projects, 0);
}

#[tokio::test]
async fn result_serializes_as_name_to_outcome_map() {
    let cloud = scenario_cloud();
    let results = reaper(&cloud).sweep().await.unwrap();

    let json = serde_json::to_value(&results).unwrap();
    let entry = &json[name("p1", "us-central1-a", "a-due")];
    assert_eq!(entry["status"], "stopped");
    assert_eq!(entry["operation"], "operations/stop-1");
}
