//! Trigger route tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use tower::ServiceExt;

use reaper_api::build_router;
use reaper_core::{FixedClock, Instance, InstanceStatus, RegionMatch};
use reaper_gcp::InMemoryCloud;
use reaper_policy::{IdlePolicy, RegionFilter};
use reaper_sweep::Reaper;

const DUE: &str = "projects/p1/locations/us-central1-a/instances/due";

fn test_cloud() -> Arc<InMemoryCloud> {
    let cloud = Arc::new(InMemoryCloud::new());
    cloud.add_project("p1");
    cloud.add_location("p1", "us-central1-a");
    cloud.add_instance(
        "p1",
        "us-central1-a",
        Instance {
            name: DUE.to_string(),
            state: InstanceStatus::Active,
            metadata: HashMap::from([("auto-shutdown-seconds".to_string(), "3600".to_string())]),
            update_time: Some("2024-05-01T10:00:00Z".to_string()),
        },
    );
    cloud
}

fn test_reaper(cloud: &Arc<InMemoryCloud>) -> Arc<Reaper> {
    let now: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    Arc::new(
        Reaper::new(
            cloud.clone(),
            cloud.clone(),
            IdlePolicy::new("auto-shutdown-seconds"),
            RegionFilter::new(vec!["us-central1".to_string()], RegionMatch::SubLocation),
        )
        .with_clock(Arc::new(FixedClock(now))),
    )
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn post_runs_a_sweep_and_returns_results() {
    let cloud = test_cloud();
    let router = build_router(test_reaper(&cloud));

    let req = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ignored": true}"#))
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json[DUE]["status"], "stopped");
    assert_eq!(cloud.stop_calls(), vec![DUE.to_string()]);
}

#[tokio::test]
async fn get_runs_a_sweep_too() {
    let cloud = test_cloud();
    let router = build_router(test_reaper(&cloud));

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cloud.stop_calls().len(), 1);
}

#[tokio::test]
async fn repeated_trigger_returns_empty_map() {
    let cloud = test_cloud();
    let router = build_router(test_reaper(&cloud));

    let first = Request::builder().method("POST").uri("/").body(Body::empty()).unwrap();
    router.clone().oneshot(first).await.unwrap();

    let second = Request::builder().method("POST").uri("/").body(Body::empty()).unwrap();
    let resp = router.oneshot(second).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!({}));
}

#[tokio::test]
async fn auth_failure_is_a_server_error() {
    let cloud = test_cloud();
    cloud.fail_auth();
    let router = build_router(test_reaper(&cloud));

    let req = Request::builder().method("POST").uri("/").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("credentials revoked"));
}

#[tokio::test]
async fn healthz_does_not_sweep() {
    let cloud = test_cloud();
    let router = build_router(test_reaper(&cloud));

    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cloud.stop_calls().is_empty());
}
