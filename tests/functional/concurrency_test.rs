//! Functional tests for admission control under concurrent load

use axum::http::StatusCode;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use tower::ServiceExt;

use crate::support::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overlap_in_backend() {
    let app = test_app(CountingBackend::with_delay(Duration::from_millis(25))).await;
    let request = body(&rgba_data_url(32, 32), &mask_data_url(32, 32), "a cat");

    let responses = join_all((0..10).map(|_| {
        let router = app.router.clone();
        let request = post_json("/api/image-mask", &request);
        async move { router.oneshot(request).await.unwrap() }
    }))
    .await;

    let mut job_ids = HashSet::new();
    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        job_ids.insert(json["job_id"].as_str().unwrap().to_string());
    }

    assert_eq!(job_ids.len(), 10);
    assert_eq!(app.backend.calls(), 10);
    assert_eq!(app.backend.peak(), 1);

    let gate = app.state.pipeline.gate().snapshot();
    assert!(!gate.held);
    assert_eq!(gate.waiting, 0);
    assert_eq!(gate.released, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failures_under_load_do_not_starve_later_jobs() {
    let backend = CountingBackend {
        delay: Duration::from_millis(5),
        fail_first: 3,
        ..Default::default()
    };
    let app = test_app(backend).await;
    let request = body(&rgb_data_url(16, 16), &gray_mask_data_url(16, 16), "a cat");

    let responses = join_all((0..8).map(|_| {
        let router = app.router.clone();
        let request = post_json("/api/image-mask", &request);
        async move { router.oneshot(request).await.unwrap().status() }
    }))
    .await;

    let failed = responses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count();
    let succeeded = responses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(failed, 3);
    assert_eq!(succeeded, 5);
    assert_eq!(app.backend.peak(), 1);
    assert!(!app.state.pipeline.gate().snapshot().held);
}
