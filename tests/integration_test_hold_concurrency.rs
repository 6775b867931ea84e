mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestApp;
use serde_json::json;
use tokio::task::JoinSet;
use tower::ServiceExt;

// Exceeding a window's capacity with simultaneous holds must admit exactly
// `capacity` of them.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_holds_never_oversell() {
    let app = TestApp::new().await;

    let qari_token = app.token(1, "qari");
    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri("/availability")
            .header(header::AUTHORIZATION, format!("Bearer {}", qari_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "slots": [{ "slot_date": "2024-06-01", "start_time": "10:00", "capacity": 3 }]
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let attempts = 10;
    let mut set = JoinSet::new();

    for student_id in 0..attempts {
        let router = app.router.clone();
        let token = app.token(100 + student_id, "student");
        set.spawn(async move {
            let res = router.oneshot(
                Request::builder().method("POST").uri("/bookings/hold")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({
                        "qariId": 1, "slot_date": "2024-06-01", "start_time": "10:00"
                    }).to_string())).unwrap()
            ).await.unwrap();
            res.status()
        });
    }

    let mut successes = 0;
    let mut conflicts = 0;
    while let Some(result) = set.join_next().await {
        match result.unwrap() {
            StatusCode::OK => successes += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("Unexpected status under contention: {}", other),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(conflicts, 7);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE status IN ('hold', 'confirmed')"
    ).fetch_one(&app.pool).await.unwrap();
    assert_eq!(active, 3);
}
