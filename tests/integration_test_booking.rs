mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn publish_slot(app: &TestApp, qari_id: i64, date: &str, start: &str, capacity: i32) {
    let token = app.token(qari_id, "qari");
    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri("/availability")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "slots": [{ "slot_date": date, "start_time": start, "capacity": capacity }]
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn hold(app: &TestApp, student_id: i64, qari_id: i64, date: &str, start: &str) -> (StatusCode, Value) {
    let token = app.token(student_id, "student");
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/bookings/hold")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "qariId": qari_id, "slot_date": date, "start_time": start
            }).to_string())).unwrap()
    ).await.unwrap();
    let status = res.status();
    (status, parse_body(res).await)
}

async fn post_booking_op(app: &TestApp, student_id: i64, path: &str, booking_id: i64) -> StatusCode {
    let token = app.token(student_id, "student");
    app.router.clone().oneshot(
        Request::builder().method("POST").uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "booking_id": booking_id }).to_string())).unwrap()
    ).await.unwrap().status()
}

#[tokio::test]
async fn test_hold_consumes_capacity() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 1).await;

    let (status, body) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["booking_id"].is_i64());
    assert!(body["data"]["expires_at"].is_string());

    // Second student hits the capacity wall.
    let (status, body) = hold(&app, 11, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_capacity_two_admits_two_holds() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 2).await;

    let (status, _) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = hold(&app, 11, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = hold(&app, 12, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_hold_validation_and_missing_slot() {
    let app = TestApp::new().await;

    let (status, _) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let token = app.token(10, "student");
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/bookings/hold")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "qariId": 1 }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Qaris do not place holds.
    let qari_token = app.token(1, "qari");
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/bookings/hold")
            .header(header::AUTHORIZATION, format!("Bearer {}", qari_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "qariId": 1, "slot_date": "2024-06-01", "start_time": "10:00"
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_confirm_happy_path_is_single_shot() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 1).await;

    let (_, body) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    let booking_id = body["data"]["booking_id"].as_i64().unwrap();

    assert_eq!(post_booking_op(&app, 10, "/bookings/confirm", booking_id).await, StatusCode::OK);
    // A confirmed booking is no longer a hold.
    assert_eq!(post_booking_op(&app, 10, "/bookings/confirm", booking_id).await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirm_rejects_non_owner_and_expired() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 2).await;

    let (_, body) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    let booking_id = body["data"]["booking_id"].as_i64().unwrap();

    // Non-owner gets the same answer as a lapsed hold.
    assert_eq!(post_booking_op(&app, 11, "/bookings/confirm", booking_id).await, StatusCode::CONFLICT);

    // Simulate the 15-minute TTL lapsing.
    sqlx::query("UPDATE bookings SET expires_at = ? WHERE booking_id = ?")
        .bind(Utc::now() - Duration::minutes(16))
        .bind(booking_id)
        .execute(&app.pool).await.unwrap();

    assert_eq!(post_booking_op(&app, 10, "/bookings/confirm", booking_id).await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_expired_hold_releases_capacity() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 1).await;

    let (_, body) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    let booking_id = body["data"]["booking_id"].as_i64().unwrap();

    let (status, _) = hold(&app, 11, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::CONFLICT);

    sqlx::query("UPDATE bookings SET expires_at = ? WHERE booking_id = ?")
        .bind(Utc::now() - Duration::minutes(16))
        .bind(booking_id)
        .execute(&app.pool).await.unwrap();

    // The next hold attempt sweeps the stale hold and takes the seat.
    let (status, _) = hold(&app, 11, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::OK);

    let status_row: String = sqlx::query_scalar("SELECT status FROM bookings WHERE booking_id = ?")
        .bind(booking_id)
        .fetch_one(&app.pool).await.unwrap();
    assert_eq!(status_row, "expired");
}

#[tokio::test]
async fn test_cancel_frees_capacity_and_checks_ownership() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 1).await;

    let (_, body) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    let booking_id = body["data"]["booking_id"].as_i64().unwrap();
    assert_eq!(post_booking_op(&app, 10, "/bookings/confirm", booking_id).await, StatusCode::OK);

    // Cancelling someone else's booking is a 404, not a 403.
    assert_eq!(post_booking_op(&app, 11, "/bookings/cancel", booking_id).await, StatusCode::NOT_FOUND);

    assert_eq!(post_booking_op(&app, 10, "/bookings/cancel", booking_id).await, StatusCode::OK);
    // Cancelled is terminal.
    assert_eq!(post_booking_op(&app, 10, "/bookings/cancel", booking_id).await, StatusCode::NOT_FOUND);

    let (status, _) = hold(&app, 11, 1, "2024-06-01", "10:00").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_booking_removes_history() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 1).await;

    let (_, body) = hold(&app, 10, 1, "2024-06-01", "10:00").await;
    let booking_id = body["data"]["booking_id"].as_i64().unwrap();

    let other_token = app.token(11, "student");
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/bookings/{}", booking_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", other_token))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let owner_token = app.token(10, "student");
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/bookings/{}", booking_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", owner_token))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE booking_id = ?")
        .bind(booking_id)
        .fetch_one(&app.pool).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_list_my_bookings_is_scoped_to_caller() {
    let app = TestApp::new().await;
    publish_slot(&app, 1, "2024-06-01", "10:00", 2).await;
    publish_slot(&app, 1, "2024-06-01", "14:00", 1).await;

    hold(&app, 10, 1, "2024-06-01", "10:00").await;
    hold(&app, 11, 1, "2024-06-01", "14:00").await;

    let token = app.token(10, "student");
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/bookings")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = parse_body(res).await;
    let bookings = body["data"]["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["student_id"], 10);
    assert_eq!(bookings[0]["status"], "hold");
}
