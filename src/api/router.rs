use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{availability, booking, health, webhook};
use tower_http::{
    classify::ServerErrorsFailureClass,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Availability (public read, qari writes)
        .route("/availability", get(availability::get_availability).put(availability::publish_slots))
        .route("/availability/bulk", delete(availability::bulk_delete_slots))
        .route("/availability/{slot_id}", delete(availability::delete_slot))

        // Booking flow (student)
        .route("/bookings", get(booking::list_my_bookings))
        .route("/bookings/hold", post(booking::place_hold))
        .route("/bookings/confirm", post(booking::confirm_booking))
        .route("/bookings/cancel", post(booking::cancel_booking))
        .route("/bookings/{booking_id}", delete(booking::delete_booking))

        // External calendar gateway
        .route("/webhook", post(webhook::receive_webhook))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
