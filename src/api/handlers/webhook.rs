use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::WebhookRequest;
use crate::api::extractors::webhook::WebhookCaller;
use crate::domain::services::reconcile::{extract_qari_id, extract_window};
use crate::state::AppState;
use std::sync::Arc;
use tracing::{error, info, warn};

/// External calendar event ingestion. Delivery is at-least-once and the
/// gateway retries on failure responses, so after authentication every
/// outcome short of a malformed envelope acknowledges with 200. Internal
/// failures are logged, never surfaced.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    _caller: WebhookCaller,
    Json(body): Json<WebhookRequest>,
) -> impl IntoResponse {
    let ack = Json(serde_json::json!({ "success": true }));

    let (event, payload) = match (body.event, body.payload) {
        (Some(event), Some(payload)) => (event, payload),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "success": false })),
            );
        }
    };

    let Some(window) = extract_window(&payload) else {
        // No usable window, nothing to reconcile.
        return (StatusCode::OK, ack);
    };

    let Some(qari_id) = extract_qari_id(&payload) else {
        // Unmapped events are expected; dropping them must not trigger a retry.
        info!("Webhook event {} has no qari mapping, dropping", event);
        return (StatusCode::OK, ack);
    };

    match event.as_str() {
        "invitee.created" => {
            match state.booking_repo
                .apply_external_created(qari_id, window.slot_date, window.start_time, window.end_time)
                .await
            {
                Ok(()) => info!(
                    "External booking confirmed for qari {} on {} {}",
                    qari_id, window.slot_date, window.start_time
                ),
                Err(e) => error!("Webhook invitee.created failed: {:?}", e),
            }
        }
        "invitee.canceled" => {
            match state.booking_repo
                .cancel_window(qari_id, window.slot_date, window.start_time, window.end_time)
                .await
            {
                Ok(n) => info!(
                    "External cancel for qari {} on {} {}: {} bookings cancelled",
                    qari_id, window.slot_date, window.start_time, n
                ),
                Err(e) => error!("Webhook invitee.canceled failed: {:?}", e),
            }
        }
        other => warn!("Ignoring unknown webhook event type: {}", other),
    }

    (StatusCode::OK, ack)
}
