use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{CancelRequest, ConfirmRequest, HoldRequest};
use crate::api::dtos::responses::{ok, ok_message, HoldPlacedResponse};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::booking::NewHold;
use crate::domain::services::slots::parse_time;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn place_hold(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<HoldRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    let (qari_id, slot_date, start_raw) =
        match (payload.qari_id, payload.slot_date, payload.start_time) {
            (Some(q), Some(d), Some(s)) => (q, d, s),
            _ => return Err(AppError::Validation("missing fields".into())),
        };

    let start_time = parse_time(&start_raw)
        .ok_or(AppError::Validation("Invalid time format (HH:MM)".into()))?;

    let slot = state.slot_repo.find_window(qari_id, slot_date, start_time).await?
        .ok_or(AppError::NotFound("Slot not found".into()))?;

    // Opportunistic cleanup so lapsed holds stop counting against capacity.
    // Best-effort: a failure here must not block the hold itself.
    if let Err(e) = state.booking_repo.expire_stale_holds().await {
        warn!("Stale hold sweep failed: {:?}", e);
    }

    let hold = NewHold::new(qari_id, user.user_id, slot_date, slot.start_time, slot.end_time);
    let booking = state.booking_repo.place_hold(&hold).await?;

    info!(
        "Hold {} placed by student {} on qari {} {} {}",
        booking.booking_id, user.user_id, qari_id, slot_date, slot.start_time
    );

    Ok(ok(HoldPlacedResponse {
        booking_id: booking.booking_id,
        expires_at: booking.expires_at.ok_or(AppError::Internal)?,
    }))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    let booking_id = payload.booking_id
        .ok_or(AppError::Validation("booking_id required".into()))?;

    state.booking_repo.confirm(user.user_id, booking_id).await?;
    info!("Booking {} confirmed by student {}", booking_id, user.user_id);

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CancelRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    let booking_id = payload.booking_id
        .ok_or(AppError::Validation("booking_id required".into()))?;

    state.booking_repo.cancel_by_student(user.user_id, booking_id).await?;
    info!("Booking {} cancelled by student {}", booking_id, user.user_id);

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    state.booking_repo.delete_by_student(user.user_id, booking_id).await?;
    info!("Booking {} deleted by student {}", booking_id, user.user_id);

    Ok(ok_message("Booking cancelled successfully"))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    let bookings = state.booking_repo.list_by_student(user.user_id).await?;
    Ok(ok(serde_json::json!({ "bookings": bookings })))
}
