use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{AvailabilityQuery, BulkDeleteRequest, PublishSlotsRequest};
use crate::api::dtos::responses::{ok, ok_message};
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::slots::{month_bounds, normalize_entry};
use crate::error::AppError;
use crate::state::AppState;
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (year, month) = match (params.year, params.month) {
        (Some(y), Some(m)) => (y, m),
        _ => return Err(AppError::Validation("year and month are required".into())),
    };

    let (start, end) = month_bounds(year, month)
        .ok_or(AppError::Validation("invalid year/month".into()))?;

    let slots = state.slot_repo.list_by_range(params.qari_id, start, end).await?;
    info!("Found {} slots for {}-{:02}", slots.len(), year, month);

    Ok(ok(serde_json::json!({ "slots": slots })))
}

pub async fn publish_slots(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<PublishSlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_qari()?;

    let entries = match payload.slots {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Err(AppError::Validation("slots required".into())),
    };

    let mut slots = Vec::with_capacity(entries.len());
    for entry in &entries {
        match normalize_entry(user.user_id, entry) {
            Ok(slot) => slots.push(slot),
            // A bad entry skips that entry, not the batch.
            Err(reason) => warn!("Skipping invalid slot entry {:?}: {:?}", entry, reason),
        }
    }

    state.slot_repo.upsert_batch(&slots).await?;
    info!("Upserted {} of {} submitted slots for qari {}", slots.len(), entries.len(), user.user_id);

    Ok(ok_message("Availability updated"))
}

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(slot_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    user.require_qari()?;

    // Ownership mismatch reads the same as nonexistence on purpose.
    state.slot_repo.delete_one(user.user_id, slot_id).await?;
    info!("Slot {} deleted by qari {}", slot_id, user.user_id);

    Ok(ok_message("Slot deleted successfully"))
}

pub async fn bulk_delete_slots(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_qari()?;

    let deleted = if let Some(dates) = payload.dates.filter(|d| !d.is_empty()) {
        state.slot_repo.delete_by_dates(user.user_id, &dates).await?
    } else if let (Some(start), Some(end)) = (payload.start_date, payload.end_date) {
        state.slot_repo.delete_by_range(user.user_id, start, end).await?
    } else if let Some(week_start) = payload.week_start_date {
        state.slot_repo
            .delete_by_range(user.user_id, week_start, week_start + Duration::days(6))
            .await?
    } else {
        return Err(AppError::Validation(
            "dates, startDate/endDate, or weekStartDate required".into(),
        ));
    };

    info!("Bulk deleted {} slots for qari {}", deleted, user.user_id);

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Successfully deleted {} slot(s)", deleted),
        "deletedCount": deleted
    })))
}
