use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

/// Uniform response envelope: `{success, message?, data?}`.
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn ok_message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

#[derive(Serialize)]
pub struct HoldPlacedResponse {
    pub booking_id: i64,
    pub expires_at: DateTime<Utc>,
}
