use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A block of time a qari has published as bookable.
///
/// Times are stored as naive local values; the frontend sends and displays
/// them as-is. `(qari_id, slot_date, start_time, end_time)` is unique, so
/// republishing a window only updates its capacity.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Slot {
    pub slot_id: i64,
    pub qari_id: i64,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated slot window ready to be upserted. Produced by
/// `domain::services::slots::normalize_entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub qari_id: i64,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}
