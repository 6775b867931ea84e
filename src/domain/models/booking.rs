use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One student's claim against a slot's capacity.
///
/// `status` is lowercase text: `hold`, `confirmed`, `cancelled`, `expired`.
/// Transitions are hold -> confirmed, hold -> cancelled, hold -> expired and
/// confirmed -> cancelled; `cancelled` and `expired` are terminal.
///
/// `student_id` is NULL for bookings injected by the calendar reconciler,
/// which arrive already `confirmed`. `expires_at` is only meaningful while
/// the status is `hold`.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub booking_id: i64,
    pub qari_id: i64,
    pub student_id: Option<i64>,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for a coordinator-created hold. The end time always comes
/// from the published slot, never from the caller.
#[derive(Debug, Clone)]
pub struct NewHold {
    pub qari_id: i64,
    pub student_id: i64,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub expires_at: DateTime<Utc>,
}

pub const HOLD_TTL_MINUTES: i64 = 15;

impl NewHold {
    pub fn new(
        qari_id: i64,
        student_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            qari_id,
            student_id,
            slot_date,
            start_time,
            end_time,
            expires_at: Utc::now() + Duration::minutes(HOLD_TTL_MINUTES),
        }
    }
}
