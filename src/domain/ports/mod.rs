use crate::domain::models::{
    booking::{Booking, NewHold},
    slot::{NewSlot, Slot},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Upserts a batch of published windows in one transaction. Conflicting
    /// windows only get their capacity overwritten.
    async fn upsert_batch(&self, slots: &[NewSlot]) -> Result<(), AppError>;
    async fn find_window(
        &self,
        qari_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<Slot>, AppError>;
    async fn list_by_range(
        &self,
        qari_id: Option<i64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>, AppError>;
    async fn delete_one(&self, qari_id: i64, slot_id: i64) -> Result<(), AppError>;
    async fn delete_by_dates(&self, qari_id: i64, dates: &[NaiveDate]) -> Result<u64, AppError>;
    async fn delete_by_range(
        &self,
        qari_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomically checks capacity for the hold's window and inserts the hold.
    /// The check and insert are serialized per window so that concurrent calls
    /// can never oversell a slot. Fails with `Conflict` when the window is
    /// full and `NotFound` when the slot vanished since the caller looked it up.
    async fn place_hold(&self, hold: &NewHold) -> Result<Booking, AppError>;
    /// Flips every lapsed hold to `expired`. Returns the number of rows flipped.
    async fn expire_stale_holds(&self) -> Result<u64, AppError>;
    /// `hold -> confirmed`, only for the owning student and only while the
    /// hold is alive. Failure does not reveal whether the booking exists.
    async fn confirm(&self, student_id: i64, booking_id: i64) -> Result<(), AppError>;
    async fn cancel_by_student(&self, student_id: i64, booking_id: i64) -> Result<(), AppError>;
    async fn delete_by_student(&self, student_id: i64, booking_id: i64) -> Result<(), AppError>;
    async fn list_by_student(&self, student_id: i64) -> Result<Vec<Booking>, AppError>;
    /// Reconciler path for `invitee.created`: in one transaction, upserts a
    /// blocking availability window and inserts a `confirmed` booking with no
    /// student. Idempotent under webhook redelivery.
    async fn apply_external_created(
        &self,
        qari_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<(), AppError>;
    /// Reconciler path for `invitee.canceled`: cancels any active booking for
    /// the exact window. Returns the number of bookings cancelled.
    async fn cancel_window(
        &self,
        qari_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<u64, AppError>;
}
