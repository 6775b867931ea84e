use crate::domain::{
    models::booking::{Booking, NewHold},
    ports::BookingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn place_hold(&self, hold: &NewHold) -> Result<Booking, AppError> {
        // The capacity guard and the insert run as one statement. SQLite
        // serializes writers, so two racing holds for the last seat cannot
        // both pass the guard.
        let now = Utc::now();
        let inserted = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (qari_id, student_id, slot_date, start_time, end_time, status, expires_at, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, 'hold', ?, ?, ?
             WHERE (SELECT COUNT(*) FROM bookings
                    WHERE qari_id = ? AND slot_date = ? AND start_time = ? AND end_time = ?
                      AND status IN ('hold', 'confirmed'))
                 < (SELECT capacity FROM availability_slots
                    WHERE qari_id = ? AND slot_date = ? AND start_time = ? AND end_time = ?)
             RETURNING *"
        )
            .bind(hold.qari_id).bind(hold.student_id).bind(hold.slot_date)
            .bind(hold.start_time).bind(hold.end_time).bind(hold.expires_at)
            .bind(now).bind(now)
            .bind(hold.qari_id).bind(hold.slot_date).bind(hold.start_time).bind(hold.end_time)
            .bind(hold.qari_id).bind(hold.slot_date).bind(hold.start_time).bind(hold.end_time)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        match inserted {
            Some(booking) => Ok(booking),
            None => {
                // Guard failed: either the window is full or the slot was
                // deleted after the caller looked it up.
                let slot_exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM availability_slots
                     WHERE qari_id = ? AND slot_date = ? AND start_time = ? AND end_time = ?"
                )
                    .bind(hold.qari_id).bind(hold.slot_date).bind(hold.start_time).bind(hold.end_time)
                    .fetch_one(&self.pool).await.map_err(AppError::Database)?;

                if slot_exists == 0 {
                    Err(AppError::NotFound("Slot not found".into()))
                } else {
                    Err(AppError::Conflict("Slot fully booked".into()))
                }
            }
        }
    }

    async fn expire_stale_holds(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE bookings SET status = 'expired', updated_at = ?
             WHERE status = 'hold' AND expires_at < ?"
        )
            .bind(now).bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn confirm(&self, student_id: i64, booking_id: i64) -> Result<(), AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE bookings SET status = 'confirmed', updated_at = ?
             WHERE booking_id = ? AND student_id = ? AND status = 'hold' AND expires_at > ?"
        )
            .bind(now).bind(booking_id).bind(student_id).bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Hold expired or not found".into()));
        }
        Ok(())
    }

    async fn cancel_by_student(&self, student_id: i64, booking_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = ?
             WHERE booking_id = ? AND student_id = ? AND status IN ('hold', 'confirmed')"
        )
            .bind(Utc::now()).bind(booking_id).bind(student_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn delete_by_student(&self, student_id: i64, booking_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE booking_id = ? AND student_id = ?")
            .bind(booking_id).bind(student_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE student_id = ? ORDER BY slot_date, start_time"
        )
            .bind(student_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn apply_external_created(
        &self,
        qari_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO availability_slots (qari_id, slot_date, start_time, end_time, capacity, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)
             ON CONFLICT (qari_id, slot_date, start_time, end_time)
             DO UPDATE SET updated_at = excluded.updated_at"
        )
            .bind(qari_id).bind(slot_date).bind(start_time).bind(end_time).bind(now).bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        // Redelivered events hit uq_bookings_external_confirmed and turn
        // into a no-op.
        sqlx::query(
            "INSERT INTO bookings (qari_id, student_id, slot_date, start_time, end_time, status, expires_at, created_at, updated_at)
             VALUES (?, NULL, ?, ?, ?, 'confirmed', NULL, ?, ?)
             ON CONFLICT DO NOTHING"
        )
            .bind(qari_id).bind(slot_date).bind(start_time).bind(end_time).bind(now).bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn cancel_window(
        &self,
        qari_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = ?
             WHERE qari_id = ? AND slot_date = ? AND start_time = ? AND end_time = ?
               AND status IN ('hold', 'confirmed')"
        )
            .bind(Utc::now()).bind(qari_id).bind(slot_date).bind(start_time).bind(end_time)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
