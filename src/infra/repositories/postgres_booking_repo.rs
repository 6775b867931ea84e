use crate::domain::{
    models::booking::{Booking, NewHold},
    ports::BookingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn place_hold(&self, hold: &NewHold) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock on the slot serializes racing holds for the same window.
        let capacity = sqlx::query_scalar::<_, i32>(
            "SELECT capacity FROM availability_slots
             WHERE qari_id = $1 AND slot_date = $2 AND start_time = $3 AND end_time = $4
             FOR UPDATE"
        )
            .bind(hold.qari_id).bind(hold.slot_date).bind(hold.start_time).bind(hold.end_time)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Slot not found".into()))?;

        let used = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings
             WHERE qari_id = $1 AND slot_date = $2 AND start_time = $3 AND end_time = $4
               AND status IN ('hold', 'confirmed')"
        )
            .bind(hold.qari_id).bind(hold.slot_date).bind(hold.start_time).bind(hold.end_time)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if used >= capacity as i64 {
            return Err(AppError::Conflict("Slot fully booked".into()));
        }

        let now = Utc::now();
        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (qari_id, student_id, slot_date, start_time, end_time, status, expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 'hold', $6, $7, $7)
             RETURNING *"
        )
            .bind(hold.qari_id).bind(hold.student_id).bind(hold.slot_date)
            .bind(hold.start_time).bind(hold.end_time).bind(hold.expires_at).bind(now)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(booking)
    }

    async fn expire_stale_holds(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'expired', updated_at = NOW()
             WHERE status = 'hold' AND expires_at < NOW()"
        )
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn confirm(&self, student_id: i64, booking_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'confirmed', updated_at = NOW()
             WHERE booking_id = $1 AND student_id = $2 AND status = 'hold' AND expires_at > NOW()"
        )
            .bind(booking_id).bind(student_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Hold expired or not found".into()));
        }
        Ok(())
    }

    async fn cancel_by_student(&self, student_id: i64, booking_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = NOW()
             WHERE booking_id = $1 AND student_id = $2 AND status IN ('hold', 'confirmed')"
        )
            .bind(booking_id).bind(student_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn delete_by_student(&self, student_id: i64, booking_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE booking_id = $1 AND student_id = $2")
            .bind(booking_id).bind(student_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE student_id = $1 ORDER BY slot_date, start_time"
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
             VALUES ($1, $2, $3, $4, 1, $5, $5)
             ON CONFLICT (qari_id, slot_date, start_time, end_time)
             DO UPDATE SET updated_at = EXCLUDED.updated_at"
        )
            .bind(qari_id).bind(slot_date).bind(start_time).bind(end_time).bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        // Redelivered events hit uq_bookings_external_confirmed and turn
        // into a no-op.
        sqlx::query(
            "INSERT INTO bookings (qari_id, student_id, slot_date, start_time, end_time, status, expires_at, created_at, updated_at)
             VALUES ($1, NULL, $2, $3, $4, 'confirmed', NULL, $5, $5)
             ON CONFLICT DO NOTHING"
        )
            .bind(qari_id).bind(slot_date).bind(start_time).bind(end_time).bind(now)
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
            "UPDATE bookings SET status = 'cancelled', updated_at = NOW()
             WHERE qari_id = $1 AND slot_date = $2 AND start_time = $3 AND end_time = $4
               AND status IN ('hold', 'confirmed')"
        )
            .bind(qari_id).bind(slot_date).bind(start_time).bind(end_time)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
