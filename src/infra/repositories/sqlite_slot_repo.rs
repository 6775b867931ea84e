use crate::domain::{
    models::slot::{NewSlot, Slot},
    ports::SlotRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn upsert_batch(&self, slots: &[NewSlot]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();
        for slot in slots {
            sqlx::query(
                "INSERT INTO availability_slots (qari_id, slot_date, start_time, end_time, capacity, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (qari_id, slot_date, start_time, end_time)
                 DO UPDATE SET capacity = excluded.capacity, updated_at = excluded.updated_at"
            )
                .bind(slot.qari_id).bind(slot.slot_date).bind(slot.start_time).bind(slot.end_time)
                .bind(slot.capacity).bind(now).bind(now)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_window(
        &self,
        qari_id: i64,
        slot_date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>(
            "SELECT * FROM availability_slots WHERE qari_id = ? AND slot_date = ? AND start_time = ?"
        )
            .bind(qari_id).bind(slot_date).bind(start_time)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_range(
        &self,
        qari_id: Option<i64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>, AppError> {
        match qari_id {
            Some(qari_id) => sqlx::query_as::<_, Slot>(
                "SELECT * FROM availability_slots
                 WHERE qari_id = ? AND slot_date BETWEEN ? AND ?
                 ORDER BY slot_date, start_time"
            )
                .bind(qari_id).bind(start).bind(end)
                .fetch_all(&self.pool).await.map_err(AppError::Database),
            None => sqlx::query_as::<_, Slot>(
                "SELECT * FROM availability_slots
                 WHERE slot_date BETWEEN ? AND ?
                 ORDER BY slot_date, start_time"
            )
                .bind(start).bind(end)
                .fetch_all(&self.pool).await.map_err(AppError::Database),
        }
    }

    async fn delete_one(&self, qari_id: i64, slot_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_slots WHERE slot_id = ? AND qari_id = ?")
            .bind(slot_id).bind(qari_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Slot not found".into()));
        }
        Ok(())
    }

    async fn delete_by_dates(&self, qari_id: i64, dates: &[NaiveDate]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut deleted = 0;
        for date in dates {
            let result = sqlx::query("DELETE FROM availability_slots WHERE qari_id = ? AND slot_date = ?")
                .bind(qari_id).bind(date)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            deleted += result.rows_affected();
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(deleted)
    }

    async fn delete_by_range(
        &self,
        qari_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM availability_slots WHERE qari_id = ? AND slot_date BETWEEN ? AND ?"
        )
            .bind(qari_id).bind(start).bind(end)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
