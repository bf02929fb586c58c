use crate::domain::{models::delivery::DeliveryAttempt, ports::DeliveryLogRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteDeliveryRepo {
    pool: SqlitePool,
}

impl SqliteDeliveryRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl DeliveryLogRepository for SqliteDeliveryRepo {
    async fn record(&self, attempt: &DeliveryAttempt) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO delivery_attempts (id, booking_id, channel, status, message_id, error, attempted_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(&attempt.id)
            .bind(&attempt.booking_id)
            .bind(&attempt.channel)
            .bind(&attempt.status)
            .bind(&attempt.message_id)
            .bind(&attempt.error)
            .bind(attempt.attempted_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_for_booking(&self, booking_id: &str) -> Result<Vec<DeliveryAttempt>, AppError> {
        sqlx::query_as::<_, DeliveryAttempt>(
            "SELECT * FROM delivery_attempts WHERE booking_id = ? ORDER BY attempted_at ASC"
        )
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
