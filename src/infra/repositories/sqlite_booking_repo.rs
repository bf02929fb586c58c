use crate::domain::models::{booking::Booking, job::Job};
use crate::domain::ports::{BookingFilter, BookingRepository, CancelOutcome, TransitionOutcome};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn audit(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        booking_id: &str,
        action: &str,
        detail: serde_json::Value,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO audit_log (id, booking_id, action, detail, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(booking_id)
            .bind(action)
            .bind(detail.to_string())
            .bind(Utc::now())
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let result = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, seat_table, seat_number, first_name, last_name, phone, email, status, price_cents, ticket_id, whatsapp_sent, whatsapp_message_id, prebook_type, created_at, payment_confirmed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(booking.seat_table).bind(booking.seat_number)
            .bind(&booking.first_name).bind(&booking.last_name).bind(&booking.phone).bind(&booking.email)
            .bind(&booking.status).bind(booking.price_cents).bind(&booking.ticket_id)
            .bind(booking.whatsapp_sent).bind(&booking.whatsapp_message_id).bind(&booking.prebook_type)
            .bind(booking.created_at).bind(booking.payment_confirmed_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) => {
                if let Some(db_err) = e.as_database_error()
                    && db_err.is_unique_violation() {
                    return Err(AppError::SeatAlreadyBooked(booking.seat_label()));
                }
                Err(AppError::Database(e))
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_ticket_id(&self, ticket_id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE ticket_id = ?")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_active_by_seat(&self, table: i32, seat: i32) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE seat_table = ? AND seat_number = ? AND status != 'CANCELLED'"
        )
            .bind(table)
            .bind(seat)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_active(&self) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE status != 'CANCELLED'")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM bookings WHERE 1=1");
        if let Some(status) = &filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = filter.from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND created_at <= ").push_bind(to);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(filter.limit);

        qb.build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_pending(&self, id: &str) -> Result<TransitionOutcome, AppError> {
        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'PENDING' WHERE id = ? AND status = 'SELECTED' RETURNING *"
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if let Some(booking) = updated {
            return Ok(TransitionOutcome::Applied(booking));
        }

        let existing = self.find_by_id(id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        match existing.status.as_str() {
            "PENDING" => Ok(TransitionOutcome::AlreadyInTarget(existing)),
            other => Err(AppError::Conflict(format!(
                "Cannot report payment for booking in status {}", other
            ))),
        }
    }

    async fn confirm_payment(&self, id: &str, ticket_id: &str, job: Job) -> Result<TransitionOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'PAID', ticket_id = ?, payment_confirmed_at = ?
             WHERE id = ? AND status IN ('SELECTED', 'PENDING')
             RETURNING *"
        )
            .bind(ticket_id)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        match updated {
            Some(booking) => {
                Self::audit(&mut tx, id, "PAYMENT_CONFIRMED", json!({ "ticket_id": ticket_id })).await?;
                sqlx::query(
                    "INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
                )
                    .bind(&job.id).bind(&job.job_type).bind(&job.payload)
                    .bind(job.execute_at).bind(&job.status).bind(&job.error_message).bind(job.created_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
                tx.commit().await.map_err(AppError::Database)?;
                Ok(TransitionOutcome::Applied(booking))
            }
            None => {
                let existing = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(AppError::Database)?
                    .ok_or(AppError::NotFound("Booking not found".into()))?;
                match existing.status.as_str() {
                    "PAID" => Ok(TransitionOutcome::AlreadyInTarget(existing)),
                    other => Err(AppError::Conflict(format!(
                        "Cannot confirm payment for booking in status {}", other
                    ))),
                }
            }
        }
    }

    async fn cancel(&self, id: &str) -> Result<CancelOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let existing = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        let was_paid = existing.status == "PAID";

        // The UPDATE is the check; a racing cancel matches zero rows.
        let cancelled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED' WHERE id = ? AND status != 'CANCELLED' RETURNING *"
        )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Booking is already cancelled".into()))?;

        sqlx::query(
            "UPDATE jobs SET status = 'CANCELLED' WHERE json_extract(payload, '$.booking_id') = ? AND status = 'PENDING'"
        )
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        Self::audit(&mut tx, id, "CANCELLED", json!({ "was_paid": was_paid })).await?;
        tx.commit().await.map_err(AppError::Database)?;

        Ok(CancelOutcome { booking: cancelled, was_paid })
    }

    async fn release_prebooked_seat(&self, table: i32, seat: i32) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let released = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED'
             WHERE seat_table = ? AND seat_number = ? AND status = 'PREBOOKED'
             RETURNING *"
        )
            .bind(table)
            .bind(seat)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound(format!("No prebooked seat {}-{}", table, seat)))?;

        Self::audit(&mut tx, &released.id, "PREBOOK_RELEASED", json!({ "seat": released.seat_label() })).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(released)
    }

    async fn release_all_prebooked(&self) -> Result<Vec<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let released = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED' WHERE status = 'PREBOOKED' RETURNING *"
        )
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for booking in &released {
            Self::audit(&mut tx, &booking.id, "PREBOOK_RELEASED", json!({ "seat": booking.seat_label() })).await?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(released)
    }

    async fn mark_delivery_result(&self, id: &str, sent: bool, message_id: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE bookings SET whatsapp_sent = ?, whatsapp_message_id = ? WHERE id = ?")
            .bind(sent)
            .bind(message_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
