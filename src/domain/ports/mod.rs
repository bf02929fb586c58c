use crate::domain::models::{
    booking::Booking,
    delivery::{DeliveryAttempt, ProviderReceipt, SendError, TicketArtifact},
    job::Job,
    user::{Session, User},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of a conditional state transition. Lets idempotent callers tell
/// a no-op apart from a conflict.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied(Booking),
    AlreadyInTarget(Booking),
}

impl TransitionOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            TransitionOutcome::Applied(b) => b,
            TransitionOutcome::AlreadyInTarget(b) => b,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub booking: Booking,
    pub was_paid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomic check-and-insert. A seat held by a non-cancelled booking
    /// surfaces as `SeatAlreadyBooked` via the partial unique index.
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_ticket_id(&self, ticket_id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_active_by_seat(&self, table: i32, seat: i32) -> Result<Option<Booking>, AppError>;
    async fn list_active(&self) -> Result<Vec<Booking>, AppError>;
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    /// SELECTED -> PENDING, student self-report.
    async fn mark_pending(&self, id: &str) -> Result<TransitionOutcome, AppError>;
    /// SELECTED|PENDING -> PAID. Assigns the ticket id, writes the audit
    /// entry and enqueues the delivery job in one transaction. Confirming
    /// an already PAID booking returns `AlreadyInTarget` and enqueues
    /// nothing.
    async fn confirm_payment(&self, id: &str, ticket_id: &str, job: Job) -> Result<TransitionOutcome, AppError>;
    /// Logical delete: any active status -> CANCELLED. Pending delivery
    /// jobs for the booking are cancelled in the same transaction.
    async fn cancel(&self, id: &str) -> Result<CancelOutcome, AppError>;
    async fn release_prebooked_seat(&self, table: i32, seat: i32) -> Result<Booking, AppError>;
    async fn release_all_prebooked(&self) -> Result<Vec<Booking>, AppError>;
    async fn mark_delivery_result(&self, id: &str, sent: bool, message_id: Option<&str>) -> Result<(), AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
}

#[async_trait]
pub trait DeliveryLogRepository: Send + Sync {
    async fn record(&self, attempt: &DeliveryAttempt) -> Result<(), AppError>;
    async fn list_for_booking(&self, booking_id: &str) -> Result<Vec<DeliveryAttempt>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), AppError>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError>;
    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait TicketSender: Send + Sync {
    async fn send_ticket(&self, phone: &str, artifact: &TicketArtifact) -> Result<ProviderReceipt, SendError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}

#[async_trait]
pub trait TicketArchive: Send + Sync {
    /// Persists the artifact and returns the storage location.
    async fn store(&self, artifact: &TicketArtifact) -> Result<String, AppError>;
}
