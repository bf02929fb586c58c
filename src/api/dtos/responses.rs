use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::services::seating::SeatStatusEntry;

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct SeatMapResponse {
    pub seats: Vec<SeatStatusEntry>,
}

#[derive(Serialize)]
pub struct ConfirmPaymentResponse {
    pub ticket_id: String,
    pub already_confirmed: bool,
}

#[derive(Serialize)]
pub struct DeleteBookingResponse {
    pub was_paid: bool,
}

#[derive(Serialize)]
pub struct TicketResponse {
    pub ticket_id: String,
    pub seat: String,
    pub holder: String,
    pub status: String,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrebookOutcome {
    Prebooked,
    Conflict,
}

#[derive(Serialize)]
pub struct PrebookResult {
    pub seat: String,
    pub outcome: PrebookOutcome,
    pub booking_id: Option<String>,
}

/// Partial success is the normal shape for bulk prebooks.
#[derive(Serialize)]
pub struct PrebookResponse {
    pub results: Vec<PrebookResult>,
}

#[derive(Serialize)]
pub struct ReleaseResponse {
    pub released: Vec<String>,
}
