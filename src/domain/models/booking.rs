use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use regex::Regex;
use std::sync::LazyLock;

use crate::domain::models::seat::SeatId;

static E164_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").unwrap());

pub fn is_e164(phone: &str) -> bool {
    E164_RE.is_match(phone)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Selected,
    Pending,
    Paid,
    Prebooked,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Selected => "SELECTED",
            BookingStatus::Pending => "PENDING",
            BookingStatus::Paid => "PAID",
            BookingStatus::Prebooked => "PREBOOKED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SELECTED" => Some(BookingStatus::Selected),
            "PENDING" => Some(BookingStatus::Pending),
            "PAID" => Some(BookingStatus::Paid),
            "PREBOOKED" => Some(BookingStatus::Prebooked),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub seat_table: i32,
    pub seat_number: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub status: String,
    pub price_cents: i64,
    pub ticket_id: Option<String>,
    pub whatsapp_sent: bool,
    pub whatsapp_message_id: Option<String>,
    pub prebook_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
}

pub struct NewBookingParams {
    pub seat: SeatId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub price_cents: i64,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seat_table: params.seat.table,
            seat_number: params.seat.seat,
            first_name: params.first_name,
            last_name: params.last_name,
            phone: params.phone,
            email: params.email,
            status: BookingStatus::Selected.as_str().to_string(),
            price_cents: params.price_cents,
            ticket_id: None,
            whatsapp_sent: false,
            whatsapp_message_id: None,
            prebook_type: None,
            created_at: Utc::now(),
            payment_confirmed_at: None,
        }
    }

    /// Admin placeholder booking. Holds the seat without a real guest.
    pub fn prebooked(seat: SeatId, prebook_type: &str, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seat_table: seat.table,
            seat_number: seat.seat,
            first_name: "Reserved".to_string(),
            last_name: String::new(),
            phone: String::new(),
            email: None,
            status: BookingStatus::Prebooked.as_str().to_string(),
            price_cents,
            ticket_id: None,
            whatsapp_sent: false,
            whatsapp_message_id: None,
            prebook_type: Some(prebook_type.to_string()),
            created_at: Utc::now(),
            payment_confirmed_at: None,
        }
    }

    pub fn seat(&self) -> SeatId {
        SeatId { table: self.seat_table, seat: self.seat_number }
    }

    pub fn seat_label(&self) -> String {
        format!("{}-{}", self.seat_table, self.seat_number)
    }

    pub fn holder_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}
