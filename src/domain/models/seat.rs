use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::AppError;

pub const TABLE_COUNT: i32 = 36;
pub const SEATS_PER_TABLE: i32 = 14;

/// Composite seat identity, rendered as "table-seat" (e.g. "5-3").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatId {
    pub table: i32,
    pub seat: i32,
}

impl SeatId {
    pub fn new(table: i32, seat: i32) -> Result<Self, AppError> {
        if !(1..=TABLE_COUNT).contains(&table) {
            return Err(AppError::Validation(format!(
                "Table must be between 1 and {}, got {}", TABLE_COUNT, table
            )));
        }
        if !(1..=SEATS_PER_TABLE).contains(&seat) {
            return Err(AppError::Validation(format!(
                "Seat must be between 1 and {}, got {}", SEATS_PER_TABLE, seat
            )));
        }
        Ok(Self { table, seat })
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.table, self.seat)
    }

    pub fn all() -> impl Iterator<Item = SeatId> {
        (1..=TABLE_COUNT).flat_map(|table| {
            (1..=SEATS_PER_TABLE).map(move |seat| SeatId { table, seat })
        })
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.table, self.seat)
    }
}

impl FromStr for SeatId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (table, seat) = s.split_once('-')
            .ok_or_else(|| AppError::Validation(format!("Invalid seat label: {}", s)))?;
        let table = table.parse::<i32>()
            .map_err(|_| AppError::Validation(format!("Invalid seat label: {}", s)))?;
        let seat = seat.parse::<i32>()
            .map_err(|_| AppError::Validation(format!("Invalid seat label: {}", s)))?;
        SeatId::new(table, seat)
    }
}

/// Displayed seat state. Derived from the active booking for the seat,
/// never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Pending,
    Paid,
    Prebooked,
}

impl SeatStatus {
    /// Maps a non-cancelled booking status to the displayed seat state.
    pub fn from_active(booking_status: &str) -> Self {
        match booking_status {
            "PAID" => SeatStatus::Paid,
            "PREBOOKED" => SeatStatus::Prebooked,
            _ => SeatStatus::Pending,
        }
    }
}
