use std::collections::HashMap;
use serde::Serialize;

use crate::domain::models::booking::Booking;
use crate::domain::models::seat::{SeatId, SeatStatus};

#[derive(Debug, Clone, Serialize)]
pub struct SeatStatusEntry {
    pub seat: String,
    pub table: i32,
    pub number: i32,
    pub status: SeatStatus,
}

/// Derives the full seat-status map from the set of active bookings.
/// Seats without an active booking are available.
pub fn seat_status_map(active: &[Booking]) -> Vec<SeatStatusEntry> {
    let by_seat: HashMap<(i32, i32), &Booking> = active
        .iter()
        .map(|b| ((b.seat_table, b.seat_number), b))
        .collect();

    SeatId::all()
        .map(|seat| {
            let status = by_seat
                .get(&(seat.table, seat.seat))
                .map(|b| SeatStatus::from_active(&b.status))
                .unwrap_or(SeatStatus::Available);
            SeatStatusEntry {
                seat: seat.label(),
                table: seat.table,
                number: seat.seat,
                status,
            }
        })
        .collect()
}

/// Seats with no active booking, in table order.
pub fn available_seats(active: &[Booking]) -> Vec<SeatId> {
    let taken: HashMap<(i32, i32), ()> = active
        .iter()
        .map(|b| ((b.seat_table, b.seat_number), ()))
        .collect();

    SeatId::all()
        .filter(|seat| !taken.contains_key(&(seat.table, seat.seat)))
        .collect()
}
