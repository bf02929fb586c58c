use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rand::seq::SliceRandom;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::dtos::requests::{ListBookingsQuery, PrebookRequest, ReleaseSeatRequest};
use crate::api::dtos::responses::{
    ConfirmPaymentResponse, DeleteBookingResponse, PrebookOutcome, PrebookResponse,
    PrebookResult, ReleaseResponse,
};
use crate::api::extractors::auth::AdminUser;
use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::models::job::Job;
use crate::domain::models::seat::{SeatId, SeatStatus};
use crate::domain::ports::{BookingFilter, TransitionOutcome};
use crate::domain::services::fanout::SeatUpdate;
use crate::domain::services::seating::available_seats;
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 500;

fn generate_ticket_id() -> String {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("TKT-{}", code)
}

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket_id = generate_ticket_id();
    let job = Job::ticket_delivery(id.clone(), Utc::now());

    match state.booking_repo.confirm_payment(&id, &ticket_id, job).await? {
        TransitionOutcome::Applied(booking) => {
            info!("Payment confirmed for booking {}, ticket {}", booking.id, ticket_id);
            state.fanout.seat_changed(booking.seat_label(), SeatStatus::Paid);
            Ok(Json(ConfirmPaymentResponse {
                ticket_id,
                already_confirmed: false,
            }))
        }
        TransitionOutcome::AlreadyInTarget(booking) => {
            let existing_ticket = booking.ticket_id.clone()
                .ok_or(AppError::InternalWithMsg(format!("Paid booking {} has no ticket id", booking.id)))?;
            info!("Booking {} already confirmed with ticket {}", booking.id, existing_ticket);
            Ok(Json(ConfirmPaymentResponse {
                ticket_id: existing_ticket,
                already_confirmed: true,
            }))
        }
    }
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.booking_repo.cancel(&id).await?;
    if outcome.was_paid {
        warn!("Deleted PAID booking {} (seat {})", id, outcome.booking.seat_label());
    } else {
        info!("Deleted booking {} (seat {})", id, outcome.booking.seat_label());
    }

    state.fanout.seat_changed(outcome.booking.seat_label(), SeatStatus::Available);

    Ok(Json(DeleteBookingResponse { was_paid: outcome.was_paid }))
}

pub async fn resend_ticket(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    if booking.status != "PAID" {
        return Err(AppError::Conflict(format!(
            "Cannot resend ticket for booking in status {}", booking.status
        )));
    }

    state.job_repo.create(&Job::ticket_delivery(booking.id.clone(), Utc::now())).await?;
    info!("Resend queued for booking {}", booking.id);
    Ok(Json(json!({ "status": "queued" })))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
    Query(query): Query<ListBookingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = match &query.status {
        Some(s) => {
            let parsed = BookingStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", s)))?;
            Some(parsed.as_str().to_string())
        }
        None => None,
    };

    let filter = BookingFilter {
        status,
        from: parse_timestamp(query.from.as_deref(), "from")?,
        to: parse_timestamp(query.to.as_deref(), "to")?,
        limit: query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
    };

    let bookings = state.booking_repo.list(&filter).await?;
    Ok(Json(bookings))
}

fn parse_timestamp(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    match value {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| AppError::Validation(format!("Invalid {} timestamp (expected RFC 3339)", field))),
    }
}

pub async fn prebook(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
    Json(payload): Json<PrebookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (targets, prebook_type) = match (&payload.seats, payload.count) {
        (Some(seats), _) => {
            let mut targets = Vec::with_capacity(seats.len());
            for seat_ref in seats {
                targets.push(SeatId::new(seat_ref.table, seat_ref.seat)?);
            }
            (targets, "MANUAL")
        }
        (None, Some(count)) => {
            let active = state.booking_repo.list_active().await?;
            let mut available = available_seats(&active);
            available.shuffle(&mut rand::thread_rng());
            available.truncate(count as usize);
            (available, "RANDOM")
        }
        (None, None) => {
            return Err(AppError::Validation("Either 'seats' or 'count' is required".into()));
        }
    };

    let mut results = Vec::with_capacity(targets.len());
    let mut updates = Vec::new();

    for seat in targets {
        let booking = Booking::prebooked(seat, prebook_type, state.config.seat_price_cents);
        match state.booking_repo.create(&booking).await {
            Ok(created) => {
                updates.push(SeatUpdate { seat: created.seat_label(), status: SeatStatus::Prebooked });
                results.push(PrebookResult {
                    seat: created.seat_label(),
                    outcome: PrebookOutcome::Prebooked,
                    booking_id: Some(created.id),
                });
            }
            // Lost the race against a concurrent booking; report, don't fail.
            Err(AppError::SeatAlreadyBooked(label)) => {
                results.push(PrebookResult {
                    seat: label,
                    outcome: PrebookOutcome::Conflict,
                    booking_id: None,
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!("Prebooked {} of {} requested seats", updates.len(), results.len());
    state.fanout.seats_changed(updates);

    Ok(Json(PrebookResponse { results }))
}

pub async fn release_seat(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
    Json(payload): Json<ReleaseSeatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let seat = SeatId::new(payload.table, payload.seat)?;
    let released = state.booking_repo.release_prebooked_seat(seat.table, seat.seat).await?;

    info!("Released prebooked seat {}", released.seat_label());
    state.fanout.seat_changed(released.seat_label(), SeatStatus::Available);

    Ok(Json(ReleaseResponse { released: vec![released.seat_label()] }))
}

pub async fn release_all(
    State(state): State<Arc<AppState>>,
    _user: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let released = state.booking_repo.release_all_prebooked().await?;
    let labels: Vec<String> = released.iter().map(|b| b.seat_label()).collect();

    info!("Released {} prebooked seats", labels.len());
    let updates = labels.iter()
        .map(|label| SeatUpdate { seat: label.clone(), status: SeatStatus::Available })
        .collect();
    state.fanout.seats_changed(updates);

    Ok(Json(ReleaseResponse { released: labels }))
}
