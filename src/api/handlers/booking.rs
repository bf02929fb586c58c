use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::{SeatMapResponse, TicketResponse};
use crate::domain::models::booking::{is_e164, Booking, NewBookingParams};
use crate::domain::models::seat::{SeatId, SeatStatus};
use crate::domain::ports::TransitionOutcome;
use crate::domain::services::seating::seat_status_map;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let seat = SeatId::new(payload.table, payload.seat)?;

    let first_name = payload.first_name.trim().to_string();
    let last_name = payload.last_name.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation("First and last name are required".into()));
    }
    if !is_e164(&payload.phone) {
        return Err(AppError::InvalidPhoneFormat(payload.phone));
    }

    let booking = Booking::new(NewBookingParams {
        seat,
        first_name,
        last_name,
        phone: payload.phone,
        email: payload.email.filter(|e| !e.trim().is_empty()),
        price_cents: state.config.seat_price_cents,
    });

    let created = state.booking_repo.create(&booking).await?;
    info!("Booking {} created for seat {}", created.id, created.seat_label());

    state.fanout.seat_changed(created.seat_label(), SeatStatus::Pending);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn report_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.booking_repo.mark_pending(&id).await?;

    if let TransitionOutcome::Applied(booking) = &outcome {
        info!("Booking {} reported payment", booking.id);
        state.fanout.seat_changed(booking.seat_label(), SeatStatus::Pending);
    }

    Ok(Json(outcome.booking().clone()))
}

pub async fn get_seats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let active = state.booking_repo.list_active().await?;
    Ok(Json(SeatMapResponse { seats: seat_status_map(&active) }))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_ticket_id(&ticket_id).await?
        .ok_or(AppError::NotFound("Ticket not found".into()))?;

    Ok(Json(TicketResponse {
        ticket_id,
        seat: booking.seat_label(),
        holder: booking.holder_name(),
        status: booking.status,
        payment_confirmed_at: booking.payment_confirmed_at,
    }))
}
