use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, booking, health, ws};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Student booking flow
        .route("/api/v1/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/{id}/report-payment", post(booking::report_payment))
        .route("/api/v1/seats", get(booking::get_seats))
        .route("/api/v1/tickets/{ticket_id}", get(booking::get_ticket))

        // Real-time fan-out
        .route("/api/v1/ws", get(ws::ws_handler))

        // Admin reconciliation
        .route("/api/v1/admin/bookings", get(admin::list_bookings))
        .route("/api/v1/admin/bookings/{id}", delete(admin::delete_booking))
        .route("/api/v1/admin/bookings/{id}/confirm-payment", post(admin::confirm_payment))
        .route("/api/v1/admin/bookings/{id}/resend-ticket", post(admin::resend_ticket))
        .route("/api/v1/admin/prebook", post(admin::prebook))
        .route("/api/v1/admin/seats/release", post(admin::release_seat))
        .route("/api/v1/admin/seats/release-all", post(admin::release_all))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
