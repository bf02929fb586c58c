use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};

use crate::domain::models::delivery::TicketArtifact;
use crate::domain::models::job::Job;
use crate::domain::services::delivery_service::DeliveryService;
use crate::domain::services::retry::RetryPolicy;
use crate::error::AppError;
use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const CLAIM_BATCH: i32 = 10;

pub async fn start_delivery_worker(state: Arc<AppState>) {
    info!("Starting ticket delivery worker...");

    let delivery_service = DeliveryService::new(
        state.ticket_sender.clone(),
        state.email_service.clone(),
        state.ticket_archive.clone(),
        state.delivery_repo.clone(),
        state.booking_repo.clone(),
        RetryPolicy::default(),
    );

    loop {
        match state.job_repo.find_pending(CLAIM_BATCH).await {
            Ok(jobs) => {
                for job in jobs {
                    let span = info_span!(
                        "delivery_job",
                        job_id = %job.id,
                        job_type = %job.job_type,
                        booking_id = %job.payload.booking_id
                    );

                    let state = state.clone();
                    let delivery_ref = &delivery_service;

                    async move {
                        info!("Processing job: {}", job.job_type);
                        match process_job(&state, delivery_ref, &job).await {
                            Ok(_) => {
                                info!("Job completed successfully");
                                if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                                    error!("Failed to mark job as completed: {:?}", e);
                                }
                            }
                            Err(e) => {
                                let err_msg = format!("{}", e);
                                error!("Job failed with error: {}", err_msg);
                                state.fanout.admin_notice(format!(
                                    "Ticket delivery failed for booking {}: {}",
                                    job.payload.booking_id, err_msg
                                ));
                                if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                                    error!("Failed to mark job as failed: {:?}", up_err);
                                }
                            }
                        }
                    }
                        .instrument(span)
                        .await;
                }
            }
            Err(e) => error!("Failed to fetch pending jobs: {:?}", e),
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn process_job(
    state: &Arc<AppState>,
    delivery_service: &DeliveryService,
    job: &Job,
) -> Result<(), AppError> {
    let booking_id = &job.payload.booking_id;

    let booking = state.booking_repo.find_by_id(booking_id).await?
        .ok_or(AppError::NotFound(format!("Booking {} not found", booking_id)))?;

    // Payment state is settled before delivery ever starts.
    if booking.status != "PAID" {
        return Err(AppError::Conflict(format!(
            "Booking {} is no longer PAID (status {})", booking_id, booking.status
        )));
    }
    let ticket_id = booking.ticket_id.clone()
        .ok_or(AppError::InternalWithMsg(format!("Paid booking {} has no ticket id", booking_id)))?;

    let mut context = tera::Context::new();
    context.insert("event_name", &state.config.event_name);
    context.insert("holder_name", &booking.holder_name());
    context.insert("seat", &booking.seat_label());
    context.insert("table", &booking.seat_table);
    context.insert("number", &booking.seat_number);
    context.insert("ticket_id", &ticket_id);

    let message = state.templates.render("ticket_message.txt", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Ticket template render error: {:?}", e)))?;

    let artifact = TicketArtifact {
        ticket_id,
        booking_id: booking.id.clone(),
        event_name: state.config.event_name.clone(),
        holder_name: booking.holder_name(),
        seat: booking.seat_label(),
        message,
    };

    let method = delivery_service.deliver(&booking, &artifact).await?;
    info!("Ticket for booking {} delivered via {:?}", booking.id, method);
    Ok(())
}
