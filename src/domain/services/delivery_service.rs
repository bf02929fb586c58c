use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::models::booking::{is_e164, Booking};
use crate::domain::models::delivery::{
    DeliveryAttempt, DeliveryChannel, DeliveryMethod, SendError, TicketArtifact,
};
use crate::domain::ports::{
    BookingRepository, DeliveryLogRepository, EmailService, TicketArchive, TicketSender,
};
use crate::domain::services::retry::{retry_with_backoff, RetryPolicy};
use crate::error::AppError;

/// Ticket delivery pipeline: WhatsApp with retries, then email, then the
/// local archive. Runs inside the background worker only. Whatever happens
/// here never touches payment state.
pub struct DeliveryService {
    sender: Arc<dyn TicketSender>,
    email_service: Arc<dyn EmailService>,
    archive: Arc<dyn TicketArchive>,
    delivery_repo: Arc<dyn DeliveryLogRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    policy: RetryPolicy,
}

impl DeliveryService {
    pub fn new(
        sender: Arc<dyn TicketSender>,
        email_service: Arc<dyn EmailService>,
        archive: Arc<dyn TicketArchive>,
        delivery_repo: Arc<dyn DeliveryLogRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        policy: RetryPolicy,
    ) -> Self {
        Self { sender, email_service, archive, delivery_repo, booking_repo, policy }
    }

    pub async fn deliver(&self, booking: &Booking, artifact: &TicketArtifact) -> Result<DeliveryMethod, AppError> {
        if !is_e164(&booking.phone) {
            warn!("Booking {} has non-E.164 phone '{}', skipping primary channel", booking.id, booking.phone);
            let attempt = DeliveryAttempt::failed(
                &booking.id,
                DeliveryChannel::Whatsapp,
                &SendError::Permanent(format!("invalid phone number format: {}", booking.phone)),
            );
            self.record(&attempt).await;
            return self.fallback(booking, artifact).await;
        }

        let sender = self.sender.clone();
        let delivery_repo = self.delivery_repo.clone();
        let phone = booking.phone.clone();
        let booking_id = booking.id.clone();
        let artifact_copy = artifact.clone();

        let result = retry_with_backoff(
            &self.policy,
            move |_attempt| {
                let sender = sender.clone();
                let delivery_repo = delivery_repo.clone();
                let phone = phone.clone();
                let booking_id = booking_id.clone();
                let artifact = artifact_copy.clone();
                async move {
                    match sender.send_ticket(&phone, &artifact).await {
                        Ok(receipt) => {
                            let attempt = DeliveryAttempt::sent(&booking_id, DeliveryChannel::Whatsapp, &receipt.message_id);
                            if let Err(e) = delivery_repo.record(&attempt).await {
                                error!("Failed to record delivery attempt: {:?}", e);
                            }
                            Ok(receipt)
                        }
                        Err(send_err) => {
                            let attempt = DeliveryAttempt::failed(&booking_id, DeliveryChannel::Whatsapp, &send_err);
                            if let Err(e) = delivery_repo.record(&attempt).await {
                                error!("Failed to record delivery attempt: {:?}", e);
                            }
                            Err(send_err)
                        }
                    }
                }
            },
            |e: &SendError| e.is_transient(),
        ).await;

        match result {
            Ok(receipt) => {
                self.booking_repo
                    .mark_delivery_result(&booking.id, true, Some(&receipt.message_id))
                    .await?;
                info!("Ticket for booking {} delivered via WhatsApp ({})", booking.id, receipt.message_id);
                Ok(DeliveryMethod::Whatsapp)
            }
            Err(send_err) => {
                warn!("WhatsApp delivery for booking {} gave up: {}", booking.id, send_err);
                self.fallback(booking, artifact).await
            }
        }
    }

    async fn fallback(&self, booking: &Booking, artifact: &TicketArtifact) -> Result<DeliveryMethod, AppError> {
        if let Some(email) = &booking.email
            && !email.is_empty() {
            let attachment = serde_json::to_vec_pretty(artifact)
                .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize ticket artifact: {}", e)))?;
            let subject = format!("Your ticket {} for {}", artifact.ticket_id, artifact.event_name);
            let body = format!("<html><body><pre>{}</pre></body></html>", artifact.message);

            match self.email_service
                .send(email, &subject, &body, Some("ticket.json"), Some(&attachment))
                .await
            {
                Ok(()) => {
                    let attempt = DeliveryAttempt::sent(&booking.id, DeliveryChannel::Email, email);
                    self.record(&attempt).await;
                    self.booking_repo.mark_delivery_result(&booking.id, false, None).await?;
                    info!("Ticket for booking {} delivered via email fallback", booking.id);
                    return Ok(DeliveryMethod::Email);
                }
                Err(e) => {
                    let attempt = DeliveryAttempt::failed(
                        &booking.id,
                        DeliveryChannel::Email,
                        &SendError::Permanent(format!("{}", e)),
                    );
                    self.record(&attempt).await;
                    warn!("Email fallback for booking {} failed: {:?}", booking.id, e);
                }
            }
        }

        match self.archive.store(artifact).await {
            Ok(path) => {
                let attempt = DeliveryAttempt::sent(&booking.id, DeliveryChannel::Local, &path);
                self.record(&attempt).await;
                self.booking_repo.mark_delivery_result(&booking.id, false, None).await?;
                info!("Ticket for booking {} archived locally at {}", booking.id, path);
                Ok(DeliveryMethod::Local)
            }
            Err(e) => {
                let attempt = DeliveryAttempt::failed(
                    &booking.id,
                    DeliveryChannel::Local,
                    &SendError::Permanent(format!("{}", e)),
                );
                self.record(&attempt).await;
                error!("Local archive for booking {} failed: {:?}", booking.id, e);
                Err(AppError::InternalWithMsg(format!("All delivery channels failed for booking {}", booking.id)))
            }
        }
    }

    async fn record(&self, attempt: &DeliveryAttempt) {
        if let Err(e) = self.delivery_repo.record(attempt).await {
            error!("Failed to record delivery attempt: {:?}", e);
        }
    }
}
