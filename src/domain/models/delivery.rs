use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Outbound send failure classification. Transient failures are retried,
/// permanent ones go straight to the fallback chain.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("transient send failure: {0}")]
    Transient(String),
    #[error("permanent send failure: {0}")]
    Permanent(String),
}

impl SendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SendError::Transient(_))
    }
}

#[derive(Debug, Clone)]
pub struct ProviderReceipt {
    pub message_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    Whatsapp,
    Email,
    Local,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Whatsapp => "WHATSAPP",
            DeliveryChannel::Email => "EMAIL",
            DeliveryChannel::Local => "LOCAL",
        }
    }
}

/// Channel the ticket finally went out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Whatsapp,
    Email,
    Local,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct DeliveryAttempt {
    pub id: String,
    pub booking_id: String,
    pub channel: String,
    pub status: String,
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl DeliveryAttempt {
    pub fn sent(booking_id: &str, channel: DeliveryChannel, message_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            channel: channel.as_str().to_string(),
            status: "SENT".to_string(),
            message_id: Some(message_id.to_string()),
            error: None,
            attempted_at: Utc::now(),
        }
    }

    pub fn failed(booking_id: &str, channel: DeliveryChannel, error: &SendError) -> Self {
        let status = if error.is_transient() { "TRANSIENT_FAILURE" } else { "PERMANENT_FAILURE" };
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            channel: channel.as_str().to_string(),
            status: status.to_string(),
            message_id: None,
            error: Some(error.to_string()),
            attempted_at: Utc::now(),
        }
    }
}

/// The rendered ticket plus structured metadata. This is what gets sent,
/// attached to fallback emails, and archived as JSON.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TicketArtifact {
    pub ticket_id: String,
    pub booking_id: String,
    pub event_name: String,
    pub holder_name: String,
    pub seat: String,
    pub message: String,
}
