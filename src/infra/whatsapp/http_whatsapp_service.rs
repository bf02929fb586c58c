use crate::domain::models::delivery::{ProviderReceipt, SendError, TicketArtifact};
use crate::domain::ports::TicketSender;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

pub struct HttpWhatsappService {
    client: Client,
    api_url: String,
    api_token: String,
}

impl HttpWhatsappService {
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            api_token,
        }
    }
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    to: &'a str,
    body: &'a str,
    reference: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    message_id: Option<String>,
}

#[async_trait]
impl TicketSender for HttpWhatsappService {
    async fn send_ticket(&self, phone: &str, artifact: &TicketArtifact) -> Result<ProviderReceipt, SendError> {
        let payload = MessagePayload {
            to: phone,
            body: &artifact.message,
            reference: &artifact.ticket_id,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!("WhatsApp provider connection error: {}", e);
                SendError::Transient(format!("connection error: {}", e))
            })?;

        let status = res.status();
        if status.is_success() {
            let message_id = res.json::<MessageResponse>().await
                .ok()
                .and_then(|r| r.message_id)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            return Ok(ProviderReceipt { message_id });
        }

        let text = res.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            warn!("WhatsApp provider transient error {}: {}", status, text);
            Err(SendError::Transient(format!("provider error {}: {}", status, text)))
        } else {
            error!("WhatsApp provider rejected message {}: {}", status, text);
            Err(SendError::Permanent(format!("provider rejected {}: {}", status, text)))
        }
    }
}
