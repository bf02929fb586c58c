use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::models::seat::SeatStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatUpdate {
    pub seat: String,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatEvent {
    SeatChanged { seat: String, status: SeatStatus },
    SeatsChanged { updates: Vec<SeatUpdate> },
    AdminNotice { message: String },
}

/// Best-effort at-most-once fan-out over two broadcast channels. Never a
/// source of truth; clients reconcile through the seat-status endpoint.
pub struct FanoutHub {
    public_tx: broadcast::Sender<SeatEvent>,
    admin_tx: broadcast::Sender<SeatEvent>,
}

impl FanoutHub {
    pub fn new(capacity: usize) -> Self {
        let (public_tx, _) = broadcast::channel(capacity);
        let (admin_tx, _) = broadcast::channel(capacity);
        Self { public_tx, admin_tx }
    }

    pub fn subscribe_public(&self) -> broadcast::Receiver<SeatEvent> {
        self.public_tx.subscribe()
    }

    pub fn subscribe_admin(&self) -> broadcast::Receiver<SeatEvent> {
        self.admin_tx.subscribe()
    }

    /// Seat-state events go to everyone. Send errors mean no receivers,
    /// which is fine.
    pub fn publish_public(&self, event: SeatEvent) {
        let _ = self.public_tx.send(event);
    }

    /// Admin-only notices.
    pub fn publish_admin(&self, event: SeatEvent) {
        let _ = self.admin_tx.send(event);
    }

    pub fn seat_changed(&self, seat: String, status: SeatStatus) {
        self.publish_public(SeatEvent::SeatChanged { seat, status });
    }

    pub fn seats_changed(&self, updates: Vec<SeatUpdate>) {
        if updates.is_empty() {
            return;
        }
        self.publish_public(SeatEvent::SeatsChanged { updates });
    }

    pub fn admin_notice(&self, message: String) {
        self.publish_admin(SeatEvent::AdminNotice { message });
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new(256)
    }
}
