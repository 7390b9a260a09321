use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::model::{Booking, Ms};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("no listeners for room {0}")]
    NoListeners(String),
    #[error("notification failed: {0}")]
    Failed(String),
}

/// Delivers booking confirmations to whoever cares. Delivery is best-effort.
pub trait Notifier: Send + Sync {
    fn send_cancellation_confirmation(&self, booking: &Booking) -> Result<(), NotificationError>;
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn send_cancellation_confirmation(&self, booking: &Booking) -> Result<(), NotificationError> {
        (**self).send_cancellation_confirmation(booking)
    }
}

/// Payload published on a room channel, JSON-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notice {
    BookingCancelled {
        booking_id: String,
        room_id: String,
        start: Ms,
        end: Ms,
    },
}

/// Broadcast hub with one channel per room.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<String>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to notifications for a room. Creates the channel if needed.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<String> {
        let sender = self
            .channels
            .entry(room_id.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    fn publish(&self, room_id: &str, notice: &Notice) -> Result<(), NotificationError> {
        let payload =
            serde_json::to_string(notice).map_err(|e| NotificationError::Failed(e.to_string()))?;
        let sender = self
            .channels
            .get(room_id)
            .ok_or_else(|| NotificationError::NoListeners(room_id.to_owned()))?;
        sender
            .send(payload)
            .map(|_| ())
            .map_err(|_| NotificationError::NoListeners(room_id.to_owned()))
    }
}

impl Notifier for NotifyHub {
    fn send_cancellation_confirmation(&self, booking: &Booking) -> Result<(), NotificationError> {
        let notice = Notice::BookingCancelled {
            booking_id: booking.id().to_owned(),
            room_id: booking.room_id().to_owned(),
            start: booking.start(),
            end: booking.end(),
        };
        self.publish(booking.room_id(), &notice)
    }
}
