use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::ServiceError;

/// Domain events emitted by the services. Consumers (the in-process
/// dispatcher, push notifications) subscribe to the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderStatusChanged {
        order_id: i32,
        old_status: String,
        new_status: String,
    },
    OrderCompleted {
        order_id: i32,
    },
}

/// Cloneable handle for publishing events onto the shared channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        debug!(?event, "publishing event");
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(e.to_string()))
    }
}

/// Build the event channel used at startup.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}
