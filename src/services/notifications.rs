use async_trait::async_trait;
use tracing::instrument;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::OrderRecord;
use crate::services::order_status::OrderStatus;

/// Port for pushing order status updates to interested parties.
/// Failures here never block a status transition; callers log and move on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify_customer(
        &self,
        order: &OrderRecord,
        old_status: &str,
        new_status: &str,
    ) -> Result<(), ServiceError>;

    async fn notify_staff(
        &self,
        order: &OrderRecord,
        old_status: &str,
        new_status: &str,
    ) -> Result<(), ServiceError>;
}

/// Publishes status changes onto the event channel; downstream
/// consumers fan them out to websockets and push tokens.
pub struct EventNotifier {
    events: EventSender,
}

impl EventNotifier {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    async fn publish(
        &self,
        order: &OrderRecord,
        old_status: &str,
        new_status: &str,
    ) -> Result<(), ServiceError> {
        self.events
            .send(Event::OrderStatusChanged {
                order_id: order.order.order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
    }
}

#[async_trait]
impl NotificationService for EventNotifier {
    #[instrument(skip(self, order), fields(order_id = order.order.order_id))]
    async fn notify_customer(
        &self,
        order: &OrderRecord,
        old_status: &str,
        new_status: &str,
    ) -> Result<(), ServiceError> {
        self.publish(order, old_status, new_status).await?;
        // Completion gets its own event so kitchen displays and loyalty
        // consumers can subscribe without parsing status strings. Emitted
        // from the customer path only, so it fires once per transition.
        if matches!(new_status.parse::<OrderStatus>(), Ok(OrderStatus::Completed)) {
            self.events
                .send(Event::OrderCompleted {
                    order_id: order.order.order_id,
                })
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = order.order.order_id))]
    async fn notify_staff(
        &self,
        order: &OrderRecord,
        old_status: &str,
        new_status: &str,
    ) -> Result<(), ServiceError> {
        self.publish(order, old_status, new_status).await
    }
}
