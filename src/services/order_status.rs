use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{instrument, warn};

use crate::entities::payment::PaymentStatus;
use crate::errors::ServiceError;
use crate::repositories::{OrderRecord, OrderStore, ProductStore};
use crate::services::notifications::NotificationService;
use crate::services::tables::TableAvailability;

/// Order lifecycle states. Any state may be set from any other; the
/// kitchen and counter staff correct mistakes by moving orders freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OrderStatus {
    Pending,
    Paid,
    Ready,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Payment status a transition into this state forces onto the
    /// order's first payment, if any.
    pub fn payment_status(self) -> Option<PaymentStatus> {
        match self {
            OrderStatus::Cancelled => Some(PaymentStatus::Cancelled),
            OrderStatus::Pending => Some(PaymentStatus::Pending),
            OrderStatus::Paid | OrderStatus::Completed => Some(PaymentStatus::Paid),
            OrderStatus::Ready | OrderStatus::Delivering => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

/// Drives order status transitions and their side effects: stock
/// deduction on completion, payment sync, table release, notifications.
pub struct OrderStatusService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    tables: Arc<dyn TableAvailability>,
    notifier: Arc<dyn NotificationService>,
}

impl OrderStatusService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        tables: Arc<dyn TableAvailability>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            orders,
            products,
            tables,
            notifier,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn change_status(
        &self,
        order_id: i32,
        request: ChangeStatusRequest,
    ) -> Result<OrderRecord, ServiceError> {
        // Parse before touching storage; a bad status never costs a query.
        let new_status: OrderStatus = request.status.trim().parse().map_err(|_| {
            ServiceError::InvalidStatus(format!(
                "Unknown order status: {}",
                request.status.trim()
            ))
        })?;

        let mut record = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;
        let old_status = record.order.status.clone();

        if new_status == OrderStatus::Completed {
            self.deduct_stock(&mut record).await?;
        }

        record.order.status = new_status.to_string();
        record.order.updated_at = Some(Utc::now());

        if let Some(payment_status) = new_status.payment_status() {
            if let Some(first) = record.payments.first_mut() {
                first.status = payment_status;
            }
        }

        if let Some(table) = &record.table {
            self.tables
                .set_available_if_no_pending_orders(table.table_id)
                .await?;
        }

        let new_status_str = record.order.status.clone();
        if let Err(e) = self
            .notifier
            .notify_customer(&record, &old_status, &new_status_str)
            .await
        {
            warn!(order_id, error = %e, "customer notification failed");
        }
        if let Err(e) = self
            .notifier
            .notify_staff(&record, &old_status, &new_status_str)
            .await
        {
            warn!(order_id, error = %e, "staff notification failed");
        }

        self.orders.save(&record).await?;
        Ok(record)
    }

    /// Aggregate demand per product across all lines, validate every
    /// product before mutating anything, then deduct and persist each
    /// product once. A shortfall leaves all stock untouched, including
    /// when the same product appears on several lines.
    async fn deduct_stock(&self, record: &mut OrderRecord) -> Result<(), ServiceError> {
        let mut demand: BTreeMap<i32, i32> = BTreeMap::new();
        for line in &record.details {
            if let Some(product) = &line.product {
                *demand.entry(product.product_id).or_default() += line.detail.quantity;
            }
        }

        let mut deductions = Vec::with_capacity(demand.len());
        for (&product_id, &required) in &demand {
            let Some(product) = self.products.find_by_id(product_id).await? else {
                continue;
            };
            if product.stock_quantity < required {
                return Err(ServiceError::ValidationError(format!(
                    "Insufficient stock for product {}",
                    product.name
                )));
            }
            deductions.push((product, required));
        }

        for (mut product, required) in deductions {
            product.stock_quantity -= required;
            self.products.save(&product).await?;
            for line in &mut record.details {
                if line.detail.product_id == Some(product.product_id) {
                    line.product = Some(product.clone());
                }
            }
        }
        Ok(())
    }
}
