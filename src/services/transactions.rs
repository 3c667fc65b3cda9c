use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::entities::user;
use crate::errors::ServiceError;
use crate::repositories::{OrderDetailAddOnStore, OrderRecord, OrderStore};

/// Roles allowed to read any transaction, not just their own.
const STAFF_ROLES: [&str; 3] = ["STAFF", "ADMIN", "EMPLOYEE"];

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u64,
    pub total_page: u64,
    pub prev: bool,
    pub next: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOnView {
    pub name: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub product_name: Option<String>,
    pub product_img: Option<String>,
    pub qty: i32,
    pub subtotal: Decimal,
    pub size: Option<String>,
    pub add_ons: Vec<AddOnView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub id: i32,
    pub receiver_name: String,
    pub status_name: String,
    pub payment_name: Option<String>,
    pub delivery_name: String,
    pub delivery_address: Option<String>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub grand_total: Decimal,
    pub created_date: DateTime<Utc>,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    pub id: i32,
    pub receiver_name: String,
    pub status_name: String,
    pub payment_name: Option<String>,
    pub delivery_name: String,
    pub delivery_address: Option<String>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub payment_fee: Decimal,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    pub created_date: DateTime<Utc>,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub data: Vec<TransactionSummary>,
    pub meta: PageMeta,
}

/// Detail responses wrap the single record in a list.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetailResponse {
    pub data: Vec<TransactionDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingOrder {
    pub id: i32,
    pub status: String,
    pub table_number: Option<i32>,
    pub address: Option<String>,
    pub shipper_id: Option<i32>,
    pub created_date: DateTime<Utc>,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingPage {
    pub data: Vec<PendingOrder>,
    pub meta: PageMeta,
}

/// Clamp raw query parameters to sane paging values.
pub fn clamp_paging(page: i64, limit: i64) -> (u64, u64) {
    let page = if page < 1 { DEFAULT_PAGE } else { page as u64 };
    let limit = if limit < 1 { DEFAULT_LIMIT } else { limit as u64 };
    (page, limit)
}

pub fn page_meta(page: u64, limit: u64, total: u64) -> PageMeta {
    let total_page = if limit == 0 { 0 } else { total.div_ceil(limit) };
    PageMeta {
        current_page: page,
        total_page,
        prev: page > 1,
        next: page < total_page,
    }
}

/// Read-side projections over order aggregates: customer transaction
/// history, single-transaction detail with access control, and the
/// staff-facing pending order board.
pub struct TransactionService {
    orders: Arc<dyn OrderStore>,
    detail_add_ons: Arc<dyn OrderDetailAddOnStore>,
}

impl TransactionService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        detail_add_ons: Arc<dyn OrderDetailAddOnStore>,
    ) -> Self {
        Self {
            orders,
            detail_add_ons,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_user_transactions(
        &self,
        user_id: i32,
        page: i64,
        limit: i64,
    ) -> Result<TransactionPage, ServiceError> {
        let (page, limit) = clamp_paging(page, limit);
        let (records, total) = self.orders.find_by_customer(user_id, page, limit).await?;
        let mut data = Vec::with_capacity(records.len());
        for record in &records {
            data.push(self.summary(record).await?);
        }
        Ok(TransactionPage {
            data,
            meta: page_meta(page, limit, total),
        })
    }

    #[instrument(skip(self, current_user))]
    pub async fn get_transaction_detail(
        &self,
        order_id: i32,
        current_user: Option<&user::Model>,
    ) -> Result<TransactionDetailResponse, ServiceError> {
        // Existence is checked before authorization, matching the
        // mobile client's expectation of a 404 for dead links.
        let record = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        let user = current_user.ok_or(ServiceError::Forbidden)?;
        let is_owner = record.customer.as_ref().map(|c| c.user_id) == Some(user.user_id);
        let is_staff = user
            .role
            .as_deref()
            .map(|role| STAFF_ROLES.iter().any(|r| role.eq_ignore_ascii_case(r)))
            .unwrap_or(false);
        if !(is_owner || is_staff) {
            return Err(ServiceError::Forbidden);
        }

        let detail = self.detail(&record).await?;
        Ok(TransactionDetailResponse { data: vec![detail] })
    }

    #[instrument(skip(self))]
    pub async fn list_pending(
        &self,
        status: &str,
        delivery_type: &str,
        page: i64,
        limit: i64,
    ) -> Result<PendingPage, ServiceError> {
        let (page, limit) = clamp_paging(page, limit);
        let (records, total) = match delivery_type.to_ascii_uppercase().as_str() {
            "TABLE" => self.orders.find_active_dine_in(page, limit).await?,
            "SHIPPING" => self.orders.find_active_delivery(page, limit).await?,
            _ => self.orders.find_by_status(status, page, limit).await?,
        };
        let mut data = Vec::with_capacity(records.len());
        for record in &records {
            data.push(PendingOrder {
                id: record.order.order_id,
                status: record.order.status.clone(),
                table_number: record.table.as_ref().map(|t| t.number),
                address: record.address.as_ref().map(|a| a.address_line.clone()),
                shipper_id: record.order.shipper_id,
                created_date: record.order.created_at,
                products: self.product_views(record).await?,
            });
        }
        Ok(PendingPage {
            data,
            meta: page_meta(page, limit, total),
        })
    }

    async fn summary(&self, record: &OrderRecord) -> Result<TransactionSummary, ServiceError> {
        let (delivery_name, delivery_address) = delivery_view(record);
        Ok(TransactionSummary {
            id: record.order.order_id,
            receiver_name: receiver_name(record),
            status_name: record.order.status.clone(),
            payment_name: payment_name(record),
            delivery_name,
            delivery_address,
            subtotal: record.order.subtotal.unwrap_or(Decimal::ZERO),
            shipping_fee: record.order.shipping_fee.unwrap_or(Decimal::ZERO),
            grand_total: record.order.grand_total.unwrap_or(Decimal::ZERO),
            created_date: record.order.created_at,
            products: self.product_views(record).await?,
        })
    }

    async fn detail(&self, record: &OrderRecord) -> Result<TransactionDetail, ServiceError> {
        let (delivery_name, delivery_address) = delivery_view(record);
        Ok(TransactionDetail {
            id: record.order.order_id,
            receiver_name: receiver_name(record),
            status_name: record.order.status.clone(),
            payment_name: payment_name(record),
            delivery_name,
            delivery_address,
            subtotal: record.order.subtotal.unwrap_or(Decimal::ZERO),
            delivery_fee: record.order.shipping_fee.unwrap_or(Decimal::ZERO),
            // No processor surcharges today; the client still expects the key.
            payment_fee: Decimal::ZERO,
            grand_total: record.order.grand_total.unwrap_or(Decimal::ZERO),
            notes: record.order.notes.clone(),
            created_date: record.order.created_at,
            products: self.product_views(record).await?,
        })
    }

    async fn product_views(
        &self,
        record: &OrderRecord,
    ) -> Result<Vec<ProductView>, ServiceError> {
        let mut views = Vec::with_capacity(record.details.len());
        for line in &record.details {
            let bindings = self
                .detail_add_ons
                .find_by_detail(line.detail.order_detail_id)
                .await?;
            let add_ons = bindings
                .into_iter()
                .map(|binding| AddOnView {
                    name: binding.add_on.map(|a| a.name),
                    price: binding.unit_price.unwrap_or(Decimal::ZERO),
                })
                .collect();
            views.push(ProductView {
                // Snapshot name wins; the live product may have been renamed.
                product_name: line
                    .detail
                    .product_name
                    .clone()
                    .or_else(|| line.product.as_ref().map(|p| p.name.clone())),
                product_img: line.product.as_ref().and_then(|p| p.image_url.clone()),
                qty: line.detail.quantity,
                subtotal: line.detail.line_total.unwrap_or(Decimal::ZERO),
                size: line.size.as_ref().map(|s| s.name.clone()),
                add_ons,
            });
        }
        Ok(views)
    }
}

fn receiver_name(record: &OrderRecord) -> String {
    record
        .customer
        .as_ref()
        .and_then(|c| c.full_name.clone())
        .unwrap_or_default()
}

fn payment_name(record: &OrderRecord) -> Option<String> {
    record
        .payments
        .first()
        .and_then(|p| p.method.map(|m| m.to_string()))
}

/// Address wins over table when both are present.
fn delivery_view(record: &OrderRecord) -> (String, Option<String>) {
    if let Some(address) = &record.address {
        ("Shipping".to_string(), Some(address.address_line.clone()))
    } else if let Some(table) = &record.table {
        (format!("Table {}", table.number), None)
    } else {
        (String::new(), None)
    }
}
