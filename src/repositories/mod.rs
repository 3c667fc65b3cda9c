//! Storage ports and their SeaORM implementations.
//!
//! Services depend on the narrow traits defined here; the `Sql*` types
//! are the production implementations over a shared database pool.
//! Tests substitute mocks or in-memory fakes.

pub mod catalog;
pub mod discount_codes;
pub mod order_add_ons;
pub mod orders;
pub mod users;

use rust_decimal::Decimal;

use crate::entities::{add_on, address, dining_table, order, order_detail, payment, product, size, user};

pub use catalog::{ProductAddOnStore, ProductSizeStore, ProductStore, SqlCatalogStore};
pub use discount_codes::{DiscountCodeStore, SqlDiscountCodeStore};
pub use order_add_ons::{OrderDetailAddOnStore, SqlOrderDetailAddOnStore};
pub use orders::{OrderStore, SqlOrderStore};
pub use users::{SqlUserStore, UserStore};

/// Fully hydrated order aggregate: the order row plus every association
/// the pricing, lifecycle, and projection paths need.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: order::Model,
    pub customer: Option<user::Model>,
    pub table: Option<dining_table::Model>,
    pub address: Option<address::Model>,
    pub details: Vec<OrderLine>,
    pub payments: Vec<payment::Model>,
}

/// One order detail with its live product and size rows resolved.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub detail: order_detail::Model,
    pub product: Option<product::Model>,
    pub size: Option<size::Model>,
}

/// Product/add-on association with the add-on row resolved.
#[derive(Debug, Clone)]
pub struct ProductAddOn {
    pub add_on: add_on::Model,
    pub price: Option<Decimal>,
}

/// Persisted add-on binding for an order line, as read back for views.
#[derive(Debug, Clone)]
pub struct DetailAddOn {
    pub add_on: Option<add_on::Model>,
    pub unit_price: Option<Decimal>,
}

/// New add-on binding to persist for an order line.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDetailAddOn {
    pub order_detail_id: i32,
    pub add_on_id: i32,
    pub unit_price: Decimal,
}
