//! SeaORM models for the KopiCafe schema.

pub mod add_on;
pub mod address;
pub mod dining_table;
pub mod discount_code;
pub mod order;
pub mod order_detail;
pub mod order_detail_add_on;
pub mod payment;
pub mod product;
pub mod product_add_on;
pub mod product_size;
pub mod size;
pub mod user;

pub use payment::{PaymentMethod, PaymentStatus};
