//! Business rules for order pricing, lifecycle, discounts, and history.

pub mod discounts;
pub mod notifications;
pub mod order_pricing;
pub mod order_status;
pub mod tables;
pub mod transactions;

pub use discounts::DiscountService;
pub use notifications::NotificationService;
pub use order_pricing::OrderPricingService;
pub use order_status::{OrderStatus, OrderStatusService};
pub use tables::TableAvailability;
pub use transactions::TransactionService;
