//! kopi-api: backend for the KopiCafe ordering application.
//!
//! Covers order pricing reconciliation, order lifecycle transitions,
//! discount validation, and transaction history projections.

#![forbid(unsafe_code)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod repositories;
pub mod services;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::repositories::{
    OrderDetailAddOnStore, OrderStore, SqlCatalogStore, SqlDiscountCodeStore,
    SqlOrderDetailAddOnStore, SqlOrderStore, SqlUserStore, UserStore,
};
use crate::services::notifications::EventNotifier;
use crate::services::tables::TableService;
use crate::services::{
    DiscountService, OrderPricingService, OrderStatusService, TransactionService,
};

/// Service container shared by the handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserStore>,
    pub order_status: Arc<OrderStatusService>,
    pub pricing: Arc<OrderPricingService>,
    pub discounts: Arc<DiscountService>,
    pub transactions: Arc<TransactionService>,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    /// Wire the SQL-backed stores and services over one pool.
    pub fn new(db: Arc<DbPool>, config: AppConfig, events: EventSender) -> Self {
        let orders: Arc<dyn OrderStore> = Arc::new(SqlOrderStore::new(db.clone()));
        let users: Arc<dyn UserStore> = Arc::new(SqlUserStore::new(db.clone()));
        let catalog = Arc::new(SqlCatalogStore::new(db.clone()));
        let detail_add_ons: Arc<dyn OrderDetailAddOnStore> =
            Arc::new(SqlOrderDetailAddOnStore::new(db.clone()));

        let order_status = Arc::new(OrderStatusService::new(
            orders.clone(),
            catalog.clone(),
            Arc::new(TableService::new(db.clone())),
            Arc::new(EventNotifier::new(events)),
        ));
        let pricing = Arc::new(OrderPricingService::new(
            catalog.clone(),
            catalog.clone(),
            catalog,
            detail_add_ons.clone(),
        ));
        let discounts = Arc::new(DiscountService::new(Arc::new(SqlDiscountCodeStore::new(
            db.clone(),
        ))));
        let transactions = Arc::new(TransactionService::new(orders.clone(), detail_add_ons));

        Self {
            db,
            config,
            services: AppServices {
                orders,
                users,
                order_status,
                pricing,
                discounts,
                transactions,
            },
        }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/orders/pending",
            get(handlers::orders::list_pending),
        )
        .route(
            "/api/orders/:id/status",
            put(handlers::orders::change_status),
        )
        .route(
            "/api/orders/:id/add-ons",
            post(handlers::orders::attach_add_ons),
        )
        .route(
            "/api/discounts/validate",
            post(handlers::discounts::validate),
        )
        .route(
            "/api/users/:id/transactions",
            get(handlers::transactions::user_transactions),
        )
        .route(
            "/api/transactions/:id",
            get(handlers::transactions::transaction_detail),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
