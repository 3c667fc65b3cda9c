use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::services::order_pricing::OrderLineRequest;
use crate::services::order_status::ChangeStatusRequest;
use crate::services::transactions::PendingPage;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusChanged {
    pub id: i32,
    pub status: String,
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<StatusChanged>, ServiceError> {
    let record = state
        .services
        .order_status
        .change_status(order_id, request)
        .await?;
    Ok(Json(StatusChanged {
        id: record.order.order_id,
        status: record.order.status,
    }))
}

pub async fn attach_add_ons(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(lines): Json<Vec<OrderLineRequest>>,
) -> Result<StatusCode, ServiceError> {
    let order = state
        .services
        .orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;
    state
        .services
        .pricing
        .attach_add_ons(&order, &lines)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub delivery_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<PendingPage>, ServiceError> {
    let page = state
        .services
        .transactions
        .list_pending(
            query.status.as_deref().unwrap_or("PENDING"),
            query.delivery_type.as_deref().unwrap_or(""),
            query.page.unwrap_or(0),
            query.limit.unwrap_or(0),
        )
        .await?;
    Ok(Json(page))
}
