use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::current_user;
use crate::services::transactions::{TransactionDetailResponse, TransactionPage};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn user_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TransactionPage>, ServiceError> {
    let page = state
        .services
        .transactions
        .get_user_transactions(user_id, query.page.unwrap_or(0), query.limit.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub async fn transaction_detail(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<TransactionDetailResponse>, ServiceError> {
    let user = current_user(&state, &headers).await?;
    let detail = state
        .services
        .transactions
        .get_transaction_detail(order_id, user.as_ref())
        .await?;
    Ok(Json(detail))
}
