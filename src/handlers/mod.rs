//! Thin HTTP layer: extract, delegate to a service, serialize.

pub mod discounts;
pub mod health;
pub mod orders;
pub mod transactions;

use axum::http::HeaderMap;

use crate::entities::user;
use crate::errors::ServiceError;
use crate::AppState;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";

/// Resolve the caller from the gateway-injected user id header.
/// Absent or malformed headers mean an anonymous caller, not an error.
pub(crate) async fn current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<user::Model>, ServiceError> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let Ok(value) = raw.to_str() else {
        return Ok(None);
    };
    let Ok(user_id) = value.trim().parse::<i32>() else {
        return Ok(None);
    };
    state.services.users.find_by_id(user_id).await
}
