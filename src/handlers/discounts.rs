use axum::{extract::State, Json};

use crate::errors::ServiceError;
use crate::services::discounts::{DiscountValidation, ValidateDiscountRequest};
use crate::AppState;

pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateDiscountRequest>,
) -> Result<Json<DiscountValidation>, ServiceError> {
    let result = state.services.discounts.validate(request).await?;
    Ok(Json(result))
}
