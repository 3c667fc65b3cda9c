use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::entities::discount_code::DiscountType;
use crate::errors::ServiceError;
use crate::repositories::DiscountCodeStore;

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateDiscountRequest {
    #[serde(default)]
    pub code: Option<String>,
    /// Missing subtotal validates against zero rather than failing
    /// deserialization.
    #[serde(default)]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscountValidation {
    pub valid: bool,
    pub discount_amount: Decimal,
}

/// Validates discount codes against an order subtotal and computes the
/// resulting discount amount.
pub struct DiscountService {
    discount_codes: Arc<dyn DiscountCodeStore>,
}

impl DiscountService {
    pub fn new(discount_codes: Arc<dyn DiscountCodeStore>) -> Self {
        Self { discount_codes }
    }

    #[instrument(skip(self, request))]
    pub async fn validate(
        &self,
        request: ValidateDiscountRequest,
    ) -> Result<DiscountValidation, ServiceError> {
        let code = request.code.as_deref().map(str::trim).unwrap_or("");
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Please enter a discount code".into(),
            ));
        }

        let discount = self
            .discount_codes
            .find_by_code(code)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError("Discount code does not exist".into())
            })?;

        if !discount.is_active {
            return Err(ServiceError::ValidationError(
                "Discount code has been disabled".into(),
            ));
        }

        let now = Utc::now();
        if now < discount.starts_at {
            return Err(ServiceError::ValidationError(
                "Discount code is not yet valid".into(),
            ));
        }
        if now > discount.ends_at {
            return Err(ServiceError::ValidationError(
                "Discount code has expired".into(),
            ));
        }

        if let Some(min) = discount.min_order_amount {
            if request.subtotal < min {
                return Err(ServiceError::ValidationError(
                    "Minimum order value not reached".into(),
                ));
            }
        }

        let raw = match discount.discount_type {
            DiscountType::Percent => request.subtotal * discount.value / Decimal::from(100),
            DiscountType::Amount => discount.value,
        };
        // Never discount more than the order itself is worth.
        let cap = request.subtotal.max(Decimal::ZERO);
        let discount_amount = raw.min(cap).max(Decimal::ZERO);

        Ok(DiscountValidation {
            valid: true,
            discount_amount,
        })
    }
}
