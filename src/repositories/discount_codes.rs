use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;

use crate::entities::discount_code;
use crate::errors::ServiceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscountCodeStore: Send + Sync {
    /// Case-insensitive lookup by code.
    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<discount_code::Model>, ServiceError>;
}

pub struct SqlDiscountCodeStore {
    db: Arc<DatabaseConnection>,
}

impl SqlDiscountCodeStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DiscountCodeStore for SqlDiscountCodeStore {
    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<discount_code::Model>, ServiceError> {
        Ok(discount_code::Entity::find()
            .filter(
                Expr::expr(Func::upper(Expr::col(discount_code::Column::Code)))
                    .eq(code.to_uppercase()),
            )
            .one(self.db.as_ref())
            .await?)
    }
}
