use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;

use crate::entities::{add_on, product, product_add_on, product_size};
use crate::errors::ServiceError;
use crate::repositories::ProductAddOn;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, product_id: i32) -> Result<Option<product::Model>, ServiceError>;

    /// Persist the product's stock level.
    async fn save(&self, product: &product::Model) -> Result<(), ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductSizeStore: Send + Sync {
    async fn find_by_product_and_size(
        &self,
        product_id: i32,
        size_id: i32,
    ) -> Result<Option<product_size::Model>, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductAddOnStore: Send + Sync {
    /// Association between a product and an add-on, if one exists.
    async fn find_by_product_and_add_on(
        &self,
        product_id: i32,
        add_on_id: i32,
    ) -> Result<Option<ProductAddOn>, ServiceError>;
}

/// SeaORM-backed implementation of the three catalog ports.
pub struct SqlCatalogStore {
    db: Arc<DatabaseConnection>,
}

impl SqlCatalogStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for SqlCatalogStore {
    async fn find_by_id(&self, product_id: i32) -> Result<Option<product::Model>, ServiceError> {
        Ok(product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await?)
    }

    async fn save(&self, product: &product::Model) -> Result<(), ServiceError> {
        let mut active: product::ActiveModel = product.clone().into();
        active.stock_quantity = Set(product.stock_quantity);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductSizeStore for SqlCatalogStore {
    async fn find_by_product_and_size(
        &self,
        product_id: i32,
        size_id: i32,
    ) -> Result<Option<product_size::Model>, ServiceError> {
        Ok(product_size::Entity::find()
            .filter(product_size::Column::ProductId.eq(product_id))
            .filter(product_size::Column::SizeId.eq(size_id))
            .one(self.db.as_ref())
            .await?)
    }
}

#[async_trait]
impl ProductAddOnStore for SqlCatalogStore {
    async fn find_by_product_and_add_on(
        &self,
        product_id: i32,
        add_on_id: i32,
    ) -> Result<Option<ProductAddOn>, ServiceError> {
        let assoc = product_add_on::Entity::find()
            .filter(product_add_on::Column::ProductId.eq(product_id))
            .filter(product_add_on::Column::AddOnId.eq(add_on_id))
            .one(self.db.as_ref())
            .await?;
        let Some(assoc) = assoc else {
            return Ok(None);
        };
        let add_on = add_on::Entity::find_by_id(assoc.add_on_id)
            .one(self.db.as_ref())
            .await?;
        Ok(add_on.map(|add_on| ProductAddOn {
            add_on,
            price: assoc.price,
        }))
    }
}
