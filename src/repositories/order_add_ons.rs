use async_trait::async_trait;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use std::sync::Arc;

use crate::entities::{add_on, order_detail_add_on};
use crate::errors::ServiceError;
use crate::repositories::{DetailAddOn, NewDetailAddOn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderDetailAddOnStore: Send + Sync {
    /// Add-on bindings recorded for one order line.
    async fn find_by_detail(
        &self,
        order_detail_id: i32,
    ) -> Result<Vec<DetailAddOn>, ServiceError>;

    async fn save_all(&self, rows: Vec<NewDetailAddOn>) -> Result<(), ServiceError>;
}

pub struct SqlOrderDetailAddOnStore {
    db: Arc<DatabaseConnection>,
}

impl SqlOrderDetailAddOnStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderDetailAddOnStore for SqlOrderDetailAddOnStore {
    async fn find_by_detail(
        &self,
        order_detail_id: i32,
    ) -> Result<Vec<DetailAddOn>, ServiceError> {
        let rows = order_detail_add_on::Entity::find()
            .filter(order_detail_add_on::Column::OrderDetailId.eq(order_detail_id))
            .order_by_asc(order_detail_add_on::Column::OrderDetailAddOnId)
            .all(self.db.as_ref())
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let add_on = match row.add_on_id {
                Some(id) => add_on::Entity::find_by_id(id).one(self.db.as_ref()).await?,
                None => None,
            };
            records.push(DetailAddOn {
                add_on,
                unit_price: row.unit_price,
            });
        }
        Ok(records)
    }

    async fn save_all(&self, rows: Vec<NewDetailAddOn>) -> Result<(), ServiceError> {
        if rows.is_empty() {
            return Ok(());
        }
        let models: Vec<order_detail_add_on::ActiveModel> = rows
            .into_iter()
            .map(|row| order_detail_add_on::ActiveModel {
                order_detail_add_on_id: NotSet,
                order_detail_id: Set(row.order_detail_id),
                add_on_id: Set(Some(row.add_on_id)),
                unit_price: Set(Some(row.unit_price)),
            })
            .collect();
        order_detail_add_on::Entity::insert_many(models)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}
