use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sea_orm::ActiveModelTrait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::entities::{dining_table, order};
use crate::errors::ServiceError;
use crate::services::order_status::OrderStatus;

/// Port for freeing a dining table once its orders are settled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableAvailability: Send + Sync {
    async fn set_available_if_no_pending_orders(&self, table_id: i32)
        -> Result<(), ServiceError>;
}

pub struct TableService {
    db: Arc<DatabaseConnection>,
}

impl TableService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TableAvailability for TableService {
    #[instrument(skip(self))]
    async fn set_available_if_no_pending_orders(
        &self,
        table_id: i32,
    ) -> Result<(), ServiceError> {
        let open = order::Entity::find()
            .filter(order::Column::TableId.eq(table_id))
            .filter(order::Column::Status.eq(OrderStatus::Pending.to_string()))
            .count(self.db.as_ref())
            .await?;
        if open > 0 {
            debug!(table_id, open, "table still has pending orders");
            return Ok(());
        }
        if let Some(table) = dining_table::Entity::find_by_id(table_id)
            .one(self.db.as_ref())
            .await?
        {
            let mut active: dining_table::ActiveModel = table.into();
            active.is_available = Set(true);
            active.update(self.db.as_ref()).await?;
            debug!(table_id, "table released");
        }
        Ok(())
    }
}
