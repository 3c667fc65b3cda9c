use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;

use crate::entities::{address, dining_table, order, order_detail, payment, product, size, user};
use crate::errors::ServiceError;
use crate::repositories::{OrderLine, OrderRecord};

/// Statuses that no longer occupy a table or a shipper.
const TERMINAL_STATUSES: [&str; 2] = ["COMPLETED", "CANCELLED"];

/// Port for loading and persisting order aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderRecord>, ServiceError>;

    /// Customer's orders, newest first, with the page's total row count.
    async fn find_by_customer(
        &self,
        customer_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError>;

    async fn find_by_status(
        &self,
        status: &str,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError>;

    /// Non-terminal orders with a table and no delivery address.
    async fn find_active_dine_in(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError>;

    /// Non-terminal orders with a delivery address.
    async fn find_active_delivery(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError>;

    /// Persist the order row and its payment rows.
    async fn save(&self, record: &OrderRecord) -> Result<(), ServiceError>;
}

pub struct SqlOrderStore {
    db: Arc<DatabaseConnection>,
}

impl SqlOrderStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn hydrate(&self, order: order::Model) -> Result<OrderRecord, ServiceError> {
        let db = self.db.as_ref();

        let customer = match order.customer_id {
            Some(id) => user::Entity::find_by_id(id).one(db).await?,
            None => None,
        };
        let table = match order.table_id {
            Some(id) => dining_table::Entity::find_by_id(id).one(db).await?,
            None => None,
        };
        let address = match order.address_id {
            Some(id) => address::Entity::find_by_id(id).one(db).await?,
            None => None,
        };

        let detail_rows = order_detail::Entity::find()
            .filter(order_detail::Column::OrderId.eq(order.order_id))
            .order_by_asc(order_detail::Column::OrderDetailId)
            .all(db)
            .await?;
        let mut details = Vec::with_capacity(detail_rows.len());
        for detail in detail_rows {
            let product = match detail.product_id {
                Some(id) => product::Entity::find_by_id(id).one(db).await?,
                None => None,
            };
            let size = match detail.size_id {
                Some(id) => size::Entity::find_by_id(id).one(db).await?,
                None => None,
            };
            details.push(OrderLine {
                detail,
                product,
                size,
            });
        }

        let payments = payment::Entity::find()
            .filter(payment::Column::OrderId.eq(order.order_id))
            .order_by_asc(payment::Column::PaymentId)
            .all(db)
            .await?;

        Ok(OrderRecord {
            order,
            customer,
            table,
            address,
            details,
            payments,
        })
    }

    async fn hydrate_page(
        &self,
        select: sea_orm::Select<order::Entity>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let paginator = select
            .order_by_desc(order::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(self.hydrate(row).await?);
        }
        Ok((records, total))
    }
}

#[async_trait]
impl OrderStore for SqlOrderStore {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderRecord>, ServiceError> {
        let row = order::Entity::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?;
        match row {
            Some(order) => Ok(Some(self.hydrate(order).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_customer(
        &self,
        customer_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let select = order::Entity::find().filter(order::Column::CustomerId.eq(customer_id));
        self.hydrate_page(select, page, limit).await
    }

    async fn find_by_status(
        &self,
        status: &str,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let select = order::Entity::find().filter(order::Column::Status.eq(status));
        self.hydrate_page(select, page, limit).await
    }

    async fn find_active_dine_in(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let select = order::Entity::find()
            .filter(order::Column::Status.is_not_in(TERMINAL_STATUSES))
            .filter(order::Column::AddressId.is_null());
        self.hydrate_page(select, page, limit).await
    }

    async fn find_active_delivery(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let select = order::Entity::find()
            .filter(order::Column::Status.is_not_in(TERMINAL_STATUSES))
            .filter(order::Column::AddressId.is_not_null());
        self.hydrate_page(select, page, limit).await
    }

    async fn save(&self, record: &OrderRecord) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let mut active: order::ActiveModel = record.order.clone().into();
        active.status = Set(record.order.status.clone());
        active.updated_at = Set(record.order.updated_at);
        active.update(db).await?;

        for payment in &record.payments {
            let mut active: payment::ActiveModel = payment.clone().into();
            active.status = Set(payment.status);
            active.update(db).await?;
        }
        Ok(())
    }
}
