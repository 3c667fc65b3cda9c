use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;

use crate::entities::user;
use crate::errors::ServiceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<user::Model>, ServiceError>;
}

pub struct SqlUserStore {
    db: Arc<DatabaseConnection>,
}

impl SqlUserStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?)
    }
}
