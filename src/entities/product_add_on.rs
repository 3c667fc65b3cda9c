use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Association between a product and an add-on it may be sold with,
/// carrying the add-on's price for that product.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_add_ons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_add_on_id: i32,

    pub product_id: i32,
    pub add_on_id: i32,
    pub price: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
