//! Cart line entity - One product in a signed-in user's server-side cart.
//!
//! Lines are keyed by `(user_id, product_id)`, so a product appears at most once per
//! cart and adding it again increments the existing quantity.

use super::fields::CartItem;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_lines")]
pub struct Model {
    /// Owner of the cart
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Product in the cart
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Product name at the time of the last write
    pub name: String,
    /// Unit price at the time of the last write
    pub price: f64,
    /// Display image URL
    pub image: String,
    /// Units in the cart, always positive
    pub quantity: i32,
    /// When the line last changed
    pub updated_at: DateTimeUtc,
}

/// `CartLine` references products by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CartItem {
    fn from(line: Model) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            price: line.price,
            image: line.image,
            quantity: line.quantity,
            updated_at: line.updated_at,
        }
    }
}
