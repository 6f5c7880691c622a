//! Abandoned cart entity - Latest idle snapshot of a user's non-empty cart.
//! There is at most one row per user; each snapshot overwrites the previous one.

use super::fields::CartItems;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Abandoned cart database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "abandoned_carts")]
pub struct Model {
    /// User the snapshot belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Cart contents when the idle window elapsed
    pub items: CartItems,
    /// Sum of quantities in `items`
    pub item_count: i32,
    /// Sum of line totals in `items`
    pub total: f64,
    /// When the snapshot was taken
    pub updated_at: DateTimeUtc,
}

/// `AbandonedCart` references its user by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
