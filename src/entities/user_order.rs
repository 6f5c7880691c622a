//! User order entity - Denormalized copy of an order under its customer.
//!
//! Order history reads only this table. The status and shipment columns are kept in
//! step with the canonical [`super::order`] row by writing both in one transaction.

use super::fields::OrderItems;
use super::order::OrderStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user order copy database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_orders")]
pub struct Model {
    /// Unique identifier for the copy
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer who owns the copy
    #[sea_orm(indexed)]
    pub user_id: String,
    /// Canonical order this row mirrors
    pub order_id: i64,
    /// Purchased lines
    pub items: OrderItems,
    /// Amount charged
    pub total_amount: f64,
    /// Mirrors the canonical status
    pub status: OrderStatus,
    /// Mirrors the canonical carrier
    pub delivery_partner: Option<String>,
    /// Mirrors the canonical tracking id
    pub awb_id: Option<String>,
    /// Mirrors the canonical shipped timestamp
    pub shipped_at: Option<DateTimeUtc>,
    /// When the order was placed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `UserOrder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each copy belongs to one canonical order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
