//! Coupon entity - Percentage discount codes managed from the back office.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coupon database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    /// Unique identifier for the coupon
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Upper-case code customers type at checkout
    #[sea_orm(unique)]
    pub code: String,
    /// Percentage taken off the subtotal, 1 to 100
    pub percent_off: i32,
    /// Minimum subtotal required for the coupon to apply
    pub min_order_amount: f64,
    /// Inactive coupons are kept but never apply
    pub is_active: bool,
    /// Optional expiry instant
    pub expires_at: Option<DateTimeUtc>,
    /// When the coupon was created
    pub created_at: DateTimeUtc,
}

/// Coupons have no relations; orders store the applied code
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
