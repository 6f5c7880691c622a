//! Dashboard figures for the back office and the customer's account page.

use crate::{
    core::coupon::round_currency,
    entities::{Order, OrderStatus, User, UserOrder, order, user_order},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;

/// Store-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StoreStats {
    /// Number of orders ever placed, cancelled included
    pub total_orders: u64,
    /// Number of user profiles
    pub total_users: u64,
    /// Sum of `total_amount` over orders that were not cancelled
    pub revenue: f64,
}

/// Totals for one customer, read from their order copies.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserStats {
    /// Orders placed
    pub total_orders: u64,
    /// Sum of `total_amount` over orders that were not cancelled
    pub total_spent: f64,
    /// When the most recent order was placed
    pub last_order_at: Option<DateTime<Utc>>,
}

/// Computes the store-wide totals.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn store_stats(db: &DatabaseConnection) -> Result<StoreStats> {
    let total_orders = Order::find().count(db).await?;
    let total_users = User::find().count(db).await?;
    let revenue = Order::find()
        .filter(order::Column::Status.ne(OrderStatus::Cancelled))
        .all(db)
        .await?
        .iter()
        .map(|o| o.total_amount)
        .sum();

    Ok(StoreStats {
        total_orders,
        total_users,
        revenue: round_currency(revenue),
    })
}

/// Computes a customer's totals.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn user_stats(db: &DatabaseConnection, user_id: &str) -> Result<UserStats> {
    let copies = UserOrder::find()
        .filter(user_order::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let total_spent = copies
        .iter()
        .filter(|copy| copy.status != OrderStatus::Cancelled)
        .map(|copy| copy.total_amount)
        .sum();

    Ok(UserStats {
        total_orders: copies.len() as u64,
        total_spent: round_currency(total_spent),
        last_order_at: copies.iter().map(|copy| copy.created_at).max(),
    })
}
