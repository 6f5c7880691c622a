//! Abandoned-cart snapshots.
//!
//! When a signed-in user's non-empty cart sits idle, [`crate::core::sync::CartSession`]
//! records a snapshot here for remarketing. There is one row per user; a new snapshot
//! overwrites the previous one.

use crate::{
    core::cart::CartView,
    entities::{AbandonedCart, abandoned_cart, fields::CartItems},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Writes (or overwrites) the abandoned-cart snapshot for `user_id`.
///
/// # Errors
/// Returns an error if the database read or write fails.
pub async fn save_snapshot(
    db: &DatabaseConnection,
    user_id: &str,
    view: &CartView,
) -> Result<abandoned_cart::Model> {
    let now = Utc::now();
    let existing = AbandonedCart::find_by_id(user_id.to_string()).one(db).await?;

    let snapshot = if let Some(snapshot) = existing {
        let mut active: abandoned_cart::ActiveModel = snapshot.into();
        active.items = Set(CartItems(view.lines.clone()));
        active.item_count = Set(view.count);
        active.total = Set(view.total);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        abandoned_cart::ActiveModel {
            user_id: Set(user_id.to_string()),
            items: Set(CartItems(view.lines.clone())),
            item_count: Set(view.count),
            total: Set(view.total),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
    };

    info!(
        "Recorded abandoned cart for {user_id}: {} items, total {:.2}",
        snapshot.item_count, snapshot.total
    );
    Ok(snapshot)
}

/// Retrieves the snapshot for `user_id`, if one was recorded.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_snapshot(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<abandoned_cart::Model>> {
    AbandonedCart::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all snapshots, most recent first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_snapshots(db: &DatabaseConnection) -> Result<Vec<abandoned_cart::Model>> {
    AbandonedCart::find()
        .order_by_desc(abandoned_cart::Column::UpdatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
