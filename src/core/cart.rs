//! Server-side cart operations for signed-in users.
//!
//! Each user's cart is a set of `cart_lines` rows keyed by `(user_id, product_id)`.
//! Increments read the current quantity and write `previous + delta` without a
//! transaction, so two concurrent increments of the same line can lose one update
//! (last write wins). Every operation requires a user id and fails with
//! [`Error::NotAuthenticated`] without one.

use crate::{
    entities::{CartLine, cart_line, fields::CartItem, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, warn};

/// The product fields a cart line copies.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    /// Product id
    pub product_id: i64,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Display image
    pub image: String,
}

impl From<&product::Model> for CartProduct {
    fn from(product: &product::Model) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().to_string(),
        }
    }
}

impl From<&CartItem> for CartProduct {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
        }
    }
}

/// A cart as the storefront displays it: the lines plus derived totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartView {
    /// Lines in the cart
    pub lines: Vec<CartItem>,
    /// Sum of price times quantity
    pub total: f64,
    /// Sum of quantities
    pub count: i32,
}

impl CartView {
    /// Builds a view from lines, deriving `total` and `count`.
    #[must_use]
    pub fn from_lines(lines: Vec<CartItem>) -> Self {
        let total = lines.iter().map(CartItem::line_total).sum();
        let count = lines
            .iter()
            .fold(0_i32, |count, line| count.saturating_add(line.quantity));
        Self {
            lines,
            total,
            count,
        }
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product_id` in the cart, 0 when absent
    #[must_use]
    pub fn quantity_of(&self, product_id: i64) -> i32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }
}

pub(crate) fn require_user(user_id: Option<&str>) -> Result<&str> {
    match user_id {
        Some(uid) if !uid.trim().is_empty() => Ok(uid),
        _ => Err(Error::NotAuthenticated),
    }
}

/// Adds `quantity` units of a product to the user's cart, creating the line if needed.
///
/// The line's name, price and image are refreshed from `product`.
///
/// # Errors
/// Returns an error if:
/// - No user is signed in
/// - `quantity` is zero or negative, or would overflow the line's quantity
/// - The database read or write fails
pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: Option<&str>,
    product: &CartProduct,
    quantity: i32,
) -> Result<cart_line::Model> {
    let uid = require_user(user_id)?;
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }

    let existing = CartLine::find_by_id((uid.to_string(), product.product_id))
        .one(db)
        .await?;
    let now = Utc::now();

    let line = if let Some(line) = existing {
        let new_quantity = line
            .quantity
            .checked_add(quantity)
            .ok_or(Error::InvalidQuantity { quantity })?;
        let mut active: cart_line::ActiveModel = line.into();
        active.name = Set(product.name.clone());
        active.price = Set(product.price);
        active.image = Set(product.image.clone());
        active.quantity = Set(new_quantity);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        cart_line::ActiveModel {
            user_id: Set(uid.to_string()),
            product_id: Set(product.product_id),
            name: Set(product.name.clone()),
            price: Set(product.price),
            image: Set(product.image.clone()),
            quantity: Set(quantity),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
    };

    debug!(
        "Cart of {uid}: product {} now at quantity {}",
        line.product_id, line.quantity
    );
    Ok(line)
}

/// Retrieves the user's cart lines ordered by product id.
///
/// # Errors
/// Returns an error if no user is signed in or the query fails.
pub async fn get_cart(
    db: &DatabaseConnection,
    user_id: Option<&str>,
) -> Result<Vec<cart_line::Model>> {
    let uid = require_user(user_id)?;
    CartLine::find()
        .filter(cart_line::Column::UserId.eq(uid))
        .order_by_asc(cart_line::Column::ProductId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the user's cart as a [`CartView`].
///
/// # Errors
/// Returns an error if no user is signed in or the query fails.
pub async fn get_cart_view(db: &DatabaseConnection, user_id: Option<&str>) -> Result<CartView> {
    let lines = get_cart(db, user_id).await?;
    Ok(CartView::from_lines(
        lines.into_iter().map(CartItem::from).collect(),
    ))
}

/// Removes a product from the user's cart. Removing an absent line is not an error.
///
/// # Errors
/// Returns an error if no user is signed in or the delete fails.
pub async fn remove_from_cart(
    db: &DatabaseConnection,
    user_id: Option<&str>,
    product_id: i64,
) -> Result<()> {
    let uid = require_user(user_id)?;
    CartLine::delete_by_id((uid.to_string(), product_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Sets the quantity of a line. A quantity of zero or less removes the line.
///
/// Returns the updated line, or `None` when the line was removed or did not exist.
///
/// # Errors
/// Returns an error if no user is signed in or the database operation fails.
pub async fn update_quantity(
    db: &DatabaseConnection,
    user_id: Option<&str>,
    product_id: i64,
    quantity: i32,
) -> Result<Option<cart_line::Model>> {
    let uid = require_user(user_id)?;
    if quantity <= 0 {
        remove_from_cart(db, user_id, product_id).await?;
        return Ok(None);
    }

    let Some(line) = CartLine::find_by_id((uid.to_string(), product_id))
        .one(db)
        .await?
    else {
        warn!("Quantity update for product {product_id} not in cart of {uid}");
        return Ok(None);
    };

    let mut active: cart_line::ActiveModel = line.into();
    active.quantity = Set(quantity);
    active.updated_at = Set(Utc::now());
    Ok(Some(active.update(db).await?))
}

/// Removes every line from the user's cart, returning how many were deleted.
///
/// # Errors
/// Returns an error if no user is signed in or the delete fails.
pub async fn clear_cart(db: &DatabaseConnection, user_id: Option<&str>) -> Result<u64> {
    let uid = require_user(user_id)?;
    let result = CartLine::delete_many()
        .filter(cart_line::Column::UserId.eq(uid))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
