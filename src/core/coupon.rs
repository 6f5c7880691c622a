//! Coupon business logic - percentage discount codes.
//!
//! Codes are stored trimmed and upper-cased, so customers can type them in any case.
//! A coupon applies when it is active, not expired, and the order subtotal reaches its
//! minimum.

use crate::{
    entities::{Coupon, coupon},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Rounds a currency amount to two decimals.
#[must_use]
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Amount taken off `subtotal` by a coupon of `percent_off` percent.
#[must_use]
pub fn coupon_discount(subtotal: f64, percent_off: i32) -> f64 {
    round_currency(subtotal * f64::from(percent_off.clamp(0, 100)) / 100.0)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Creates a coupon.
///
/// # Errors
/// Returns an error if:
/// - The code is blank
/// - `percent_off` is outside 1..=100
/// - `min_order_amount` is negative or not finite
/// - A coupon with the same code exists
/// - The database insert fails
pub async fn create_coupon(
    db: &DatabaseConnection,
    code: &str,
    percent_off: i32,
    min_order_amount: f64,
    expires_at: Option<DateTime<Utc>>,
) -> Result<coupon::Model> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(Error::Validation {
            message: "Coupon code cannot be empty".to_string(),
        });
    }
    if !(1..=100).contains(&percent_off) {
        return Err(Error::Validation {
            message: format!("Coupon percentage must be between 1 and 100 (got {percent_off})"),
        });
    }
    if !min_order_amount.is_finite() || min_order_amount < 0.0 {
        return Err(Error::InvalidAmount {
            amount: min_order_amount,
        });
    }

    if get_coupon_by_code(db, &code).await?.is_some() {
        return Err(Error::DuplicateCoupon { code });
    }

    let coupon = coupon::ActiveModel {
        code: Set(code),
        percent_off: Set(percent_off),
        min_order_amount: Set(min_order_amount),
        is_active: Set(true),
        expires_at: Set(expires_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created coupon {} ({}% off)", coupon.code, coupon.percent_off);
    Ok(coupon)
}

/// Lists all coupons ordered by code.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_coupons(db: &DatabaseConnection) -> Result<Vec<coupon::Model>> {
    Coupon::find()
        .order_by_asc(coupon::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a coupon by code, ignoring case.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_coupon_by_code<C>(db: &C, code: &str) -> Result<Option<coupon::Model>>
where
    C: ConnectionTrait,
{
    Coupon::find()
        .filter(coupon::Column::Code.eq(normalize_code(code)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Enables or disables a coupon.
///
/// # Errors
/// Returns an error if the coupon does not exist or the update fails.
pub async fn set_coupon_active(
    db: &DatabaseConnection,
    code: &str,
    is_active: bool,
) -> Result<coupon::Model> {
    let mut coupon: coupon::ActiveModel = get_coupon_by_code(db, code)
        .await?
        .ok_or_else(|| Error::CouponNotFound {
            code: normalize_code(code),
        })?
        .into();
    coupon.is_active = Set(is_active);
    coupon.update(db).await.map_err(Into::into)
}

/// Deletes a coupon.
///
/// # Errors
/// Returns an error if the coupon does not exist or the delete fails.
pub async fn delete_coupon(db: &DatabaseConnection, code: &str) -> Result<()> {
    let coupon = get_coupon_by_code(db, code)
        .await?
        .ok_or_else(|| Error::CouponNotFound {
            code: normalize_code(code),
        })?;
    coupon.delete(db).await?;
    Ok(())
}

/// Looks up `code` and checks it can be applied to an order of `subtotal` at `now`.
///
/// # Errors
/// Returns [`Error::InvalidCoupon`] when the code is unknown, inactive, expired, or
/// the subtotal is below its minimum, or a database error.
pub async fn find_applicable_coupon<C>(
    db: &C,
    code: &str,
    subtotal: f64,
    now: DateTime<Utc>,
) -> Result<coupon::Model>
where
    C: ConnectionTrait,
{
    let normalized = normalize_code(code);
    let reject = |reason: &str| Error::InvalidCoupon {
        code: normalized.clone(),
        reason: reason.to_string(),
    };

    let coupon = get_coupon_by_code(db, code)
        .await?
        .ok_or_else(|| reject("unknown code"))?;

    if !coupon.is_active {
        return Err(reject("coupon is inactive"));
    }
    if coupon.expires_at.is_some_and(|expiry| expiry <= now) {
        return Err(reject("coupon has expired"));
    }
    if subtotal < coupon.min_order_amount {
        return Err(reject(&format!(
            "order total must be at least {:.2}",
            coupon.min_order_amount
        )));
    }

    Ok(coupon)
}
