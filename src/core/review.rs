//! Product reviews.
//!
//! Posting a review folds its stars into the product's running average instead of
//! recomputing from the `reviews` table, so ratings and counts seeded from a catalog
//! carry over.

use crate::{
    entities::{Product, Review, product, review},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Folds one more rating into an average of `count` ratings, rounded to one decimal.
#[must_use]
pub fn fold_rating(average: f64, count: i32, rating: i32) -> f64 {
    let count = f64::from(count.max(0));
    let folded = average.mul_add(count, f64::from(rating)) / (count + 1.0);
    (folded * 10.0).round() / 10.0
}

/// Posts a review and updates the product's rating and review count.
///
/// # Errors
/// Returns an error if:
/// - `rating` is outside 1..=5
/// - The comment or author name is blank
/// - The product does not exist
/// - A database operation fails
pub async fn add_review(
    db: &DatabaseConnection,
    product_id: i64,
    user_id: &str,
    user_name: &str,
    rating: i32,
    comment: &str,
) -> Result<review::Model> {
    if !(1..=5).contains(&rating) {
        return Err(Error::InvalidRating {
            rating: f64::from(rating),
        });
    }
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(Error::Validation {
            message: "Review comment cannot be empty".to_string(),
        });
    }
    let user_name = user_name.trim();
    if user_name.is_empty() {
        return Err(Error::Validation {
            message: "Reviewer name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    let reviewed = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let posted = review::ActiveModel {
        product_id: Set(product_id),
        user_id: Set(user_id.to_string()),
        user_name: Set(user_name.to_string()),
        rating: Set(rating),
        comment: Set(comment.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let average = fold_rating(reviewed.rating, reviewed.reviews_count, rating);
    let count = reviewed.reviews_count.max(0) + 1;
    let mut active: product::ActiveModel = reviewed.into();
    active.rating = Set(average);
    active.reviews_count = Set(count);
    active.update(&txn).await?;

    txn.commit().await?;

    info!("Review {} on product {product_id}: {rating} stars, average now {average:.1}", posted.id);
    Ok(posted)
}

/// Lists a product's reviews, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_reviews(db: &DatabaseConnection, product_id: i64) -> Result<Vec<review::Model>> {
    Review::find()
        .filter(review::Column::ProductId.eq(product_id))
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
