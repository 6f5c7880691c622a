//! Product business logic - Handles all product-related operations.
//!
//! This module provides functions for creating, retrieving, updating and deleting
//! catalog products, plus the helpers the back office uses to turn form input into
//! product fields: the MRP discount, newline separated highlights, and `key: value`
//! spec sheets. All database functions are async and return Result types.

use crate::{
    entities::{
        Product, Review,
        fields::{SpecMap, StringList},
        product, review,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeMap;
use tracing::info;

/// Input for creating or replacing a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Short tagline
    pub subtitle: String,
    /// Long description
    pub description: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Selling price
    pub price: f64,
    /// Maximum retail price; `None` or `0` means not listed
    pub mrp: Option<f64>,
    /// Catalog category
    pub category: String,
    /// Brand
    pub brand: Option<String>,
    /// Size bucket
    pub size: Option<String>,
    /// Material
    pub material: Option<String>,
    /// Image URLs; blank entries are dropped
    pub images: Vec<String>,
    /// Units in stock
    pub stock: i32,
    /// Average rating, 0 to 5
    pub rating: f64,
    /// Number of reviews behind `rating`
    pub reviews_count: i32,
    /// Highlights
    pub highlights: Vec<String>,
    /// Spec sheet
    pub specs: BTreeMap<String, String>,
}

/// Percentage off the MRP, rounded to the nearest whole number.
///
/// Returns 0 when the MRP is not above the price.
///
/// ```
/// use crease_store::core::product::calculate_discount;
/// assert_eq!(calculate_discount(45000.0, 52000.0), 13);
/// assert_eq!(calculate_discount(500.0, 500.0), 0);
/// ```
#[must_use]
pub fn calculate_discount(price: f64, mrp: f64) -> i32 {
    if !mrp.is_finite() || mrp <= 0.0 || mrp <= price {
        return 0;
    }

    // Bounded to [0, 100] for any non-negative price.
    #[allow(clippy::cast_possible_truncation)]
    let discount = (((mrp - price) / mrp) * 100.0).round() as i32;
    discount
}

/// Splits a block of text into highlight lines, trimming each and dropping blank lines.
#[must_use]
pub fn parse_highlights(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `key: value` lines into a spec sheet.
///
/// Only the first colon separates key from value, so values such as `"Ratio: 3:1"`
/// survive. Lines without a colon, or with an empty key or value, are skipped.
#[must_use]
pub fn parse_specs(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn validate(input: &NewProduct) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }

    if !input.price.is_finite() || input.price < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.price,
        });
    }

    if let Some(mrp) = input.mrp {
        if !mrp.is_finite() || mrp < 0.0 {
            return Err(Error::InvalidAmount { amount: mrp });
        }
    }

    if input.stock < 0 {
        return Err(Error::Validation {
            message: format!("Stock cannot be negative (got {})", input.stock),
        });
    }

    if !(0.0..=5.0).contains(&input.rating) {
        return Err(Error::InvalidRating {
            rating: input.rating,
        });
    }

    if input.reviews_count < 0 {
        return Err(Error::Validation {
            message: "Review count cannot be negative".to_string(),
        });
    }

    Ok(())
}

/// Copies validated input onto an active model, deriving `discount` and `in_stock`.
fn apply(active: &mut product::ActiveModel, input: NewProduct) {
    let mrp = input.mrp.filter(|mrp| *mrp > 0.0);
    let discount = mrp.map_or(0, |mrp| calculate_discount(input.price, mrp));
    let images = input
        .images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();

    active.name = Set(input.name.trim().to_string());
    active.subtitle = Set(input.subtitle);
    active.description = Set(input.description);
    active.manufacturer = Set(input.manufacturer);
    active.price = Set(input.price);
    active.mrp = Set(mrp);
    active.discount = Set(discount);
    active.category = Set(input.category);
    active.brand = Set(input.brand);
    active.size = Set(input.size);
    active.material = Set(input.material);
    active.images = Set(StringList(images));
    active.in_stock = Set(input.stock > 0);
    active.stock = Set(input.stock);
    active.rating = Set(input.rating);
    active.reviews_count = Set(input.reviews_count);
    active.highlights = Set(StringList(input.highlights));
    active.specs = Set(SpecMap(input.specs));
    active.updated_at = Set(Utc::now());
}

async fn insert_product<C>(db: &C, input: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut active = product::ActiveModel {
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    apply(&mut active, input);
    active.insert(db).await.map_err(Into::into)
}

/// Retrieves all products, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product after validating the input.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price or MRP is negative or not finite
/// - The stock or review count is negative, or the rating is outside 0..=5
/// - The database insert operation fails
pub async fn create_product(db: &DatabaseConnection, input: NewProduct) -> Result<product::Model> {
    validate(&input)?;
    let product = insert_product(db, input).await?;
    info!("Created product {} ({})", product.name, product.id);
    Ok(product)
}

/// Replaces every field of an existing product.
///
/// # Errors
/// Returns an error if validation fails, the product does not exist, or the update fails.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    input: NewProduct,
) -> Result<product::Model> {
    validate(&input)?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    apply(&mut product, input);
    product.update(db).await.map_err(Into::into)
}

/// Deletes a product together with its reviews.
///
/// # Errors
/// Returns an error if the product does not exist or the delete fails.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    Review::delete_many()
        .filter(review::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    product.delete(&txn).await?;

    txn.commit().await?;
    info!("Deleted product {product_id}");
    Ok(())
}

/// Deletes the whole catalog and inserts `products` in its place, atomically.
///
/// Every entry is validated before anything is deleted.
///
/// # Errors
/// Returns an error if any entry fails validation or a database operation fails; in
/// that case the existing catalog is left untouched.
pub async fn replace_all_products(
    db: &DatabaseConnection,
    products: Vec<NewProduct>,
) -> Result<Vec<product::Model>> {
    for input in &products {
        validate(input)?;
    }

    let txn = db.begin().await?;

    Review::delete_many().exec(&txn).await?;
    let deleted = Product::delete_many().exec(&txn).await?;
    info!("Deleted {} products", deleted.rows_affected);

    let mut inserted = Vec::with_capacity(products.len());
    for input in products {
        let product = insert_product(&txn, input).await?;
        info!("Added product: {} ({})", product.name, product.id);
        inserted.push(product);
    }

    txn.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_calculate_discount() {
        assert_eq!(calculate_discount(45000.0, 52000.0), 13);
        assert_eq!(calculate_discount(1800.0, 2200.0), 18);
        assert_eq!(calculate_discount(8500.0, 9999.0), 15);
        assert_eq!(calculate_discount(0.0, 100.0), 100);
    }

    #[test]
    fn test_calculate_discount_without_markdown() {
        assert_eq!(calculate_discount(500.0, 500.0), 0);
        assert_eq!(calculate_discount(600.0, 500.0), 0);
        assert_eq!(calculate_discount(10.0, 0.0), 0);
        assert_eq!(calculate_discount(10.0, f64::NAN), 0);
    }

    #[test]
    fn test_parse_highlights() {
        let parsed =
            parse_highlights("  Hand-stitched \n\n MCC Approved\n   \n4-Piece Construction");
        assert_eq!(
            parsed,
            vec!["Hand-stitched", "MCC Approved", "4-Piece Construction"]
        );
        assert!(parse_highlights("").is_empty());
    }

    #[test]
    fn test_parse_specs() {
        let specs = parse_specs(
            "Weight: 1160g\nRatio: 3:1\nno colon here\n: empty key\nEmpty value:\n Handle : Round ",
        );
        assert_eq!(specs.len(), 3);
        assert_eq!(specs["Weight"], "1160g");
        assert_eq!(specs["Ratio"], "3:1");
        assert_eq!(specs["Handle"], "Round");
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_product(&db, product_input("   ", 10.0, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_product(&db, product_input("Bat", -10.0, 1)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10.0 }
        ));

        let result = create_product(&db, product_input("Bat", f64::NAN, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        let result = create_product(&db, product_input("Bat", 10.0, -1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let mut input = product_input("Bat", 10.0, 1);
        input.rating = 5.5;
        let result = create_product(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidRating { .. }));

        let mut input = product_input("Bat", 10.0, 1);
        input.mrp = Some(f64::INFINITY);
        let result = create_product(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_derives_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let mut input = product_input("  SS Platinum English Willow Bat ", 45000.0, 5);
        input.mrp = Some(52000.0);
        input.images = vec![" https://img/a.jpg ".to_string(), "   ".to_string()];
        let product = create_product(&db, input).await?;

        assert_eq!(product.name, "SS Platinum English Willow Bat");
        assert_eq!(product.discount, 13);
        assert!(product.in_stock);
        assert_eq!(product.images.0, vec!["https://img/a.jpg"]);
        assert_eq!(product.primary_image(), "https://img/a.jpg");

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_mrp_stored_as_absent() -> Result<()> {
        let db = setup_test_db().await?;

        let mut input = product_input("Grip", 250.0, 0);
        input.mrp = Some(0.0);
        let product = create_product(&db, input).await?;

        assert!(product.mrp.is_none());
        assert_eq!(product.discount, 0);
        assert!(!product.in_stock);
        assert_eq!(product.primary_image(), "");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Original Name", 100.0).await?;

        let mut input = product_input("Updated Name", 80.0, 0);
        input.mrp = Some(100.0);
        let updated = update_product(&db, product.id, input).await?;

        assert_eq!(updated.id, product.id);
        assert_eq!(updated.name, "Updated Name");
        assert_eq!(updated.discount, 20);
        assert!(!updated.in_stock);

        let retrieved = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(retrieved.price, 80.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_product(&db, 999, product_input("Ghost", 1.0, 1)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductNotFound { id: 999 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Test Product", 10.0).await?;
        let kept = create_test_product(&db, "Kept Product", 10.0).await?;

        delete_product(&db, product.id).await?;

        let remaining = get_all_products(&db).await?;
        assert_eq!(remaining, vec![kept]);

        let result = delete_product(&db, product.id).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_products_ordered_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        let ball = create_test_product(&db, "Ball", 10.0).await?;
        let stumps = create_test_product(&db, "Stumps", 10.0).await?;
        let bat = create_test_product(&db, "Bat", 10.0).await?;

        let products = get_all_products(&db).await?;
        assert_eq!(products, vec![ball, bat, stumps]);

        Ok(())
    }

    #[tokio::test]
    async fn test_replace_all_products() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "Old Bat", 10.0).await?;
        create_test_product(&db, "Old Ball", 10.0).await?;

        let replaced = replace_all_products(
            &db,
            vec![
                product_input("SG Test White Cricket Ball", 1800.0, 24),
                product_input("Adidas 22YDS Spike Shoes", 8500.0, 10),
            ],
        )
        .await?;
        assert_eq!(replaced.len(), 2);

        let names: Vec<String> = get_all_products(&db)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            vec!["Adidas 22YDS Spike Shoes", "SG Test White Cricket Ball"]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_replace_all_products_rejects_invalid_batch() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "Old Bat", 10.0).await?;

        let result = replace_all_products(
            &db,
            vec![
                product_input("Fine", 10.0, 1),
                product_input("Broken", -1.0, 1),
            ],
        )
        .await;
        assert!(result.is_err());

        let products = get_all_products(&db).await?;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Old Bat");

        Ok(())
    }
}
