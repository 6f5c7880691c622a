//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{cart::CartProduct, order::CheckoutRequest, product},
    entities::{self, UserRole, fields::CartItem, fields::ShippingAddress},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds product input with sensible defaults.
///
/// # Defaults
/// * `category`: "Cricket Bats"
/// * `brand`: "SS"
/// * `rating`: 4.0
/// * `mrp`: None
pub fn product_input(name: &str, price: f64, stock: i32) -> product::NewProduct {
    product::NewProduct {
        name: name.to_string(),
        price,
        stock,
        category: "Cricket Bats".to_string(),
        brand: Some("SS".to_string()),
        rating: 4.0,
        ..Default::default()
    }
}

/// Creates a test product with 10 units in stock.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
) -> Result<entities::product::Model> {
    product::create_product(db, product_input(name, price, 10)).await
}

/// Creates a test product with custom stock.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    stock: i32,
) -> Result<entities::product::Model> {
    product::create_product(db, product_input(name, price, stock)).await
}

/// Cart input for a product that need not exist in the database.
pub fn test_cart_product(product_id: i64, name: &str, price: f64) -> CartProduct {
    CartProduct {
        product_id,
        name: name.to_string(),
        price,
        image: String::new(),
    }
}

/// A cart line named after its product id.
pub fn test_cart_item(product_id: i64, price: f64, quantity: i32) -> CartItem {
    CartItem {
        product_id,
        name: format!("Product {product_id}"),
        price,
        image: String::new(),
        quantity,
        updated_at: Utc::now(),
    }
}

/// Inserts a profile with the given role.
pub async fn create_test_user(
    db: &DatabaseConnection,
    uid: &str,
    role: UserRole,
) -> Result<entities::user::Model> {
    entities::user::ActiveModel {
        uid: Set(uid.to_string()),
        email: Set(format!("{uid}@example.com")),
        display_name: Set(None),
        role: Set(role),
        address: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A complete delivery address.
pub fn test_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        line1: "12 Pavilion Road".to_string(),
        line2: None,
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
    }
}

/// Cash-on-delivery checkout to [`test_address`].
pub fn test_checkout(coupon_code: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: test_address(),
        payment_method: "COD".to_string(),
        coupon_code: coupon_code.map(ToString::to_string),
    }
}

/// Sets up a complete test environment with one product.
/// Returns (db, product) for product-related tests.
pub async fn setup_with_product() -> Result<(DatabaseConnection, entities::product::Model)> {
    let db = setup_test_db().await?;
    let product = create_test_product(&db, "Test Bat", 1000.0).await?;
    Ok((db, product))
}
