//! Structured values stored as JSON columns.
//!
//! The storefront keeps a few nested documents (image lists, spec sheets, order line
//! items, addresses) inline with their owning row. Each type derives
//! `FromJsonQueryResult` so SeaORM can read and write it as a single JSON column.

use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered list of strings (product images, highlights)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

/// Key/value specification sheet, e.g. `Weight -> 1160g`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SpecMap(pub BTreeMap<String, String>);

/// One line of a cart, as held in the guest store, the live view and abandoned-cart snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product this line refers to
    pub product_id: i64,
    /// Product name at the time the line was last written
    pub name: String,
    /// Unit price at the time the line was last written
    pub price: f64,
    /// Display image
    #[serde(default)]
    pub image: String,
    /// Units in the cart, always positive
    pub quantity: i32,
    /// Last time this line changed
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Price multiplied by quantity
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Snapshot of a whole cart
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CartItems(pub Vec<CartItem>);

/// One purchased line of an order, frozen at checkout time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product that was bought
    pub product_id: i64,
    /// Product name at checkout
    pub name: String,
    /// Unit price at checkout
    pub price: f64,
    /// Display image
    pub image: String,
    /// Units bought
    pub quantity: i32,
}

/// All lines of an order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OrderItems(pub Vec<OrderItem>);

/// Delivery address captured at checkout and stored on user profiles
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Recipient name
    pub full_name: String,
    /// Contact phone number
    pub phone: String,
    /// Street address
    pub line1: String,
    /// Optional second address line
    #[serde(default)]
    pub line2: Option<String>,
    /// City
    pub city: String,
    /// State
    pub state: String,
    /// Postal code
    pub pincode: String,
}
