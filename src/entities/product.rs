//! Product entity - Represents an item in the storefront catalog.
//!
//! Products carry both the selling `price` and the optional `mrp` (maximum retail
//! price); `discount` is derived from the two whenever the product is written.
//! Images, highlights and the spec sheet are stored as JSON columns.

use super::fields::{SpecMap, StringList};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "SS Platinum English Willow Bat")
    pub name: String,
    /// Short tagline shown under the name
    pub subtitle: String,
    /// Long-form description
    pub description: String,
    /// Manufacturer, e.g. "SS Cricket, India"
    pub manufacturer: String,
    /// Selling price per unit
    pub price: f64,
    /// Maximum retail price, absent when not listed
    pub mrp: Option<f64>,
    /// Whole-number percentage off the MRP
    pub discount: i32,
    /// Catalog category (e.g., "Cricket Bats", "trophies")
    pub category: String,
    /// Brand used by the catalog filter
    pub brand: Option<String>,
    /// Size bucket, used for trophies
    pub size: Option<String>,
    /// Material, used for trophies
    pub material: Option<String>,
    /// Image URLs, first one is the primary image
    pub images: StringList,
    /// Units available
    pub stock: i32,
    /// Cached `stock > 0`
    pub in_stock: bool,
    /// Average rating, 0 to 5
    pub rating: f64,
    /// Number of reviews behind `rating`
    pub reviews_count: i32,
    /// Bullet-point highlights
    pub highlights: StringList,
    /// Specification sheet
    pub specs: SpecMap,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The primary image, or an empty string if the product has none
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.0.first().map_or("", String::as_str)
    }
}
