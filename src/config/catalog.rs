//! Product catalog loading from TOML.
//!
//! A catalog file lists products as `[[products]]` tables. The `replace-products`
//! maintenance command loads one and swaps it in for the whole product table.

use crate::core::product::NewProduct;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration structure representing a catalog file
#[derive(Debug, Deserialize)]
pub struct Catalog {
    /// Products to insert
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

/// A single product entry in the catalog file
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogProduct {
    /// Product name
    pub name: String,
    /// Short tagline
    #[serde(default)]
    pub subtitle: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Manufacturer
    #[serde(default)]
    pub manufacturer: String,
    /// Selling price
    pub price: f64,
    /// Maximum retail price
    #[serde(default)]
    pub mrp: Option<f64>,
    /// Catalog category
    pub category: String,
    /// Brand
    #[serde(default)]
    pub brand: Option<String>,
    /// Size bucket
    #[serde(default)]
    pub size: Option<String>,
    /// Material
    #[serde(default)]
    pub material: Option<String>,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
    /// Units in stock
    #[serde(default)]
    pub stock: i32,
    /// Average rating
    #[serde(default)]
    pub rating: f64,
    /// Number of reviews
    #[serde(default)]
    pub reviews_count: i32,
    /// Highlights
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Spec sheet
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

impl From<CatalogProduct> for NewProduct {
    fn from(entry: CatalogProduct) -> Self {
        Self {
            name: entry.name,
            subtitle: entry.subtitle,
            description: entry.description,
            manufacturer: entry.manufacturer,
            price: entry.price,
            mrp: entry.mrp,
            category: entry.category,
            brand: entry.brand,
            size: entry.size,
            material: entry.material,
            images: entry.images,
            stock: entry.stock,
            rating: entry.rating,
            reviews_count: entry.reviews_count,
            highlights: entry.highlights,
            specs: entry.specs,
        }
    }
}

/// Loads a product catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog: {e}"),
    })
}
