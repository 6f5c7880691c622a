//! Catalog browsing - filtering and sorting of product lists.
//!
//! Filtering is a linear scan over the product list; the catalog is small enough that
//! pushing each storefront filter down into SQL would buy nothing.

use crate::{entities::product, errors::Result};
use sea_orm::DatabaseConnection;
use std::cmp::Ordering;

/// Sort order for product listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Name, A to Z, ignoring case
    #[default]
    Name,
    /// Cheapest first
    PriceLowToHigh,
    /// Most expensive first
    PriceHighToLow,
    /// Highest rated first
    Rating,
}

impl SortBy {
    /// Parses the storefront's sort keys: `name`, `price-low`, `price-high`, `rating`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "price-low" => Some(Self::PriceLowToHigh),
            "price-high" => Some(Self::PriceHighToLow),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    fn compare(self, a: &product::Model, b: &product::Model) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::PriceLowToHigh => a.price.total_cmp(&b.price),
            Self::PriceHighToLow => b.price.total_cmp(&a.price),
            Self::Rating => b.rating.total_cmp(&a.rating),
        }
    }
}

/// Filter and sort options for a product listing.
///
/// `None` fields do not filter. String filters match case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Only this category
    pub category: Option<String>,
    /// Only this brand
    pub brand: Option<String>,
    /// Only this size bucket
    pub size: Option<String>,
    /// Only this material
    pub material: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
    /// Minimum average rating
    pub min_rating: Option<f64>,
    /// Drop products with no stock
    pub in_stock_only: bool,
    /// Result ordering
    pub sort_by: SortBy,
}

fn same_text(wanted: Option<&String>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| actual.is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)))
}

impl ProductQuery {
    /// Whether a single product passes every filter
    #[must_use]
    pub fn matches(&self, product: &product::Model) -> bool {
        same_text(self.category.as_ref(), Some(&product.category))
            && same_text(self.brand.as_ref(), product.brand.as_deref())
            && same_text(self.size.as_ref(), product.size.as_deref())
            && same_text(self.material.as_ref(), product.material.as_deref())
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && self.min_rating.is_none_or(|min| product.rating >= min)
            && (!self.in_stock_only || product.in_stock)
    }

    /// Filters and sorts `products`
    #[must_use]
    pub fn apply(&self, products: Vec<product::Model>) -> Vec<product::Model> {
        let mut filtered: Vec<product::Model> =
            products.into_iter().filter(|p| self.matches(p)).collect();
        filtered.sort_by(|a, b| self.sort_by.compare(a, b));
        filtered
    }
}

/// Loads the catalog and applies `query` to it.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn search_products(
    db: &DatabaseConnection,
    query: &ProductQuery,
) -> Result<Vec<product::Model>> {
    let products = crate::core::product::get_all_products(db).await?;
    Ok(query.apply(products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::create_product;
    use crate::test_utils::*;

    fn names(products: &[product::Model]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    async fn seed_trophies(db: &DatabaseConnection) -> Result<()> {
        for (name, price, stock, rating, size, material) in [
            ("Gold Cup", 4500.0, 3, 4.5, "Large (Over 25cm)", "Metal"),
            ("wooden shield", 1200.0, 0, 3.9, "Medium (15-25cm)", "Wood"),
            ("Acrylic Star", 800.0, 12, 4.1, "Small (Under 15cm)", "Acrylic"),
            ("Crystal Bowl", 9800.0, 1, 4.9, "Large (Over 25cm)", "Crystal"),
        ] {
            let mut input = product_input(name, price, stock);
            input.category = "trophies".to_string();
            input.rating = rating;
            input.size = Some(size.to_string());
            input.material = Some(material.to_string());
            create_product(db, input).await?;
        }
        create_test_product(db, "Practice Bat", 2000.0).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_default_query_sorts_by_name_ignoring_case() -> Result<()> {
        let db = setup_test_db().await?;
        seed_trophies(&db).await?;

        let results = search_products(&db, &ProductQuery::default()).await?;
        assert_eq!(
            names(&results),
            vec!["Acrylic Star", "Crystal Bowl", "Gold Cup", "Practice Bat", "wooden shield"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_category_price_and_stock_filters() -> Result<()> {
        let db = setup_test_db().await?;
        seed_trophies(&db).await?;

        let query = ProductQuery {
            category: Some("Trophies".to_string()),
            min_price: Some(800.0),
            max_price: Some(4500.0),
            in_stock_only: true,
            sort_by: SortBy::PriceHighToLow,
            ..Default::default()
        };
        let results = search_products(&db, &query).await?;
        assert_eq!(names(&results), vec!["Gold Cup", "Acrylic Star"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_material_size_and_rating_filters() -> Result<()> {
        let db = setup_test_db().await?;
        seed_trophies(&db).await?;

        let query = ProductQuery {
            size: Some("Large (Over 25cm)".to_string()),
            min_rating: Some(4.6),
            ..Default::default()
        };
        assert_eq!(names(&search_products(&db, &query).await?), vec!["Crystal Bowl"]);

        let query = ProductQuery {
            material: Some("wood".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&search_products(&db, &query).await?), vec!["wooden shield"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_sort_orders() -> Result<()> {
        let db = setup_test_db().await?;
        seed_trophies(&db).await?;

        let query = ProductQuery {
            category: Some("trophies".to_string()),
            sort_by: SortBy::PriceLowToHigh,
            ..Default::default()
        };
        assert_eq!(
            names(&search_products(&db, &query).await?),
            vec!["Acrylic Star", "wooden shield", "Gold Cup", "Crystal Bowl"]
        );

        let query = ProductQuery {
            category: Some("trophies".to_string()),
            sort_by: SortBy::Rating,
            ..Default::default()
        };
        assert_eq!(
            names(&search_products(&db, &query).await?),
            vec!["Crystal Bowl", "Gold Cup", "Acrylic Star", "wooden shield"]
        );
        Ok(())
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!(SortBy::parse("price-low"), Some(SortBy::PriceLowToHigh));
        assert_eq!(SortBy::parse("price-high"), Some(SortBy::PriceHighToLow));
        assert_eq!(SortBy::parse("rating"), Some(SortBy::Rating));
        assert_eq!(SortBy::parse("name"), Some(SortBy::Name));
        assert_eq!(SortBy::parse("newest"), None);
    }
}
