//! Guest cart - the cart of a visitor who has not signed in.
//!
//! The guest cart is persisted locally through a [`GuestCartStore`]. Every mutation
//! rewrites the full list, mirroring how the storefront keeps it in local storage.
//! The list helpers here are pure; [`crate::core::sync::CartSession`] pairs them with a
//! store.

use crate::{
    core::cart::CartProduct,
    entities::fields::CartItem,
    errors::{Error, Result},
};
use chrono::Utc;
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::debug;

/// Local persistence for the guest cart.
pub trait GuestCartStore: Send + Sync {
    /// Reads the stored list; an absent store reads as empty.
    fn load(&self) -> Result<Vec<CartItem>>;
    /// Replaces the stored list.
    fn save(&self, items: &[CartItem]) -> Result<()>;
    /// Deletes the stored list.
    fn clear(&self) -> Result<()>;
}

/// Stores the guest cart as a JSON array in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuestCartStore for JsonFileStore {
    fn load(&self) -> Result<Vec<CartItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(items)?)?;
        debug!("Saved {} guest cart lines to {:?}", items.len(), self.path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps the guest cart in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<CartItem>>,
}

impl MemoryStore {
    /// Creates a store pre-filled with `items`
    #[must_use]
    pub const fn with_items(items: Vec<CartItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl GuestCartStore for MemoryStore {
    fn load(&self) -> Result<Vec<CartItem>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

/// Adds `quantity` units of a product to a guest list, merging with an existing line.
///
/// Callers validate that `quantity` is positive.
///
/// # Errors
/// Returns [`Error::InvalidQuantity`] if the merged quantity would overflow.
pub fn add_item(items: &mut Vec<CartItem>, product: &CartProduct, quantity: i32) -> Result<()> {
    let now = Utc::now();
    if let Some(line) = items
        .iter_mut()
        .find(|line| line.product_id == product.product_id)
    {
        line.quantity = line
            .quantity
            .checked_add(quantity)
            .ok_or(Error::InvalidQuantity { quantity })?;
        line.name.clone_from(&product.name);
        line.price = product.price;
        line.image.clone_from(&product.image);
        line.updated_at = now;
    } else {
        items.push(CartItem {
            product_id: product.product_id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
            updated_at: now,
        });
    }
    Ok(())
}

/// Removes a product from a guest list.
pub fn remove_item(items: &mut Vec<CartItem>, product_id: i64) {
    items.retain(|line| line.product_id != product_id);
}

/// Sets a line's quantity; zero or less removes the line.
pub fn set_item_quantity(items: &mut Vec<CartItem>, product_id: i64, quantity: i32) {
    if quantity <= 0 {
        remove_item(items, product_id);
        return;
    }
    if let Some(line) = items.iter_mut().find(|line| line.product_id == product_id) {
        line.quantity = quantity;
        line.updated_at = Utc::now();
    }
}
