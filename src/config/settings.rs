//! Application settings loaded from `store.toml`.
//!
//! Every field has a default, so a missing file or an empty file yields a working
//! configuration. `DATABASE_URL` from the environment still wins over the file (see
//! [`crate::config::database::get_database_url`]).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{path::Path, path::PathBuf, time::Duration};
use tracing::{debug, info};

const fn default_idle_secs() -> u64 {
    120
}

const fn default_orders_per_page() -> u64 {
    10
}

const fn default_history_per_page() -> u64 {
    5
}

fn default_guest_cart_path() -> PathBuf {
    PathBuf::from("data/guest-cart.json")
}

/// Top-level settings structure representing `store.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database URL; overridden by `DATABASE_URL`
    #[serde(default)]
    pub database_url: Option<String>,
    /// File backing the guest cart
    #[serde(default = "default_guest_cart_path")]
    pub guest_cart_path: PathBuf,
    /// Seconds a non-empty cart must sit idle before an abandoned-cart snapshot
    #[serde(default = "default_idle_secs")]
    pub abandoned_cart_idle_secs: u64,
    /// Page size for the admin order list
    #[serde(default = "default_orders_per_page")]
    pub orders_per_page: u64,
    /// Page size for a customer's order history
    #[serde(default = "default_history_per_page")]
    pub history_per_page: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            guest_cart_path: default_guest_cart_path(),
            abandoned_cart_idle_secs: default_idle_secs(),
            orders_per_page: default_orders_per_page(),
            history_per_page: default_history_per_page(),
        }
    }
}

impl Settings {
    /// Idle window before an abandoned-cart snapshot is written
    #[must_use]
    pub const fn abandoned_cart_idle(&self) -> Duration {
        Duration::from_secs(self.abandoned_cart_idle_secs)
    }

    /// Resolved database URL, honouring `DATABASE_URL`
    #[must_use]
    pub fn database_url(&self) -> String {
        crate::config::database::get_database_url(self.database_url.as_deref())
    }

    fn validate(self) -> Result<Self> {
        if self.orders_per_page == 0 || self.history_per_page == 0 {
            return Err(Error::Config {
                message: "Page sizes must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses settings from a TOML string.
///
/// # Errors
/// Returns an error if the TOML is invalid or a page size is zero.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse store settings: {e}"),
    })?;
    settings.validate()
}

/// Loads settings from `path`, falling back to defaults when the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        info!("No settings file at {path_ref:?}, using defaults");
        return Ok(Settings::default());
    }

    debug!("Loading settings from {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {path_ref:?}: {e}"),
    })?;
    parse_settings(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.abandoned_cart_idle(), Duration::from_secs(120));
        assert_eq!(settings.orders_per_page, 10);
        assert_eq!(settings.history_per_page, 5);
        assert_eq!(settings.guest_cart_path, PathBuf::from("data/guest-cart.json"));
        assert!(settings.database_url.is_none());
    }

    #[test]
    fn test_parse_overrides() {
        let settings = parse_settings(
            r#"
            database_url = "sqlite::memory:"
            guest_cart_path = "/tmp/cart.json"
            abandoned_cart_idle_secs = 30
            orders_per_page = 25
            "#,
        )
        .unwrap();
        assert_eq!(settings.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(settings.abandoned_cart_idle_secs, 30);
        assert_eq!(settings.orders_per_page, 25);
        assert_eq!(settings.history_per_page, 5);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = parse_settings("history_per_page = 0");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = load_settings(dir.path().join("store.toml"))?;
        assert_eq!(settings.orders_per_page, 10);
        Ok(())
    }
}
