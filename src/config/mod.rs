/// Database connection and schema creation
pub mod database;

/// Product catalog loading from TOML for bulk replacement
pub mod catalog;

/// Application settings from `store.toml` and the environment
pub mod settings;
