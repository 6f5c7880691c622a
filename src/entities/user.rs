//! User entity - Profile record for an account created by the auth service.
//!
//! The auth service owns credentials; this table only stores the profile and the
//! role that gates back-office operations.

use super::fields::ShippingAddress;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Access level of a user
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular customer
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    /// Back-office administrator
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Parses `"user"` or `"admin"`, ignoring case
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User id issued by the auth service
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    /// Sign-in email
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Access level
    pub role: UserRole,
    /// Saved delivery address
    pub address: Option<ShippingAddress>,
    /// When the profile was created
    pub created_at: DateTimeUtc,
}

/// Users are referenced by uid from other tables, without foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
