//! User profiles and roles.
//!
//! Accounts are created by the auth service; the storefront records a profile the
//! first time it sees a uid and keeps the role that gates back-office operations.

use crate::{
    entities::{User, UserRole, fields::ShippingAddress, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Creates the profile for `uid`, or refreshes its email and display name.
///
/// The role and saved address of an existing profile are left untouched; new
/// profiles start with [`UserRole::User`].
///
/// # Errors
/// Returns an error if the uid or email is blank, or the database write fails.
pub async fn upsert_user(
    db: &DatabaseConnection,
    uid: &str,
    email: &str,
    display_name: Option<&str>,
) -> Result<user::Model> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(Error::Validation {
            message: "User id cannot be empty".to_string(),
        });
    }
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::Validation {
            message: "Email cannot be empty".to_string(),
        });
    }
    let display_name = display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string);

    if let Some(existing) = get_user(db, uid).await? {
        let mut active: user::ActiveModel = existing.into();
        active.email = Set(email.to_string());
        active.display_name = Set(display_name);
        return active.update(db).await.map_err(Into::into);
    }

    let created = user::ActiveModel {
        uid: Set(uid.to_string()),
        email: Set(email.to_string()),
        display_name: Set(display_name),
        role: Set(UserRole::User),
        address: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!("Created profile for user {}", created.uid);
    Ok(created)
}

/// Retrieves a profile by uid.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_user(db: &DatabaseConnection, uid: &str) -> Result<Option<user::Model>> {
    User::find_by_id(uid.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every profile, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists admins ordered by email.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_admins(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .order_by_asc(user::Column::Email)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes a user's role.
///
/// # Errors
/// Returns an error if the user does not exist or the update fails.
pub async fn set_role(db: &DatabaseConnection, uid: &str, role: UserRole) -> Result<user::Model> {
    let existing = get_user(db, uid).await?.ok_or_else(|| Error::UserNotFound {
        uid: uid.to_string(),
    })?;
    let previous = existing.role;

    let mut active: user::ActiveModel = existing.into();
    active.role = Set(role);
    let updated = active.update(db).await?;

    info!("Changed role of {uid} from {previous:?} to {role:?}");
    Ok(updated)
}

/// Checks that `uid` belongs to an admin, returning the profile.
///
/// # Errors
/// Returns [`Error::UserNotFound`] for unknown uids, [`Error::Forbidden`] for
/// non-admins, or a database error.
pub async fn require_admin(db: &DatabaseConnection, uid: &str) -> Result<user::Model> {
    let profile = get_user(db, uid).await?.ok_or_else(|| Error::UserNotFound {
        uid: uid.to_string(),
    })?;
    if profile.role != UserRole::Admin {
        return Err(Error::Forbidden {
            uid: uid.to_string(),
        });
    }
    Ok(profile)
}

/// Saves the user's default delivery address.
///
/// # Errors
/// Returns an error if the user does not exist or the update fails.
pub async fn update_address(
    db: &DatabaseConnection,
    uid: &str,
    address: ShippingAddress,
) -> Result<user::Model> {
    let existing = get_user(db, uid).await?.ok_or_else(|| Error::UserNotFound {
        uid: uid.to_string(),
    })?;
    let mut active: user::ActiveModel = existing.into();
    active.address = Set(Some(address));
    active.update(db).await.map_err(Into::into)
}
