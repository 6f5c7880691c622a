//! Unified error type for the storefront.
//!
//! Every fallible operation in the crate returns [`Result`], so callers (the CLI or a
//! web layer) can match on a single enum and decide how to surface the failure.

use thiserror::Error;

/// All errors produced by the storefront services.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// The underlying database returned an error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem access failed (guest cart file, config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation on the server cart was attempted without a signed-in user
    #[error("No user is signed in")]
    NotAuthenticated,

    /// The user exists but lacks the admin role
    #[error("User '{uid}' is not an admin")]
    Forbidden {
        /// The user that attempted the operation
        uid: String,
    },

    /// The user does not exist
    #[error("User '{uid}' not found")]
    UserNotFound {
        /// The missing user id
        uid: String,
    },

    /// The product does not exist
    #[error("Product '{id}' not found")]
    ProductNotFound {
        /// The missing product id
        id: i64,
    },

    /// The order does not exist
    #[error("Order '{id}' not found")]
    OrderNotFound {
        /// The missing order id
        id: i64,
    },

    /// The coupon does not exist
    #[error("Coupon '{code}' not found")]
    CouponNotFound {
        /// The missing coupon code
        code: String,
    },

    /// A monetary amount was negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A cart quantity delta was zero or negative
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i32,
    },

    /// A rating was outside the accepted range
    #[error("Invalid rating: {rating}")]
    InvalidRating {
        /// The rejected rating
        rating: f64,
    },

    /// Checkout was attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Not enough units of a product are available for checkout
    #[error("Insufficient stock for '{name}': requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name
        name: String,
        /// Quantity in the cart
        requested: i32,
        /// Units in stock
        available: i32,
    },

    /// The requested order status change is not allowed
    #[error("Cannot move order from '{from}' to '{to}'")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Marking an order shipped requires a carrier and a tracking id
    #[error("Shipping an order requires both a delivery partner and an AWB id")]
    MissingShipmentDetails,

    /// The coupon exists but cannot be applied to this order
    #[error("Coupon '{code}' cannot be applied: {reason}")]
    InvalidCoupon {
        /// The coupon code
        code: String,
        /// Why it was rejected
        reason: String,
    },

    /// A coupon with the same code already exists
    #[error("Coupon '{code}' already exists")]
    DuplicateCoupon {
        /// The duplicate code
        code: String,
    },

    /// Input failed a domain validation rule
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the rule that failed
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
