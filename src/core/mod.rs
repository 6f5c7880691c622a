/// Abandoned-cart snapshots of idle signed-in carts
pub mod abandoned;

/// Store-wide and per-customer totals
pub mod analytics;

/// Server-side cart of a signed-in user
pub mod cart;

/// Catalog filtering and sorting
pub mod catalog;

/// Percentage discount codes
pub mod coupon;

/// Local cart of a visitor who has not signed in
pub mod guest;

/// Checkout, status transitions and order listings
pub mod order;

/// Product CRUD and form helpers
pub mod product;

/// Product reviews and ratings
pub mod review;

/// Cart session that follows the visitor across sign-in
pub mod sync;

/// User profiles and roles
pub mod user;
