//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod abandoned_cart;
pub mod cart_line;
pub mod coupon;
pub mod fields;
pub mod order;
pub mod product;
pub mod review;
pub mod user;
pub mod user_order;

// Re-export specific types to avoid conflicts
pub use abandoned_cart::{
    Column as AbandonedCartColumn, Entity as AbandonedCart, Model as AbandonedCartModel,
};
pub use cart_line::{Column as CartLineColumn, Entity as CartLine, Model as CartLineModel};
pub use coupon::{Column as CouponColumn, Entity as Coupon, Model as CouponModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserRole};
pub use user_order::{Column as UserOrderColumn, Entity as UserOrder, Model as UserOrderModel};
