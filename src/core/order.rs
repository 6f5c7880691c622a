//! Order business logic - checkout, status transitions and order listings.
//!
//! Every order exists twice: the canonical row in `orders` (read by the back office)
//! and a denormalized copy in `user_orders` (read by the customer's order history).
//! Both are written in the same database transaction at checkout and on every status
//! change, so the copy can never disagree with the canonical row.

use crate::{
    core::{cart::require_user, coupon},
    entities::{
        CartLine, Order, OrderStatus, Product, UserOrder, cart_line,
        fields::{OrderItem, OrderItems, ShippingAddress},
        order, product, user_order,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// What the customer submits at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Delivery address
    pub shipping_address: ShippingAddress,
    /// Payment method, e.g. `"cod"`
    pub payment_method: String,
    /// Optional coupon code
    pub coupon_code: Option<String>,
}

/// Carrier details required to mark an order shipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentDetails {
    /// Carrier name, e.g. `"Delhivery"`
    pub delivery_partner: String,
    /// Airway bill / tracking id
    pub awb_id: String,
}

impl ShipmentDetails {
    /// Creates shipment details
    pub fn new(delivery_partner: impl Into<String>, awb_id: impl Into<String>) -> Self {
        Self {
            delivery_partner: delivery_partner.into(),
            awb_id: awb_id.into(),
        }
    }

    fn validated(shipment: Option<&Self>) -> Result<(String, String)> {
        let Some(shipment) = shipment else {
            return Err(Error::MissingShipmentDetails);
        };
        let partner = shipment.delivery_partner.trim();
        let awb = shipment.awb_id.trim();
        if partner.is_empty() || awb.is_empty() {
            return Err(Error::MissingShipmentDetails);
        }
        Ok((partner.to_string(), awb.to_string()))
    }
}

/// One page of a listing. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// This page's number
    pub page: u64,
    /// Total number of rows across all pages
    pub total_items: u64,
    /// Total number of pages
    pub total_pages: u64,
}

fn validate_address(address: &ShippingAddress) -> Result<()> {
    let required = [
        ("full name", &address.full_name),
        ("phone", &address.phone),
        ("address line", &address.line1),
        ("city", &address.city),
        ("state", &address.state),
        ("pincode", &address.pincode),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(Error::Validation {
            message: format!("Shipping address is missing the {field}"),
        });
    }
    Ok(())
}

/// Places an order for everything in the user's cart.
///
/// Within one transaction this prices the cart from the current catalog, applies the
/// coupon, inserts the order and its per-user copy, decrements stock, and empties the
/// cart. Any failure leaves the cart and stock untouched.
///
/// # Errors
/// Returns an error if:
/// - No user is signed in
/// - The address or payment method is incomplete
/// - The cart is empty
/// - A product no longer exists or lacks stock
/// - The coupon cannot be applied
/// - A database operation fails
#[instrument(skip(db, request))]
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: Option<&str>,
    request: &CheckoutRequest,
) -> Result<order::Model> {
    let uid = require_user(user_id)?;
    validate_address(&request.shipping_address)?;
    if request.payment_method.trim().is_empty() {
        return Err(Error::Validation {
            message: "Payment method is required".to_string(),
        });
    }

    let txn = db.begin().await?;

    let lines = CartLine::find()
        .filter(cart_line::Column::UserId.eq(uid))
        .order_by_asc(cart_line::Column::ProductId)
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut products = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = Product::find_by_id(line.product_id)
            .one(&txn)
            .await?
            .ok_or(Error::ProductNotFound {
                id: line.product_id,
            })?;
        if product.stock < line.quantity {
            return Err(Error::InsufficientStock {
                name: product.name,
                requested: line.quantity,
                available: product.stock,
            });
        }
        items.push(OrderItem {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().to_string(),
            quantity: line.quantity,
        });
        products.push((product, line.quantity));
    }

    let subtotal = coupon::round_currency(
        items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum(),
    );
    let now = Utc::now();

    let (coupon_code, discount_amount) = match request.coupon_code.as_deref() {
        Some(code) if !code.trim().is_empty() => {
            let applied = coupon::find_applicable_coupon(&txn, code, subtotal, now).await?;
            let discount = coupon::coupon_discount(subtotal, applied.percent_off);
            (Some(applied.code), discount)
        }
        _ => (None, 0.0),
    };
    let total_amount = coupon::round_currency(subtotal - discount_amount);

    let placed = order::ActiveModel {
        user_id: Set(uid.to_string()),
        items: Set(OrderItems(items.clone())),
        subtotal: Set(subtotal),
        coupon_code: Set(coupon_code),
        discount_amount: Set(discount_amount),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        shipping_address: Set(request.shipping_address.clone()),
        payment_method: Set(request.payment_method.trim().to_lowercase()),
        delivery_partner: Set(None),
        awb_id: Set(None),
        shipped_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    user_order::ActiveModel {
        user_id: Set(uid.to_string()),
        order_id: Set(placed.id),
        items: Set(OrderItems(items)),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        delivery_partner: Set(None),
        awb_id: Set(None),
        shipped_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (product, quantity) in products {
        let remaining = product.stock - quantity;
        let mut active: product::ActiveModel = product.into();
        active.stock = Set(remaining);
        active.in_stock = Set(remaining > 0);
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }

    CartLine::delete_many()
        .filter(cart_line::Column::UserId.eq(uid))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        "Order {} placed by {uid}: {} lines, total {:.2}",
        placed.id,
        placed.items.0.len(),
        placed.total_amount
    );
    Ok(placed)
}

/// Moves an order to `new_status`, mirroring the change onto the user's copy.
///
/// Allowed moves are pending → accepted or cancelled, accepted → shipped or cancelled,
/// and shipped → delivered. Moving to `shipped` requires `shipment` with a non-blank
/// carrier and AWB id; those and the shipped timestamp are written to both rows. The
/// shipment requirement is checked before the order is read.
///
/// # Errors
/// Returns an error if:
/// - Shipping without complete shipment details
/// - The order does not exist
/// - The transition is not allowed
/// - A database operation fails
#[instrument(skip(db, shipment))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    new_status: OrderStatus,
    shipment: Option<&ShipmentDetails>,
) -> Result<order::Model> {
    let shipping = if new_status == OrderStatus::Shipped {
        Some(ShipmentDetails::validated(shipment)?)
    } else {
        None
    };

    let txn = db.begin().await?;

    let current = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    if !current.status.can_transition_to(new_status) {
        return Err(Error::InvalidTransition {
            from: current.status.to_string(),
            to: new_status.to_string(),
        });
    }

    let now = Utc::now();
    let mut canonical: order::ActiveModel = current.into();
    canonical.status = Set(new_status);
    canonical.updated_at = Set(now);

    let mut copy = user_order::ActiveModel {
        status: Set(new_status),
        ..Default::default()
    };

    if let Some((partner, awb)) = shipping {
        canonical.delivery_partner = Set(Some(partner.clone()));
        canonical.awb_id = Set(Some(awb.clone()));
        canonical.shipped_at = Set(Some(now));
        copy.delivery_partner = Set(Some(partner));
        copy.awb_id = Set(Some(awb));
        copy.shipped_at = Set(Some(now));
    }

    let updated = canonical.update(&txn).await?;
    let copies = UserOrder::update_many()
        .set(copy)
        .filter(user_order::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        "Order {order_id} moved to {new_status} ({} user copies synced)",
        copies.rows_affected
    );
    Ok(updated)
}

/// Retrieves an order by id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

fn check_page_size(per_page: u64) -> Result<()> {
    if per_page == 0 {
        return Err(Error::Validation {
            message: "Page size must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Lists orders newest first, optionally only those in `status`.
///
/// # Errors
/// Returns an error if `per_page` is zero or the query fails.
pub async fn list_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
    page: u64,
    per_page: u64,
) -> Result<Page<order::Model>> {
    check_page_size(per_page)?;
    let page = page.max(1);

    let mut query = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id);
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }

    let paginator = query.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// Lists a customer's order copies newest first.
///
/// # Errors
/// Returns an error if `per_page` is zero or the query fails.
pub async fn order_history(
    db: &DatabaseConnection,
    user_id: &str,
    page: u64,
    per_page: u64,
) -> Result<Page<user_order::Model>> {
    check_page_size(per_page)?;
    let page = page.max(1);

    let paginator = UserOrder::find()
        .filter(user_order::Column::UserId.eq(user_id))
        .order_by_desc(user_order::Column::CreatedAt)
        .order_by_desc(user_order::Column::Id)
        .paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{
        cart::{CartProduct, add_to_cart, get_cart},
        coupon::create_coupon,
        product::get_product_by_id,
    };
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    async fn order_with_cart(db: &DatabaseConnection, uid: &str) -> Result<order::Model> {
        let bat = create_custom_product(db, "Bat", 45000.0, 5).await?;
        let ball = create_custom_product(db, "Ball", 1800.0, 24).await?;
        add_to_cart(db, Some(uid), &CartProduct::from(&bat), 1).await?;
        add_to_cart(db, Some(uid), &CartProduct::from(&ball), 2).await?;
        place_order(db, Some(uid), &test_checkout(None)).await
    }

    async fn user_copy(db: &DatabaseConnection, order_id: i64) -> Result<user_order::Model> {
        Ok(UserOrder::find()
            .filter(user_order::Column::OrderId.eq(order_id))
            .one(db)
            .await?
            .unwrap())
    }

    #[tokio::test]
    async fn test_place_order_writes_both_copies() -> Result<()> {
        let db = setup_test_db().await?;
        let placed = order_with_cart(&db, "u1").await?;

        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.subtotal, 48600.0);
        assert_eq!(placed.total_amount, 48600.0);
        assert_eq!(placed.items.0.len(), 2);
        assert_eq!(placed.payment_method, "cod");

        let copy = user_copy(&db, placed.id).await?;
        assert_eq!(copy.user_id, "u1");
        assert_eq!(copy.total_amount, placed.total_amount);
        assert_eq!(copy.items, placed.items);
        assert_eq!(copy.status, OrderStatus::Pending);

        assert!(get_cart(&db, Some("u1")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_decrements_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let bat = create_custom_product(&db, "Bat", 100.0, 2).await?;
        add_to_cart(&db, Some("u1"), &CartProduct::from(&bat), 2).await?;
        place_order(&db, Some("u1"), &test_checkout(None)).await?;

        let after = get_product_by_id(&db, bat.id).await?.unwrap();
        assert_eq!(after.stock, 0);
        assert!(!after.in_stock);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_uses_catalog_price() -> Result<()> {
        let db = setup_test_db().await?;
        let bat = create_custom_product(&db, "Bat", 100.0, 5).await?;
        let mut stale = CartProduct::from(&bat);
        stale.price = 1.0;
        add_to_cart(&db, Some("u1"), &stale, 1).await?;

        let placed = place_order(&db, Some("u1"), &test_checkout(None)).await?;
        assert_eq!(placed.total_amount, 100.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_failures_leave_cart() -> Result<()> {
        let db = setup_test_db().await?;

        let result = place_order(&db, Some("u1"), &test_checkout(None)).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));

        let bat = create_custom_product(&db, "Bat", 100.0, 1).await?;
        add_to_cart(&db, Some("u1"), &CartProduct::from(&bat), 3).await?;
        let result = place_order(&db, Some("u1"), &test_checkout(None)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                requested: 3,
                available: 1,
                ..
            }
        ));
        assert_eq!(get_cart(&db, Some("u1")).await?.len(), 1);
        assert_eq!(get_product_by_id(&db, bat.id).await?.unwrap().stock, 1);
        assert!(Order::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = place_order(&db, None, &test_checkout(None)).await;
        assert!(matches!(result.unwrap_err(), Error::NotAuthenticated));

        let mut request = test_checkout(None);
        request.shipping_address.pincode = " ".to_string();
        let result = place_order(&db, Some("u1"), &request).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let mut request = test_checkout(None);
        request.payment_method = String::new();
        let result = place_order(&db, Some("u1"), &request).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_with_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        create_coupon(&db, "WELCOME10", 10, 1000.0, None).await?;
        let bat = create_custom_product(&db, "Bat", 1234.5, 5).await?;
        add_to_cart(&db, Some("u1"), &CartProduct::from(&bat), 1).await?;

        let placed = place_order(&db, Some("u1"), &test_checkout(Some("welcome10"))).await?;
        assert_eq!(placed.coupon_code.as_deref(), Some("WELCOME10"));
        assert_eq!(placed.subtotal, 1234.5);
        assert_eq!(placed.discount_amount, 123.45);
        assert_eq!(placed.total_amount, 1111.05);
        assert_eq!(user_copy(&db, placed.id).await?.total_amount, 1111.05);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rejects_bad_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        let bat = create_custom_product(&db, "Bat", 100.0, 5).await?;
        add_to_cart(&db, Some("u1"), &CartProduct::from(&bat), 1).await?;

        let result = place_order(&db, Some("u1"), &test_checkout(Some("NOPE"))).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidCoupon { .. }));
        assert_eq!(get_cart(&db, Some("u1")).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_shipping_requires_carrier_and_awb() -> Result<()> {
        let db = setup_test_db().await?;
        let placed = order_with_cart(&db, "u1").await?;
        update_order_status(&db, placed.id, OrderStatus::Accepted, None).await?;

        let incomplete = [
            None,
            Some(ShipmentDetails::new("Delhivery", "")),
            Some(ShipmentDetails::new("  ", "AWB123")),
        ];
        for shipment in &incomplete {
            let result =
                update_order_status(&db, placed.id, OrderStatus::Shipped, shipment.as_ref()).await;
            assert!(matches!(result.unwrap_err(), Error::MissingShipmentDetails));
        }

        let unchanged = get_order(&db, placed.id).await?.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Accepted);
        assert!(unchanged.awb_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_shipment_checked_before_lookup() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = update_order_status(&db, 1, OrderStatus::Shipped, None).await;
        assert!(matches!(result.unwrap_err(), Error::MissingShipmentDetails));
        Ok(())
    }

    #[tokio::test]
    async fn test_shipping_syncs_user_copy() -> Result<()> {
        let db = setup_test_db().await?;
        let placed = order_with_cart(&db, "u1").await?;
        update_order_status(&db, placed.id, OrderStatus::Accepted, None).await?;

        let shipment = ShipmentDetails::new(" BlueDart ", " 1234567890 ");
        let shipped =
            update_order_status(&db, placed.id, OrderStatus::Shipped, Some(&shipment)).await?;
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(shipped.delivery_partner.as_deref(), Some("BlueDart"));
        assert_eq!(shipped.awb_id.as_deref(), Some("1234567890"));
        assert!(shipped.shipped_at.is_some());

        let copy = user_copy(&db, placed.id).await?;
        assert_eq!(copy.status, OrderStatus::Shipped);
        assert_eq!(copy.delivery_partner, shipped.delivery_partner);
        assert_eq!(copy.awb_id, shipped.awb_id);
        assert_eq!(copy.shipped_at, shipped.shipped_at);

        let delivered = update_order_status(&db, placed.id, OrderStatus::Delivered, None).await?;
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.awb_id.as_deref(), Some("1234567890"));
        assert_eq!(user_copy(&db, placed.id).await?.status, OrderStatus::Delivered);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transitions_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let placed = order_with_cart(&db, "u1").await?;

        let result = update_order_status(&db, placed.id, OrderStatus::Delivered, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { from, to } if from == "pending" && to == "delivered"
        ));

        update_order_status(&db, placed.id, OrderStatus::Cancelled, None).await?;
        let result = update_order_status(&db, placed.id, OrderStatus::Accepted, None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidTransition { .. }));

        assert_eq!(user_copy(&db, placed.id).await?.status, OrderStatus::Cancelled);

        let result = update_order_status(&db, 999, OrderStatus::Accepted, None).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_and_history_pagination() -> Result<()> {
        let db = setup_test_db().await?;
        let bat = create_custom_product(&db, "Bat", 10.0, 100).await?;
        let mut placed = Vec::new();
        for uid in ["u1", "u1", "u1", "u2"] {
            add_to_cart(&db, Some(uid), &CartProduct::from(&bat), 1).await?;
            placed.push(place_order(&db, Some(uid), &test_checkout(None)).await?);
        }
        update_order_status(&db, placed[0].id, OrderStatus::Cancelled, None).await?;

        let first = list_orders(&db, None, 1, 3).await?;
        assert_eq!(first.total_items, 4);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.items[0].id, placed[3].id);

        let second = list_orders(&db, None, 2, 3).await?;
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, placed[0].id);

        let cancelled = list_orders(&db, Some(OrderStatus::Cancelled), 1, 10).await?;
        assert_eq!(cancelled.total_items, 1);

        let history = order_history(&db, "u1", 0, 2).await?;
        assert_eq!(history.page, 1);
        assert_eq!(history.total_items, 3);
        assert_eq!(history.items[0].order_id, placed[2].id);
        assert!(history.items.iter().all(|o| o.user_id == "u1"));

        let result = order_history(&db, "u1", 1, 0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }
}
