//! Cart synchronizer - one reactive cart regardless of sign-in state.
//!
//! A [`CartSession`] owns the visitor's cart for the lifetime of a client session:
//!
//! * signed out, the cart is the guest list in a [`GuestCartStore`];
//! * on sign-in the guest lines are replayed into the server cart one by one and the
//!   guest store is cleared;
//! * signed in, every mutation goes to the server cart and the view is re-read from it;
//! * a non-empty signed-in cart that stays unchanged for the idle window is recorded
//!   as an abandoned cart. Each change re-arms the timer.
//!
//! The current [`CartView`] is published on a `tokio::sync::watch` channel.

use crate::{
    core::{
        abandoned,
        cart::{self, CartProduct, CartView},
        guest::{self, GuestCartStore},
        order::{self, CheckoutRequest},
    },
    entities::{fields::CartItem, order as order_entity},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

#[derive(Default)]
struct SessionState {
    user_id: Option<String>,
    abandon_timer: Option<JoinHandle<()>>,
}

impl SessionState {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.abandon_timer.take() {
            timer.abort();
        }
    }
}

/// A client's cart session.
pub struct CartSession {
    db: Arc<DatabaseConnection>,
    guest: Arc<dyn GuestCartStore>,
    idle: Duration,
    state: Mutex<SessionState>,
    view: watch::Sender<CartView>,
}

impl CartSession {
    /// Opens a signed-out session over `guest`, publishing whatever the store holds.
    ///
    /// # Errors
    /// Returns an error if the guest store cannot be read.
    pub fn new(
        db: Arc<DatabaseConnection>,
        guest: Arc<dyn GuestCartStore>,
        idle: Duration,
    ) -> Result<Self> {
        let initial = CartView::from_lines(guest.load()?);
        let (view, _) = watch::channel(initial);
        Ok(Self {
            db,
            guest,
            idle,
            state: Mutex::new(SessionState::default()),
            view,
        })
    }

    /// Subscribes to cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartView> {
        self.view.subscribe()
    }

    /// The current cart.
    #[must_use]
    pub fn view(&self) -> CartView {
        self.view.borrow().clone()
    }

    /// The signed-in user, if any.
    pub async fn user_id(&self) -> Option<String> {
        self.state.lock().await.user_id.clone()
    }

    /// Signs `user_id` in and merges the guest cart into their server cart.
    ///
    /// The merge replays each guest line with a positive quantity through
    /// [`cart::add_to_cart`] in order; lines of zero or less are dropped. It is not
    /// atomic: if a line fails, earlier lines stay merged, the guest store keeps only
    /// the lines not yet merged, the session stays signed out, and the error is
    /// returned.
    ///
    /// # Errors
    /// Returns an error if the user id is blank or a store or database operation fails.
    #[instrument(skip(self))]
    pub async fn sign_in(&self, user_id: &str) -> Result<CartView> {
        let uid = cart::require_user(Some(user_id))?.to_string();
        let mut state = self.state.lock().await;
        state.cancel_timer();
        state.user_id = None;

        let guest_lines: Vec<CartItem> = self
            .guest
            .load()?
            .into_iter()
            .filter(|line| line.quantity > 0)
            .collect();
        for (merged, line) in guest_lines.iter().enumerate() {
            let added =
                cart::add_to_cart(&self.db, Some(&uid), &CartProduct::from(line), line.quantity)
                    .await;
            if let Err(e) = added {
                warn!("Guest cart merge stopped at product {}: {e}", line.product_id);
                let remaining = &guest_lines[merged..];
                self.guest.save(remaining)?;
                self.publish(CartView::from_lines(remaining.to_vec()));
                return Err(e);
            }
        }
        self.guest.clear()?;
        if !guest_lines.is_empty() {
            info!("Merged {} guest cart lines into cart of {uid}", guest_lines.len());
        }

        state.user_id = Some(uid);
        self.refresh_server(&mut state).await
    }

    /// Signs the current user out and switches back to the guest cart.
    ///
    /// # Errors
    /// Returns an error if the guest store cannot be read.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<CartView> {
        let mut state = self.state.lock().await;
        state.cancel_timer();
        if let Some(uid) = state.user_id.take() {
            info!("Signed out {uid}");
        }
        let view = CartView::from_lines(self.guest.load()?);
        self.publish(view.clone());
        Ok(view)
    }

    /// Adds `quantity` units of a product.
    ///
    /// # Errors
    /// Returns an error if `quantity` is not positive or persisting the change fails.
    pub async fn add(&self, product: &CartProduct, quantity: i32) -> Result<CartView> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity { quantity });
        }
        let mut state = self.state.lock().await;
        match state.user_id.clone() {
            Some(uid) => {
                cart::add_to_cart(&self.db, Some(&uid), product, quantity).await?;
                self.refresh_server(&mut state).await
            }
            None => self.mutate_guest(|items| guest::add_item(items, product, quantity)),
        }
    }

    /// Removes a product.
    ///
    /// # Errors
    /// Returns an error if persisting the change fails.
    pub async fn remove(&self, product_id: i64) -> Result<CartView> {
        let mut state = self.state.lock().await;
        match state.user_id.clone() {
            Some(uid) => {
                cart::remove_from_cart(&self.db, Some(&uid), product_id).await?;
                self.refresh_server(&mut state).await
            }
            None => self.mutate_guest(|items| {
                guest::remove_item(items, product_id);
                Ok(())
            }),
        }
    }

    /// Sets a product's quantity; zero or less removes it.
    ///
    /// # Errors
    /// Returns an error if persisting the change fails.
    pub async fn update_quantity(&self, product_id: i64, quantity: i32) -> Result<CartView> {
        let mut state = self.state.lock().await;
        match state.user_id.clone() {
            Some(uid) => {
                cart::update_quantity(&self.db, Some(&uid), product_id, quantity).await?;
                self.refresh_server(&mut state).await
            }
            None => self.mutate_guest(|items| {
                guest::set_item_quantity(items, product_id, quantity);
                Ok(())
            }),
        }
    }

    /// Empties the cart.
    ///
    /// # Errors
    /// Returns an error if persisting the change fails.
    pub async fn clear(&self) -> Result<CartView> {
        let mut state = self.state.lock().await;
        match state.user_id.clone() {
            Some(uid) => {
                cart::clear_cart(&self.db, Some(&uid)).await?;
                self.refresh_server(&mut state).await
            }
            None => self.mutate_guest(|items| {
                items.clear();
                Ok(())
            }),
        }
    }

    /// Places an order from the signed-in user's cart and publishes the emptied cart.
    ///
    /// # Errors
    /// Returns [`Error::NotAuthenticated`] when signed out, or any checkout error.
    #[instrument(skip(self, request))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<order_entity::Model> {
        let mut state = self.state.lock().await;
        let uid = state.user_id.clone().ok_or(Error::NotAuthenticated)?;
        let placed = order::place_order(&self.db, Some(&uid), request).await?;
        self.refresh_server(&mut state).await?;
        Ok(placed)
    }

    /// Re-reads the server cart, publishes it, and re-arms the abandoned-cart timer.
    async fn refresh_server(&self, state: &mut SessionState) -> Result<CartView> {
        let view = cart::get_cart_view(&self.db, state.user_id.as_deref()).await?;
        self.publish(view.clone());
        self.rearm_abandon_timer(state, &view);
        Ok(view)
    }

    fn mutate_guest<F>(&self, mutate: F) -> Result<CartView>
    where
        F: FnOnce(&mut Vec<CartItem>) -> Result<()>,
    {
        let mut items = self.view.borrow().lines.clone();
        mutate(&mut items)?;
        self.guest.save(&items)?;
        let view = CartView::from_lines(items);
        self.publish(view.clone());
        Ok(view)
    }

    fn publish(&self, view: CartView) {
        self.view.send_replace(view);
    }

    fn rearm_abandon_timer(&self, state: &mut SessionState, view: &CartView) {
        state.cancel_timer();

        let Some(uid) = state.user_id.clone() else {
            return;
        };
        if view.is_empty() {
            return;
        }

        let db = Arc::clone(&self.db);
        let snapshot = view.clone();
        let idle = self.idle;
        debug!("Abandoned-cart timer armed for {uid} ({idle:?})");
        state.abandon_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            if let Err(e) = abandoned::save_snapshot(&db, &uid, &snapshot).await {
                warn!("Failed to record abandoned cart for {uid}: {e}");
            }
        }));
    }
}

impl Drop for CartSession {
    fn drop(&mut self) {
        self.state.get_mut().cancel_timer();
    }
}
