//! Cart client implementation.
//!
//! Each public operation is one user action: it sends at most one mutating
//! request, reports the result through [`CartUi`], and never returns an error.
//! Reads come in two flavours: `try_*` returning `Result`, and the plain form
//! that logs the failure and falls back to an empty value.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use storefront_cart_core::{CartItemId, CartSnapshot, Money, ProductId};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::api::{
    ADD_PATH, AddItemRequest, CLEAR_PATH, COUNT_PATH, ITEMS_PATH, ActionResponse, CountResponse,
    UPDATE_PATH, UpdateItemRequest, remove_path,
};
use crate::config::CartClientConfig;
use crate::error::{CartError, add_breadcrumb};
use crate::ui::{CartUi, Control, Notification};

/// User-facing texts.
pub mod messages {
    pub const ADDED: &str = "Product added to cart!";
    pub const ADD_FAILED: &str = "Error adding to cart";
    pub const UPDATE_FAILED: &str = "Error updating cart";
    pub const REMOVED: &str = "Item removed from cart";
    pub const REMOVE_FAILED: &str = "Error removing item";
    pub const CLEARED: &str = "Cart cleared";
    pub const CLEAR_FAILED: &str = "Error clearing cart";
    pub const VALIDATE_FAILED: &str = "Error validating cart";
    pub const EMPTY_CART: &str = "Your cart is empty";
    pub const INVALID_QUANTITY: &str = "Quantity must be at least 1";
    pub const CONFIRM_REMOVE: &str = "Remove this item from your cart?";
    pub const CONFIRM_CLEAR: &str = "Clear all items from your cart?";
}

/// How a user action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The server accepted the change and the UI was updated.
    Succeeded,
    /// The request failed; an error notification was shown.
    Failed,
    /// The user declined the confirmation; nothing was sent.
    Declined,
    /// The input was invalid; nothing was sent.
    Rejected,
    /// The control already had a request running; nothing was sent.
    InFlight,
}

impl Outcome {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// One line of the mini cart preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniCartLine {
    /// `"{name} x {quantity}"`
    pub label: String,
    /// Server-formatted line subtotal.
    pub subtotal: String,
}

// =============================================================================
// CartClient
// =============================================================================

/// Client for the storefront cart API.
///
/// Cheap to clone; clones share the HTTP connection pool, the session cookie
/// jar, the UI handle and the in-flight control set.
pub struct CartClient<U> {
    inner: Arc<ClientInner<U>>,
}

impl<U> Clone for CartClient<U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<U> {
    http: reqwest::Client,
    base_url: Url,
    row_exit_delay: Duration,
    clear_refresh_delay: Duration,
    ui: U,
    in_flight: Mutex<HashSet<Control>>,
}

impl<U> ClientInner<U> {
    fn in_flight(&self) -> MutexGuard<'_, HashSet<Control>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a control disabled while its request runs.
///
/// Dropping the guard re-enables the control, so every exit path restores it.
struct ControlGuard<'a, U: CartUi> {
    inner: &'a ClientInner<U>,
    control: Control,
}

impl<U: CartUi> Drop for ControlGuard<'_, U> {
    fn drop(&mut self) {
        self.inner.in_flight().remove(&self.control);
        self.inner.ui.set_control_enabled(self.control, true);
    }
}

impl<U: CartUi> CartClient<U> {
    /// Create a new cart client.
    ///
    /// The client keeps a cookie store so the server session survives across
    /// requests for the client's lifetime.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CartClientConfig, ui: U) -> Result<Self, CartError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ClientInner {
                http: builder.build()?,
                base_url: config.base_url.clone(),
                row_exit_delay: config.row_exit_delay,
                clear_refresh_delay: config.clear_refresh_delay,
                ui,
                in_flight: Mutex::new(HashSet::new()),
            }),
        })
    }

    /// The UI this client reports to.
    #[must_use]
    pub fn ui(&self) -> &U {
        &self.inner.ui
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether a request for `control` is currently running.
    #[must_use]
    pub fn is_in_flight(&self, control: Control) -> bool {
        self.inner.in_flight().contains(&control)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Add `quantity` units of a product to the cart.
    ///
    /// On success the badge shows the server-reported count.
    #[instrument(skip(self))]
    pub async fn add_item(&self, product_id: ProductId, quantity: u32) -> Outcome {
        if quantity == 0 {
            warn!("Refusing to add zero quantity");
            self.inner
                .ui
                .notify(Notification::error(messages::INVALID_QUANTITY));
            return Outcome::Rejected;
        }

        let Some(_guard) = self.acquire(Control::AddToCart(product_id)) else {
            debug!("Add to cart already in flight");
            return Outcome::InFlight;
        };

        add_breadcrumb(
            "add_item",
            &[
                ("product_id", product_id.to_string()),
                ("quantity", quantity.to_string()),
            ],
        );

        let request = AddItemRequest {
            product_id,
            quantity,
        };

        match self.post_json(ADD_PATH, &request).await {
            Ok(response) => {
                info!(cart_count = ?response.cart_count, "Added item to cart");
                match response.cart_count {
                    Some(count) => self.inner.ui.set_count(count),
                    None => self.refresh_count().await,
                }
                self.inner
                    .ui
                    .notify(Notification::success(messages::ADDED));
                Outcome::Succeeded
            }
            Err(e) => self.fail(&e, "Failed to add item to cart", messages::ADD_FAILED),
        }
    }

    /// Set a cart line's quantity.
    ///
    /// A quantity below one goes through [`Self::remove_item`], confirmation
    /// included; no update request is sent.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, item_id: CartItemId, new_quantity: i64) -> Outcome {
        if new_quantity < 1 {
            debug!("Quantity below one, removing item instead");
            return self.remove_item(item_id).await;
        }

        let Ok(quantity) = u32::try_from(new_quantity) else {
            warn!("Quantity out of range");
            self.inner
                .ui
                .notify(Notification::error(messages::UPDATE_FAILED));
            return Outcome::Rejected;
        };

        let Some(guard) = self.acquire(Control::Quantity(item_id)) else {
            debug!("Quantity update already in flight");
            return Outcome::InFlight;
        };

        add_breadcrumb(
            "update_quantity",
            &[
                ("cart_item_id", item_id.to_string()),
                ("quantity", quantity.to_string()),
            ],
        );

        let request = UpdateItemRequest {
            cart_item_id: item_id,
            quantity,
        };

        match self.post_json(UPDATE_PATH, &request).await {
            Ok(_) => {
                drop(guard);
                info!("Updated cart quantity");
                self.refresh_view().await;
                Outcome::Succeeded
            }
            Err(e) => self.fail(&e, "Failed to update cart", messages::UPDATE_FAILED),
        }
    }

    /// Remove a cart line after the user confirms.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Outcome {
        let control = Control::Remove(item_id);
        if self.is_in_flight(control) {
            debug!("Removal already in flight");
            return Outcome::InFlight;
        }

        if !self.inner.ui.confirm(messages::CONFIRM_REMOVE).await {
            debug!("Removal declined");
            return Outcome::Declined;
        }

        let Some(guard) = self.acquire(control) else {
            return Outcome::InFlight;
        };

        add_breadcrumb("remove_item", &[("cart_item_id", item_id.to_string())]);

        match self.post_empty(&remove_path(item_id)).await {
            Ok(_) => {
                drop(guard);
                info!("Removed item from cart");
                self.inner.ui.remove_row(item_id);
                self.inner
                    .ui
                    .notify(Notification::success(messages::REMOVED));
                tokio::time::sleep(self.inner.row_exit_delay).await;
                self.refresh_view().await;
                Outcome::Succeeded
            }
            Err(e) => self.fail(&e, "Failed to remove item", messages::REMOVE_FAILED),
        }
    }

    /// Remove every line after the user confirms.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Outcome {
        if self.is_in_flight(Control::ClearCart) {
            debug!("Clear already in flight");
            return Outcome::InFlight;
        }

        if !self.inner.ui.confirm(messages::CONFIRM_CLEAR).await {
            debug!("Clear declined");
            return Outcome::Declined;
        }

        let Some(guard) = self.acquire(Control::ClearCart) else {
            return Outcome::InFlight;
        };

        add_breadcrumb("clear_cart", &[]);

        match self.post_empty(CLEAR_PATH).await {
            Ok(_) => {
                drop(guard);
                info!("Cleared cart");
                self.inner
                    .ui
                    .notify(Notification::success(messages::CLEARED));
                tokio::time::sleep(self.inner.clear_refresh_delay).await;
                self.refresh_view().await;
                Outcome::Succeeded
            }
            Err(e) => self.fail(&e, "Failed to clear cart", messages::CLEAR_FAILED),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Fetch the current cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a list of items.
    pub async fn try_fetch_items(&self) -> Result<CartSnapshot, CartError> {
        self.get_json(ITEMS_PATH).await
    }

    /// Fetch the current cart snapshot, or an empty one on failure.
    #[instrument(skip(self))]
    pub async fn fetch_items(&self) -> CartSnapshot {
        match self.try_fetch_items().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart items");
                CartSnapshot::empty()
            }
        }
    }

    /// Fetch the badge count.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body has no `count`.
    pub async fn try_fetch_count(&self) -> Result<u32, CartError> {
        self.get_json::<CountResponse>(COUNT_PATH)
            .await
            .map(|response| response.count)
    }

    /// Fetch the badge count, or zero on failure.
    #[instrument(skip(self))]
    pub async fn fetch_count(&self) -> u32 {
        match self.try_fetch_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart count");
                0
            }
        }
    }

    /// Fetch the count and show it on the badge.
    ///
    /// On failure the badge keeps its current value.
    #[instrument(skip(self))]
    pub async fn refresh_count(&self) {
        match self.try_fetch_count().await {
            Ok(count) => self.inner.ui.set_count(count),
            Err(e) => warn!(error = %e, "Failed to refresh cart count"),
        }
    }

    /// Re-fetch items and count and re-render both.
    ///
    /// Whichever fetch fails leaves its part of the view untouched.
    #[instrument(skip(self))]
    pub async fn refresh_view(&self) {
        let (items, count) = tokio::join!(self.try_fetch_items(), self.try_fetch_count());

        match items {
            Ok(snapshot) => self.inner.ui.render_items(&snapshot),
            Err(e) => warn!(error = %e, "Failed to refresh cart items"),
        }

        match count {
            Ok(count) => self.inner.ui.set_count(count),
            Err(e) => warn!(error = %e, "Failed to refresh cart count"),
        }
    }

    /// Sum of line subtotals, or zero if the cart cannot be fetched.
    #[instrument(skip(self))]
    pub async fn cart_total(&self) -> Money {
        match self.try_fetch_items().await {
            Ok(snapshot) => snapshot.total(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart total");
                Money::ZERO
            }
        }
    }

    /// Lines for a compact cart preview.
    ///
    /// An empty cart shows an info toast and yields no lines.
    #[instrument(skip(self))]
    pub async fn mini_cart(&self) -> Vec<MiniCartLine> {
        let snapshot = match self.try_fetch_items().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to load mini cart");
                return Vec::new();
            }
        };

        if snapshot.is_empty() {
            self.inner
                .ui
                .notify(Notification::info(messages::EMPTY_CART));
            return Vec::new();
        }

        snapshot
            .items()
            .iter()
            .map(|item| MiniCartLine {
                label: format!("{} x {}", item.display_name(), item.quantity),
                subtotal: item.subtotal_formatted.clone(),
            })
            .collect()
    }

    /// Check the cart can go to checkout, notifying the first problem.
    #[instrument(skip(self))]
    pub async fn validate_for_checkout(&self) -> bool {
        let snapshot = match self.try_fetch_items().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to validate cart");
                self.inner
                    .ui
                    .notify(Notification::error(messages::VALIDATE_FAILED));
                return false;
            }
        };

        match snapshot.check_checkout() {
            Ok(()) => true,
            Err(issue) => {
                info!(issue = %issue, "Cart not ready for checkout");
                self.inner.ui.notify(Notification::error(issue.to_string()));
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Mark `control` in flight and disable it, unless it already is.
    fn acquire(&self, control: Control) -> Option<ControlGuard<'_, U>> {
        if !self.inner.in_flight().insert(control) {
            return None;
        }

        self.inner.ui.set_control_enabled(control, false);
        Some(ControlGuard {
            inner: &self.inner,
            control,
        })
    }

    /// Log a failed action and surface it to the user.
    fn fail(&self, err: &CartError, context: &str, generic: &str) -> Outcome {
        error!(error = %err, network = err.is_network(), "{context}");
        add_breadcrumb(context, &[("error", err.to_string())]);
        self.inner
            .ui
            .notify(Notification::error(err.user_message(generic)));
        Outcome::Failed
    }

    fn endpoint(&self, path: &str) -> Result<Url, CartError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ActionResponse, CartError> {
        let request = self.inner.http.post(self.endpoint(path)?).json(body);
        Self::send_action(request).await
    }

    async fn post_empty(&self, path: &str) -> Result<ActionResponse, CartError> {
        let request = self
            .inner
            .http
            .post(self.endpoint(path)?)
            .header(CONTENT_TYPE, "application/json");
        Self::send_action(request).await
    }

    /// Send a mutating request and decode the envelope.
    ///
    /// The body is read whatever the status: error responses carry their
    /// message in the same envelope.
    async fn send_action(request: reqwest::RequestBuilder) -> Result<ActionResponse, CartError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ActionResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(CartError::status(status.as_u16(), &body));
            }
            Err(e) => {
                error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse cart API response"
                );
                return Err(CartError::Decode(e));
            }
        };

        envelope.into_result()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CartError> {
        let response = self.inner.http.get(self.endpoint(path)?).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CartError::status(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
