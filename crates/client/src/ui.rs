//! The seam between the cart client and whatever renders the cart.
//!
//! A browser frontend maps these calls onto the DOM; the terminal frontend
//! prints them; tests record them.

use core::fmt;
use std::future::Future;

use storefront_cart_core::{CartItemId, CartSnapshot, ProductId};

/// One invoking UI element.
///
/// At most one mutating request per control is in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Every "add to cart" button for a product.
    AddToCart(ProductId),
    /// The quantity input of a cart row.
    Quantity(CartItemId),
    /// The remove button of a cart row.
    Remove(CartItemId),
    /// The "clear cart" button.
    ClearCart,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddToCart(id) => write!(f, "add-to-cart:{id}"),
            Self::Quantity(id) => write!(f, "quantity:{id}"),
            Self::Remove(id) => write!(f, "remove:{id}"),
            Self::ClearCart => f.write_str("clear-cart"),
        }
    }
}

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

/// Everything the cart client needs from the user interface.
///
/// Implementations must tolerate calls arriving in any order across controls:
/// two requests for different controls may complete interleaved, and a
/// refresh may land after another refresh.
pub trait CartUi: Send + Sync {
    /// Disable or re-enable an invoking control.
    fn set_control_enabled(&self, control: Control, enabled: bool);

    /// Show a toast.
    fn notify(&self, notification: Notification);

    /// Ask a yes/no question before a destructive action.
    ///
    /// Returning `false` guarantees the client sends nothing.
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send;

    /// Update the item-count badge to a server-reported count.
    fn set_count(&self, count: u32);

    /// Start the exit transition of a removed row.
    fn remove_row(&self, item_id: CartItemId);

    /// Re-render the item list from a fresh snapshot.
    fn render_items(&self, snapshot: &CartSnapshot);
}
