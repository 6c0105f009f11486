//! Cart items, snapshots, and checkout validation.
//!
//! These mirror the JSON the cart API returns from `/api/cart/items`. A
//! [`CartSnapshot`] is a transient copy of the server's cart: it is fetched,
//! rendered or validated, and then dropped.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId};
use super::price::Money;

/// The product a cart line refers to, as embedded by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub in_stock: bool,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_formatted: Option<String>,
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// `None` when the product was deleted after being added.
    pub product: Option<ProductRef>,
    pub quantity: u32,
    pub subtotal: Money,
    pub subtotal_formatted: String,
}

impl CartItem {
    /// Display name of the product, falling back to the product ID.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.product
            .as_ref()
            .map_or_else(|| format!("Product #{}", self.product_id), |p| p.name.clone())
    }
}

/// Why a cart cannot proceed to checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutIssue {
    /// The cart has no items.
    Empty,
    /// A product in the cart is no longer in stock.
    OutOfStock { name: String },
    /// More units are requested than the product has in stock.
    InsufficientStock { name: String, stock: u32 },
}

impl fmt::Display for CheckoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Your cart is empty"),
            Self::OutOfStock { name } => write!(f, "{name} is out of stock"),
            Self::InsufficientStock { name, stock } => {
                write!(f, "Only {stock} {name} available")
            }
        }
    }
}

/// The full list of cart items as reported by the server at one point in time.
///
/// Order is whatever the server returned, normally insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

impl CartSnapshot {
    /// Create a snapshot from server-ordered items.
    #[must_use]
    pub const fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// An empty snapshot.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items.iter().map(|item| item.subtotal).sum()
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn get(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Check whether the cart can proceed to checkout.
    ///
    /// Returns the first issue found, scanning items in server order. Lines
    /// whose product is missing are skipped.
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutIssue`] that blocks checkout.
    pub fn check_checkout(&self) -> Result<(), CheckoutIssue> {
        if self.items.is_empty() {
            return Err(CheckoutIssue::Empty);
        }

        for item in &self.items {
            let Some(product) = &item.product else {
                continue;
            };

            if !product.in_stock {
                return Err(CheckoutIssue::OutOfStock {
                    name: product.name.clone(),
                });
            }

            if item.quantity > product.stock {
                return Err(CheckoutIssue::InsufficientStock {
                    name: product.name.clone(),
                    stock: product.stock,
                });
            }
        }

        Ok(())
    }
}

impl From<Vec<CartItem>> for CartSnapshot {
    fn from(items: Vec<CartItem>) -> Self {
        Self::new(items)
    }
}

impl<'a> IntoIterator for &'a CartSnapshot {
    type Item = &'a CartItem;
    type IntoIter = core::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
