//! Request and response bodies of the cart API.

use serde::{Deserialize, Serialize};
use storefront_cart_core::{CartItemId, ProductId};

use crate::error::CartError;

pub const ADD_PATH: &str = "cart/add";
pub const UPDATE_PATH: &str = "cart/update";
pub const CLEAR_PATH: &str = "cart/clear";
pub const ITEMS_PATH: &str = "api/cart/items";
pub const COUNT_PATH: &str = "api/cart/count";

pub fn remove_path(item_id: CartItemId) -> String {
    format!("cart/remove/{item_id}")
}

/// Body of `POST /cart/add`.
#[derive(Debug, Serialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /cart/update`.
#[derive(Debug, Serialize)]
pub struct UpdateItemRequest {
    pub cart_item_id: CartItemId,
    pub quantity: u32,
}

/// Envelope returned by every mutating endpoint.
///
/// Error responses may omit `success` entirely (`{"error": "..."}` with a 4xx
/// status), so a missing flag reads as failure.
#[derive(Debug, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cart_count: Option<u32>,
}

impl ActionResponse {
    /// Turn a decoded envelope into a result on its `success` flag.
    pub fn into_result(self) -> Result<Self, CartError> {
        if self.success {
            Ok(self)
        } else {
            Err(CartError::application(self.error))
        }
    }
}

/// Body of `GET /api/cart/count`.
#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub count: u32,
}
