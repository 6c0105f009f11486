//! Integration test support for the storefront cart client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```
//!
//! No external services are needed: every test starts its own
//! [`CartServer`] on an ephemeral port.
//!
//! # Pieces
//!
//! - [`CartServer`] - In-memory cart API with per-session carts, stock checks,
//!   a request log, canned responses and an artificial delay
//! - [`RecordingUi`] - A [`storefront_cart_client::CartUi`] that records every
//!   call and answers confirmations from a script

#![cfg_attr(not(test), forbid(unsafe_code))]

mod server;
mod ui;

pub use server::{Canned, CartServer, CatalogProduct, Route, unreachable_base_url};
pub use ui::{RecordingUi, UiEvent};

use storefront_cart_client::{CartClient, CartClientConfig};

/// Build a client with no UI delays pointed at `base_url`.
///
/// # Panics
///
/// Panics if the URL is invalid or the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client_for(base_url: &str, ui: RecordingUi) -> CartClient<RecordingUi> {
    let config = CartClientConfig::immediate(base_url).expect("valid base URL");
    CartClient::new(&config, ui).expect("Failed to create cart client")
}
