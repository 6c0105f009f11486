//! Storefront Cart Client - keeps the UI in step with the server cart.
//!
//! Every cart mutation and read goes through [`CartClient`], which issues the
//! HTTP request and translates the result into UI feedback through the
//! [`CartUi`] seam: badge updates, toasts, confirmation prompts, row removal
//! and list re-rendering.
//!
//! # Architecture
//!
//! - The server owns the canonical cart; the client never caches a snapshot
//!   across actions and re-fetches after every successful mutation
//! - Errors never escape an operation; they become error notifications
//! - A control with a request in flight is disabled, and a second request for
//!   it is refused until the first completes
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_cart_client::{CartClient, CartClientConfig};
//! use storefront_cart_core::ProductId;
//!
//! let config = CartClientConfig::from_env()?;
//! let client = CartClient::new(&config, ui)?;
//!
//! client.add_item(ProductId::new(42), 1).await;
//! if client.validate_for_checkout().await {
//!     // proceed to checkout
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod api;
mod client;
pub mod config;
pub mod error;
pub mod ui;

pub use client::{CartClient, MiniCartLine, Outcome, messages};
pub use config::{CartClientConfig, ConfigError};
pub use error::CartError;
pub use ui::{CartUi, Control, Notification, NotificationKind};
