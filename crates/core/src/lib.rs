//! Storefront Cart Core - Shared cart types.
//!
//! This crate provides the types exchanged between the storefront UI and the
//! server-side cart API. It is shared by:
//! - `client` - HTTP cart client that reconciles the UI with the server
//! - `cli` - Terminal frontend driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Checkout validation lives here because it only needs a snapshot.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money in minor units, cart items and snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
