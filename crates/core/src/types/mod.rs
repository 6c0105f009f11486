//! Core types for the storefront cart.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod cart;
pub mod id;
pub mod price;

pub use cart::{CartItem, CartSnapshot, CheckoutIssue, ProductRef};
pub use id::*;
pub use price::{Money, PriceParseError};
