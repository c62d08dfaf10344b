//! RocketShoes Core - Shared cart and catalog types.
//!
//! This crate provides the types shared by the cart service and anything that
//! renders or inspects a cart:
//! - `rocketshoes-cart` - Cart manager, stock lookups, snapshot persistence
//! - `rocketshoes-integration-tests` - HTTP-backed end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product identity, stock records, cart entries and price display

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
