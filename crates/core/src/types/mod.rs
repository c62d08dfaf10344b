//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartEntry};
pub use id::ProductId;
pub use price::format_price;
pub use product::{Product, StockRecord};
