//! RocketShoes cart service.
//!
//! Holds the shopper's cart in memory, validates every quantity change
//! against the stock API, and rewrites a persisted JSON snapshot after each
//! successful change so the cart survives restarts.
//!
//! # Architecture
//!
//! - [`CartManager`] owns the cart and exposes add, remove and set-quantity
//! - [`catalog`] - stock and product lookups (`stock/{id}`, `products/{id}`)
//! - [`store`] - string key-value persistence for the snapshot
//! - [`notify`] - fire-and-forget failure notices for the UI
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartManager};
//! use rocketshoes_core::ProductId;
//!
//! let config = CartConfig::from_env()?;
//! let cart = CartManager::from_config(&config)?;
//!
//! cart.add_product(ProductId::new(1)).await?;
//! cart.update_product_amount(ProductId::new(1), 3).await?;
//! cart.remove_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod manager;
pub mod notify;
pub mod store;

pub use catalog::{CatalogError, HttpCatalogClient, InMemoryCatalog, ProductCatalog, StockOracle};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, CartResult, Operation, Outcome};
pub use manager::{CartDeps, CartManager, CartOptions};
pub use notify::{Locale, Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use store::{FileStore, MemoryStore, PersistenceStore, StoreError};
