//! Stock and product lookups.
//!
//! # Endpoints
//!
//! Both lookups live on the same JSON API:
//! - `stock/{id}` - `{ "id": 1, "amount": 3 }`
//! - `products/{id}` - `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`
//!
//! Stock is always fetched fresh because it is the ceiling every quantity
//! change is validated against. Product metadata is cached by
//! [`HttpCatalogClient`] for a configurable TTL.

mod http;
mod memory;

pub use http::{HttpCatalogClient, HttpCatalogClientBuilder};
pub use memory::InMemoryCatalog;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, StockRecord};
use thiserror::Error;

/// Errors that can occur when looking up stock or products.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to build a request URL or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of truth for how many units of a product are available.
#[async_trait]
pub trait StockOracle: Send + Sync {
    /// Look up the stock record for a product.
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError>;
}

/// Source of product display metadata.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up a product's display metadata.
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError>;
}
