//! In-process catalog for offline use and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, StockRecord};

use super::{CatalogError, ProductCatalog, StockOracle};

/// Catalog held in memory.
///
/// Lookups can be given an artificial latency so callers see the same
/// suspension points a network client would produce, and can be switched
/// to fail wholesale.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    stock: RwLock<HashMap<ProductId, u32>>,
    products: RwLock<HashMap<ProductId, Product>>,
    latency: Option<Duration>,
    unavailable: AtomicBool,
    stock_lookups: AtomicUsize,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every lookup by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register a product with its available stock.
    pub fn insert(&self, product: Product, stock: u32) {
        let id = product.id;
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, product);
        self.set_stock(id, stock);
    }

    /// Overwrite the available stock for a product.
    pub fn set_stock(&self, id: ProductId, amount: u32) {
        self.stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, amount);
    }

    /// Make every lookup fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stock lookups served or attempted.
    #[must_use]
    pub fn stock_lookups(&self) -> usize {
        self.stock_lookups.load(Ordering::SeqCst)
    }

    async fn simulate_network(&self, path: &str) -> Result<(), CatalogError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Api {
                status: 503,
                message: format!("{path} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StockOracle for InMemoryCatalog {
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        self.stock_lookups.fetch_add(1, Ordering::SeqCst);
        let path = format!("stock/{id}");
        self.simulate_network(&path).await?;

        self.stock
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|amount| StockRecord::new(id, *amount))
            .ok_or(CatalogError::NotFound(path))
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let path = format!("products/{id}");
        self.simulate_network(&path).await?;

        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(path))
    }
}
