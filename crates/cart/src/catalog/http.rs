//! HTTP client for the stock and product API.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{Product, ProductId, StockRecord};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{CatalogError, ProductCatalog, StockOracle};
use crate::config::CartConfig;

/// Upper bound on cached product entries.
const PRODUCT_CACHE_CAPACITY: u64 = 1_000;

/// Client for the RocketShoes catalog API.
///
/// Implements both [`StockOracle`] and [`ProductCatalog`]. Cheap to clone;
/// clones share the connection pool and the product cache.
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<ProductId, Product>,
}

impl std::fmt::Debug for HttpCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("cached_products", &self.products.entry_count())
            .finish_non_exhaustive()
    }
}

impl HttpCatalogClient {
    /// Create a client from cart configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the API token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &CartConfig) -> Result<Self, CatalogError> {
        Self::builder(config.api_url.clone())
            .timeout(config.request_timeout)
            .product_cache_ttl(config.product_cache_ttl)
            .token(config.api_token.clone())
            .build()
    }

    /// Start building a client for the API at `base_url`.
    #[must_use]
    pub const fn builder(base_url: Url) -> HttpCatalogClientBuilder {
        HttpCatalogClientBuilder {
            base_url,
            timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(300),
            token: None,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET `path` relative to the base URL and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| CatalogError::Parse(format!("Invalid path {path}: {e}")))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StockOracle for HttpCatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        let stock: StockRecord = self.get_json(&format!("stock/{id}")).await?;
        tracing::debug!(available = stock.amount, "Fetched stock");
        Ok(stock)
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.products.get(&id).await {
            tracing::debug!("Product cache hit");
            return Ok(product);
        }

        let product: Product = self.get_json(&format!("products/{id}")).await?;
        self.products.insert(id, product.clone()).await;
        Ok(product)
    }
}

/// Builder for [`HttpCatalogClient`].
pub struct HttpCatalogClientBuilder {
    base_url: Url,
    timeout: Duration,
    product_cache_ttl: Duration,
    token: Option<SecretString>,
}

impl HttpCatalogClientBuilder {
    /// Per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long product metadata stays cached.
    #[must_use]
    pub fn product_cache_ttl(mut self, ttl: Duration) -> Self {
        self.product_cache_ttl = ttl;
        self
    }

    /// Bearer token sent with every request.
    #[must_use]
    pub fn token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn build(self) -> Result<HttpCatalogClient, CatalogError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| CatalogError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(self.product_cache_ttl)
            .build();

        Ok(HttpCatalogClient {
            client,
            base_url: with_trailing_slash(self.base_url),
            products,
        })
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
