//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: [`TestApi`] serves the `stock/{id}` and
//! `products/{id}` endpoints from memory on an ephemeral port, so the real
//! `HttpCatalogClient` and `FileStore` are exercised end to end.
//!
//! Set `RUST_LOG=rocketshoes_cart=debug` to see cart tracing output.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once, PoisonError, RwLock};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_core::{ProductId, StockRecord};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Default)]
struct ApiState {
    stock: RwLock<HashMap<ProductId, u32>>,
    products: RwLock<HashMap<ProductId, serde_json::Value>>,
    token: Option<String>,
    failing: AtomicBool,
    stock_hits: AtomicUsize,
    product_hits: AtomicUsize,
}

impl ApiState {
    /// Common checks for every endpoint. Returns a response to send instead
    /// of the resource, if any.
    fn reject(&self, headers: &HeaderMap) -> Option<Response> {
        if let Some(token) = &self.token {
            let expected = format!("Bearer {token}");
            let sent = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
            if sent != Some(expected.as_str()) {
                return Some(StatusCode::UNAUTHORIZED.into_response());
            }
        }
        if self.failing.load(Ordering::SeqCst) {
            return Some((StatusCode::INTERNAL_SERVER_ERROR, "catalog unavailable").into_response());
        }
        None
    }
}

/// Fake stock/products API bound to `127.0.0.1` on a random port.
///
/// The server task is aborted when the value is dropped.
pub struct TestApi {
    base_url: Url,
    state: Arc<ApiState>,
    task: JoinHandle<()>,
}

impl TestApi {
    /// Start a server that accepts any request.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        Self::start(ApiState::default()).await
    }

    /// Start a server that requires `Authorization: Bearer {token}`.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn spawn_with_token(token: &str) -> std::io::Result<Self> {
        Self::start(ApiState {
            token: Some(token.to_string()),
            ..ApiState::default()
        })
        .await
    }

    async fn start(state: ApiState) -> std::io::Result<Self> {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)?;

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            state,
            task,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Serve `product` at `products/{id}` and `stock` at `stock/{id}`.
    pub fn insert_product(&self, id: ProductId, product: serde_json::Value, stock: u32) {
        self.state
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, product);
        self.set_stock(id, stock);
    }

    pub fn set_stock(&self, id: ProductId, amount: u32) {
        self.state
            .stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, amount);
    }

    /// Make every endpoint answer 500.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn stock(State(state): State<Arc<ApiState>>, Path(id): Path<i32>, headers: HeaderMap) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(rejection) = state.reject(&headers) {
        return rejection;
    }

    let id = ProductId::new(id);
    let amount = state
        .stock
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();

    match amount {
        Some(amount) => Json(StockRecord::new(id, amount)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(State(state): State<Arc<ApiState>>, Path(id): Path<i32>, headers: HeaderMap) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(rejection) = state.reject(&headers) {
        return rejection;
    }

    let product = state
        .products
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&ProductId::new(id))
        .cloned();

    match product {
        Some(product) => Json(product).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Catalog JSON for a shoe, in the shape the products endpoint returns.
#[must_use]
pub fn shoe(id: i32, title: &str, price: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "price": price,
        "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
    })
}

/// Fresh directory path under the system temp dir. Not created.
#[must_use]
pub fn temp_storage_dir() -> PathBuf {
    std::env::temp_dir().join(format!("rocketshoes-it-{}", uuid::Uuid::new_v4()))
}

/// Install a test-writer tracing subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
