//! End-to-end cart tests against the fake catalog API.
//!
//! These drive the real HTTP client and file-backed snapshot store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocketshoes_cart::{
    CartConfig, CartDeps, CartError, CartManager, CartOptions, CatalogError, FileStore,
    HttpCatalogClient, PersistenceStore, RecordingNotifier,
};
use rocketshoes_core::{Cart, ProductId};
use rocketshoes_integration_tests::{TestApi, init_tracing, shoe, temp_storage_dir};
use secrecy::SecretString;

const KEY: &str = "@RocketShoes:cart";

struct Session {
    api: TestApi,
    dir: PathBuf,
    manager: CartManager,
    notifier: Arc<RecordingNotifier>,
}

impl Session {
    async fn start() -> Self {
        init_tracing();
        let api = TestApi::spawn().await.unwrap();
        api.insert_product(ProductId::new(1), shoe(1, "Tênis de Caminhada Leve Confortável", 179.9), 3);
        api.insert_product(ProductId::new(2), shoe(2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9), 5);

        let dir = temp_storage_dir();
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = open(&api, &dir, notifier.clone());

        Self {
            api,
            dir,
            manager,
            notifier,
        }
    }

    fn snapshot_on_disk(&self) -> Cart {
        let raw = FileStore::new(&self.dir).get(KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn open(api: &TestApi, dir: &Path, notifier: Arc<RecordingNotifier>) -> CartManager {
    let catalog = Arc::new(HttpCatalogClient::builder(api.base_url()).build().unwrap());
    let store = Arc::new(FileStore::new(dir));
    CartManager::load(CartDeps::new(catalog, store, notifier), CartOptions::default()).unwrap()
}

fn amounts(manager: &CartManager) -> Vec<(i32, u32)> {
    manager
        .cart()
        .iter()
        .map(|entry| (entry.id().as_i32(), entry.amount))
        .collect()
}

#[tokio::test]
async fn test_add_increment_and_ceiling_over_http() {
    let s = Session::start().await;
    let id = ProductId::new(1);

    s.manager.add_product(id).await.unwrap();
    s.manager.add_product(id).await.unwrap();
    s.manager.add_product(ProductId::new(2)).await.unwrap();
    assert_eq!(amounts(&s.manager), vec![(1, 2), (2, 1)]);

    s.manager.update_product_amount(id, 3).await.unwrap();
    let err = s.manager.add_product(id).await.unwrap_err();

    assert!(matches!(err, CartError::OutOfStock { available: 3, .. }));
    assert_eq!(amounts(&s.manager), vec![(1, 3), (2, 1)]);
    assert_eq!(s.notifier.messages(), vec!["requested quantity exceeds stock"]);
    assert_eq!(s.snapshot_on_disk(), s.manager.cart());
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let s = Session::start().await;
    s.manager.add_product(ProductId::new(2)).await.unwrap();
    s.manager.add_product(ProductId::new(1)).await.unwrap();
    s.manager.update_product_amount(ProductId::new(2), 4).await.unwrap();

    let reopened = open(&s.api, &s.dir, Arc::new(RecordingNotifier::new()));

    assert_eq!(reopened.cart(), s.manager.cart());
    assert_eq!(amounts(&reopened), vec![(2, 4), (1, 1)]);
}

#[tokio::test]
async fn test_remove_rewrites_snapshot() {
    let s = Session::start().await;
    s.manager.add_product(ProductId::new(1)).await.unwrap();
    s.manager.add_product(ProductId::new(2)).await.unwrap();

    s.manager.remove_product(ProductId::new(1)).await.unwrap();
    assert_eq!(amounts(&s.manager), vec![(2, 1)]);
    assert_eq!(s.snapshot_on_disk(), s.manager.cart());

    assert!(s.manager.remove_product(ProductId::new(1)).await.is_err());
    assert_eq!(s.notifier.messages(), vec!["failed to remove product"]);
}

#[tokio::test]
async fn test_product_metadata_is_cached_but_stock_is_not() {
    let s = Session::start().await;
    let id = ProductId::new(1);

    s.manager.add_product(id).await.unwrap();
    s.manager.remove_product(id).await.unwrap();
    s.manager.add_product(id).await.unwrap();

    assert_eq!(s.api.product_hits(), 1);
    assert_eq!(s.api.stock_hits(), 2);
}

#[tokio::test]
async fn test_stock_drop_is_enforced_on_next_change() {
    let s = Session::start().await;
    let id = ProductId::new(2);
    s.manager.add_product(id).await.unwrap();
    s.manager.update_product_amount(id, 5).await.unwrap();

    s.api.set_stock(id, 2);

    // Existing amount is not re-validated until it is touched
    assert_eq!(amounts(&s.manager), vec![(2, 5)]);
    assert!(s.manager.update_product_amount(id, 3).await.is_err());
    s.manager.update_product_amount(id, 2).await.unwrap();
    assert_eq!(amounts(&s.manager), vec![(2, 2)]);
}

#[tokio::test]
async fn test_server_error_is_reported_as_add_failure() {
    let s = Session::start().await;
    s.api.set_failing(true);

    let err = s.manager.add_product(ProductId::new(1)).await.unwrap_err();

    assert!(matches!(err, CartError::Lookup(CatalogError::Api { status: 500, .. })));
    assert!(s.manager.cart().is_empty());
    assert!(FileStore::new(&s.dir).get(KEY).unwrap().is_none());
    assert_eq!(s.notifier.messages(), vec!["failed to add product"]);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let s = Session::start().await;

    let err = s.manager.add_product(ProductId::new(42)).await.unwrap_err();

    assert!(matches!(err, CartError::Lookup(CatalogError::NotFound(ref path)) if path == "stock/42"));
    assert_eq!(s.notifier.messages(), vec!["failed to add product"]);
}

#[tokio::test]
async fn test_extra_catalog_fields_are_persisted() {
    let s = Session::start().await;
    let mut product = shoe(3, "Tênis Adidas Duramo Lite 2.0", 219.9);
    product["brand"] = serde_json::json!("Adidas");
    s.api.insert_product(ProductId::new(3), product, 2);

    s.manager.add_product(ProductId::new(3)).await.unwrap();

    let raw = FileStore::new(&s.dir).get(KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["brand"], "Adidas");
    assert_eq!(value[0]["amount"], 1);
}

#[tokio::test]
async fn test_catalog_display_fields_are_stored_verbatim() {
    let s = Session::start().await;
    s.api.insert_product(
        ProductId::new(4),
        serde_json::json!({"id": 4, "title": "Tênis sem foto", "price": "R$ 99,90"}),
        2,
    );

    s.manager.add_product(ProductId::new(1)).await.unwrap();
    s.manager.add_product(ProductId::new(4)).await.unwrap();

    let raw = FileStore::new(&s.dir).get(KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value[0]["price"].is_number());
    assert_eq!(value[0]["price"], serde_json::json!(179.9));
    assert_eq!(value[1]["price"], "R$ 99,90");
    assert!(value[1].get("image").is_none());
    assert!(s.notifier.is_empty());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    init_tracing();
    let api = TestApi::spawn_with_token("tok_test_51f0").await.unwrap();
    api.insert_product(ProductId::new(1), shoe(1, "Tênis de Caminhada Leve Confortável", 179.9), 3);

    let without = HttpCatalogClient::builder(api.base_url()).build().unwrap();
    let with = HttpCatalogClient::builder(api.base_url())
        .token(Some(SecretString::from("tok_test_51f0".to_string())))
        .build()
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(rocketshoes_cart::MemoryStore::new());

    let rejected = CartManager::load(
        CartDeps::new(Arc::new(without), store.clone(), notifier.clone()),
        CartOptions::default(),
    )
    .unwrap();
    let err = rejected.add_product(ProductId::new(1)).await.unwrap_err();
    assert!(matches!(err, CartError::Lookup(CatalogError::Api { status: 401, .. })));

    let accepted =
        CartManager::load(CartDeps::new(Arc::new(with), store, notifier), CartOptions::default()).unwrap();
    accepted.add_product(ProductId::new(1)).await.unwrap();
    assert_eq!(amounts(&accepted), vec![(1, 1)]);
}

#[tokio::test]
async fn test_from_config_wires_http_and_file_store() {
    init_tracing();
    let api = TestApi::spawn().await.unwrap();
    api.insert_product(ProductId::new(1), shoe(1, "Tênis de Caminhada Leve Confortável", 179.9), 3);
    let dir = temp_storage_dir();

    let base_url = api.base_url().to_string();
    let storage_dir = dir.display().to_string();
    let config = CartConfig::from_vars(|key| match key {
        "CART_API_URL" => Some(base_url.clone()),
        "CART_STORAGE_DIR" => Some(storage_dir.clone()),
        "CART_SERIALIZE_MUTATIONS" => Some("true".to_string()),
        _ => None,
    })
    .unwrap();

    let manager = CartManager::from_config(&config).unwrap();
    manager.add_product(ProductId::new(1)).await.unwrap();

    let restored = CartManager::from_config(&config).unwrap();
    assert_eq!(restored.cart(), manager.cart());

    let _ = std::fs::remove_dir_all(dir);
}
