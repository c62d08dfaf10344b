//! The cart manager.
//!
//! [`CartManager`] owns the shopper's cart. Each mutation is a single step:
//! validate against the stock API, then either write the new snapshot and
//! swap in the new cart, or leave everything untouched and fire a notice.
//!
//! # Concurrency
//!
//! By default an operation reads the cart when it starts, awaits its
//! lookups, and replaces the cart wholesale when it commits. Two operations
//! in flight at once can therefore both start from the same cart, and the
//! later commit wins (two quick increments of one item can land as a single
//! increment). The UI normally awaits each operation before issuing the next,
//! so this is left as-is.
//!
//! With [`CartOptions::serialize_mutations`] the manager holds a
//! single-writer lock for the whole operation, which closes that race at
//! the cost of queueing mutations behind slow lookups.
//!
//! No lock on the cart itself is ever held across an `.await`.

use std::sync::{Arc, PoisonError, RwLock};

use rocketshoes_core::{Cart, CartEntry, ProductId};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::catalog::{HttpCatalogClient, ProductCatalog, StockOracle};
use crate::config::{CartConfig, DEFAULT_STORAGE_KEY};
use crate::error::{CartError, CartResult, Operation, Outcome};
use crate::notify::{Locale, Notifier, TracingNotifier};
use crate::store::{FileStore, PersistenceStore};

/// External collaborators the cart talks to.
#[derive(Clone)]
pub struct CartDeps {
    pub stock: Arc<dyn StockOracle>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub store: Arc<dyn PersistenceStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl CartDeps {
    /// Use one service for both stock and product lookups.
    pub fn new<C>(catalog: Arc<C>, store: Arc<dyn PersistenceStore>, notifier: Arc<dyn Notifier>) -> Self
    where
        C: StockOracle + ProductCatalog + 'static,
    {
        let stock: Arc<dyn StockOracle> = catalog.clone();
        Self {
            stock,
            catalog,
            store,
            notifier,
        }
    }
}

/// Cart behavior settings.
#[derive(Debug, Clone)]
pub struct CartOptions {
    /// Key the snapshot is stored under
    pub storage_key: String,
    /// Language for failure notices
    pub locale: Locale,
    /// Run mutations one at a time
    pub serialize_mutations: bool,
}

impl Default for CartOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            locale: Locale::default(),
            serialize_mutations: false,
        }
    }
}

impl From<&CartConfig> for CartOptions {
    fn from(config: &CartConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            locale: config.locale,
            serialize_mutations: config.serialize_mutations,
        }
    }
}

/// Shopping cart with stock-validated mutations and a persisted snapshot.
///
/// This handle is cheaply cloneable via `Arc`; clones share one cart.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

/// Where the first phase of an add left off.
enum AddStep {
    /// A new entry was appended and committed.
    Appended(Outcome),
    /// The entry exists; raise it to `amount` starting from `base`.
    Increment { base: Cart, amount: i64 },
}

struct CartManagerInner {
    cart: RwLock<Cart>,
    deps: CartDeps,
    storage_key: String,
    locale: Locale,
    writer: Option<Mutex<()>>,
}

impl CartManager {
    /// Restore the cart from the store, or start empty if no snapshot exists.
    ///
    /// The snapshot is taken as-is: entries are not deduplicated or
    /// re-checked against current stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the snapshot is not
    /// a valid cart.
    pub fn load(deps: CartDeps, options: CartOptions) -> Result<Self, CartError> {
        let cart = match deps.store.get(&options.storage_key)? {
            Some(raw) => serde_json::from_str::<Cart>(&raw)?,
            None => Cart::new(),
        };

        info!(
            key = %options.storage_key,
            entries = cart.len(),
            serialized = options.serialize_mutations,
            "Cart loaded"
        );

        Ok(Self {
            inner: Arc::new(CartManagerInner {
                cart: RwLock::new(cart),
                deps,
                storage_key: options.storage_key,
                locale: options.locale,
                writer: options.serialize_mutations.then(|| Mutex::new(())),
            }),
        })
    }

    /// Wire up the HTTP catalog, file store and log notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the stored
    /// snapshot cannot be loaded.
    pub fn from_config(config: &CartConfig) -> Result<Self, CartError> {
        let catalog = Arc::new(HttpCatalogClient::new(config)?);
        let store = Arc::new(FileStore::new(config.storage_dir.clone()));
        let deps = CartDeps::new(catalog, store, Arc::new(TracingNotifier));

        Self::load(deps, CartOptions::from(config))
    }

    /// Current cart contents.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner
            .cart
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart has its amount raised by one if stock
    /// allows; otherwise its metadata is fetched and it is appended with an
    /// amount of 1.
    ///
    /// # Errors
    ///
    /// `OutOfStock` if no more units are available, `Lookup` if stock or
    /// product metadata cannot be fetched, `Persistence`/`Snapshot` if the
    /// snapshot cannot be written. The cart is unchanged in every case.
    /// Failures while raising an existing entry fire the quantity-update
    /// notice rather than the add notice.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> CartResult {
        let _writer = self.lock_writer().await;
        match self.try_add(product_id).await {
            // The increment runs as a quantity update and reports as one.
            Ok(AddStep::Increment { base, amount }) => {
                let result = self.try_update(base, product_id, amount).await;
                self.finish(Operation::UpdateAmount, result)
            }
            Ok(AddStep::Appended(outcome)) => Ok(outcome),
            Err(err) => self.finish(Operation::Add, Err(err)),
        }
    }

    /// Remove a product's entry from the cart.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product is not in the cart, `Persistence`/`Snapshot`
    /// if the snapshot cannot be written. The cart is unchanged in every case.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> CartResult {
        let _writer = self.lock_writer().await;
        let result = self.try_remove(product_id);
        self.finish(Operation::Remove, result)
    }

    /// Set the amount of a product already in the cart.
    ///
    /// Amounts of zero or below do nothing, silently. So does a product that
    /// is not in the cart.
    ///
    /// # Errors
    ///
    /// `OutOfStock` if `amount` exceeds available stock, `Lookup` if stock
    /// cannot be fetched, `Persistence`/`Snapshot` if the snapshot cannot be
    /// written. The cart is unchanged in every case.
    #[instrument(skip(self))]
    pub async fn update_product_amount(&self, product_id: ProductId, amount: i64) -> CartResult {
        let _writer = self.lock_writer().await;
        let base = self.cart();
        let result = self.try_update(base, product_id, amount).await;
        self.finish(Operation::UpdateAmount, result)
    }

    /// Empty the cart and persist the empty snapshot.
    ///
    /// Fires no notice on failure.
    ///
    /// # Errors
    ///
    /// `Persistence`/`Snapshot` if the snapshot cannot be written.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> CartResult {
        let _writer = self.lock_writer().await;
        self.commit(Cart::new())
    }

    async fn try_add(&self, product_id: ProductId) -> Result<AddStep, CartError> {
        let base = self.cart();
        let stock = self.inner.deps.stock.stock(product_id).await?;

        if let Some(current) = base.get(product_id).map(|entry| entry.amount) {
            let requested = i64::from(current) + 1;
            if current >= stock.amount {
                return Err(CartError::OutOfStock {
                    product_id,
                    requested,
                    available: stock.amount,
                });
            }
            return Ok(AddStep::Increment {
                base,
                amount: requested,
            });
        }

        if stock.amount == 0 {
            return Err(CartError::OutOfStock {
                product_id,
                requested: 1,
                available: 0,
            });
        }

        let product = self.inner.deps.catalog.product(product_id).await?;
        let mut next = base;
        next.push(CartEntry::new(product));
        self.commit(next).map(AddStep::Appended)
    }

    fn try_remove(&self, product_id: ProductId) -> CartResult {
        let mut next = self.cart();
        let index = next
            .position(product_id)
            .ok_or(CartError::NotFound(product_id))?;
        next.remove_at(index);
        self.commit(next)
    }

    async fn try_update(&self, base: Cart, product_id: ProductId, amount: i64) -> CartResult {
        if amount <= 0 {
            return Ok(Outcome::Unchanged);
        }

        let stock = self.inner.deps.stock.stock(product_id).await?;

        let Some(index) = base.position(product_id) else {
            debug!("Product not in cart, nothing to update");
            return Ok(Outcome::Unchanged);
        };

        let Some(new_amount) = u32::try_from(amount)
            .ok()
            .filter(|requested| *requested <= stock.amount)
        else {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        };

        let mut next = base;
        next.set_amount_at(index, new_amount);
        self.commit(next)
    }

    /// Write the snapshot, then swap in the new cart.
    fn commit(&self, next: Cart) -> CartResult {
        let snapshot = serde_json::to_string(&next)?;
        self.inner.deps.store.set(&self.inner.storage_key, &snapshot)?;

        *self
            .inner
            .cart
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next.clone();

        debug!(entries = next.len(), items = next.item_count(), "Cart committed");
        Ok(Outcome::Changed(next))
    }

    /// Fire the notice for a failed operation.
    fn finish(&self, operation: Operation, result: CartResult) -> CartResult {
        if let Err(err) = &result {
            match err {
                CartError::OutOfStock { .. } => info!(?operation, error = %err, "Out of stock"),
                _ => warn!(?operation, error = %err, "Cart operation failed"),
            }
            let notice = err.notice(operation);
            self.inner.deps.notifier.error(notice.message(self.inner.locale));
        }
        result
    }

    async fn lock_writer(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.inner.writer {
            Some(writer) => Some(writer.lock().await),
            None => None,
        }
    }
}
