//! Cart operation results and errors.
//!
//! Every cart operation returns [`CartResult`]. A failed operation has
//! already left the cart untouched and fired its notice by the time the
//! error reaches the caller, so callers that only care about the cart can
//! ignore the error entirely.

use rocketshoes_core::{Cart, ProductId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::notify::Notice;
use crate::store::StoreError;

/// Cart mutations, used to pick the failure notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
    UpdateAmount,
}

impl Operation {
    /// Generic failure notice for this operation.
    #[must_use]
    pub const fn failure_notice(self) -> Notice {
        match self {
            Self::Add => Notice::AddFailed,
            Self::Remove => Notice::RemoveFailed,
            Self::UpdateAmount => Notice::UpdateFailed,
        }
    }
}

/// Why a cart operation did not change the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested amount is above available stock.
    #[error("Product {product_id}: requested {requested}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    /// Stock or product lookup failed.
    #[error("Lookup failed: {0}")]
    Lookup(#[from] CatalogError),

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotFound(ProductId),

    /// Snapshot could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl CartError {
    /// Notice shown to the shopper when `operation` fails with this error.
    ///
    /// Out-of-stock has its own notice; everything else gets the
    /// operation's generic failure notice.
    #[must_use]
    pub const fn notice(&self, operation: Operation) -> Notice {
        match self {
            Self::OutOfStock { .. } => Notice::OutOfStock,
            _ => operation.failure_notice(),
        }
    }
}

/// What a successful operation did to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The cart was replaced; holds the new cart.
    Changed(Cart),
    /// Nothing to do (e.g., a non-positive quantity).
    Unchanged,
}

impl Outcome {
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Result type for cart operations.
pub type CartResult = Result<Outcome, CartError>;
