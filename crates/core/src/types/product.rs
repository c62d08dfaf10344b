//! Catalog product metadata and stock records.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::id::ProductId;

/// Product display metadata as returned by the catalog (`products/{id}`).
///
/// Only `id` is interpreted. Every other field (`title`, `price`, `image`
/// and anything else the catalog sends) is kept in `fields` exactly as it
/// arrived and written back out unchanged, so the persisted cart carries
/// whatever the UI was given. The accessors below read those fields lazily
/// and return `None` when one is missing or has an unexpected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Product {
    /// Create a product with the usual display fields.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Decimal, image: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::String(title.into()));
        fields.insert("price".to_string(), decimal_to_json(price));
        fields.insert("image".to_string(), Value::String(image.into()));
        Self { id, fields }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.fields.get("image").and_then(Value::as_str)
    }

    /// Unit price, if the catalog sent a number or a plain numeric string.
    ///
    /// Localized strings such as `"R$ 179,90"` yield `None`.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        match self.fields.get("price")? {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s.trim()),
            _ => None,
        }
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn decimal_to_json(price: Decimal) -> Value {
    let raw = price.normalize().to_string();
    raw.parse::<Number>()
        .map_or(Value::String(raw), Value::Number)
}

/// Units of a product available for purchase (`stock/{id}`).
///
/// `amount` is the ceiling for the quantity of that product in any cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    pub amount: u32,
}

impl StockRecord {
    #[must_use]
    pub const fn new(id: ProductId, amount: u32) -> Self {
        Self { id, amount }
    }
}
