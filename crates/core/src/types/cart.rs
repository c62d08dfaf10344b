//! Cart entries and the ordered cart they live in.
//!
//! A [`Cart`] serializes as a bare JSON array of [`CartEntry`] objects, each
//! being the catalog product with an `amount` field added. That array is the
//! persisted snapshot format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// One product's presence in the cart plus its requested quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub product: Product,
    /// Requested quantity, at least 1.
    pub amount: u32,
}

impl CartEntry {
    /// Entry for a product just added to the cart.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product, amount: 1 }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount, or `None` if the product has no readable price.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.product
            .price()
            .map(|price| price * Decimal::from(self.amount))
    }
}

/// Ordered sequence of cart entries, unique by product id.
///
/// Uniqueness is maintained by the code that mutates the cart; a cart read
/// back from a snapshot is taken as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartEntry>);

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartEntry> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the entry for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartEntry> {
        self.0.iter().find(|entry| entry.id() == id)
    }

    /// Index of the first entry for a product.
    #[must_use]
    pub fn position(&self, id: ProductId) -> Option<usize> {
        self.0.iter().position(|entry| entry.id() == id)
    }

    /// Append an entry at the end of the cart.
    pub fn push(&mut self, entry: CartEntry) {
        self.0.push(entry);
    }

    /// Remove the entry at `index`, returning it if the index was valid.
    pub fn remove_at(&mut self, index: usize) -> Option<CartEntry> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    /// Overwrite the amount of the entry at `index`.
    ///
    /// Returns `false` if the index was out of range.
    pub fn set_amount_at(&mut self, index: usize, amount: u32) -> bool {
        self.0
            .get_mut(index)
            .map(|entry| entry.amount = amount)
            .is_some()
    }

    /// Total number of units across all entries.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.0.iter().map(|entry| u64::from(entry.amount)).sum()
    }

    /// Sum of all line totals. Entries without a readable price count as zero.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.0.iter().filter_map(CartEntry::line_total).sum()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartEntry;
    type IntoIter = std::slice::Iter<'a, CartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<CartEntry>> for Cart {
    fn from(entries: Vec<CartEntry>) -> Self {
        Self(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry(id: i32, price: Decimal, amount: u32) -> CartEntry {
        CartEntry {
            product: Product::new(ProductId::new(id), format!("Shoe {id}"), price, format!("https://cdn/{id}.jpg")),
            amount,
        }
    }

    #[test]
    fn test_snapshot_format_is_flat_array() {
        let cart = Cart::from(vec![entry(1, Decimal::new(1799, 1), 2)]);
        let value = serde_json::to_value(&cart).unwrap();

        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["id"], 1);
        assert_eq!(first["amount"], 2);
        assert_eq!(first["title"], "Shoe 1");
    }

    #[test]
    fn test_snapshot_round_trip_preserves_order_and_extras() {
        let json = r#"[
            {"id":2,"title":"Tênis VR","price":"139.9","image":"https://cdn/2.jpg","amount":1,"priceFormatted":"R$ 139,90"},
            {"id":1,"title":"Tênis Nike","price":179.9,"image":"https://cdn/1.jpg","amount":3}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.entries()[0].id(), ProductId::new(2));
        assert_eq!(
            cart.entries()[0].product.fields.get("priceFormatted"),
            Some(&serde_json::json!("R$ 139,90"))
        );

        let reloaded: Cart = serde_json::from_str(&serde_json::to_string(&cart).unwrap()).unwrap();
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_lookup_and_positional_edits() {
        let mut cart = Cart::from(vec![entry(1, Decimal::ONE, 1), entry(2, Decimal::ONE, 1)]);

        assert_eq!(cart.position(ProductId::new(2)), Some(1));
        assert!(cart.get(ProductId::new(3)).is_none());

        assert!(cart.set_amount_at(1, 4));
        assert!(!cart.set_amount_at(5, 4));
        assert_eq!(cart.get(ProductId::new(2)).unwrap().amount, 4);

        assert!(cart.remove_at(7).is_none());
        let removed = cart.remove_at(0).unwrap();
        assert_eq!(removed.id(), ProductId::new(1));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_totals() {
        let cart = Cart::from(vec![
            entry(1, Decimal::new(1000, 2), 2),
            entry(2, Decimal::new(550, 2), 3),
        ]);

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.entries()[1].line_total(), Some(Decimal::new(1650, 2)));
        assert_eq!(cart.subtotal(), Decimal::new(3650, 2));
        assert_eq!(Cart::new().subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_subtotal_skips_unpriced_entries() {
        let json = r#"[
            {"id":1,"title":"Shoe 1","price":"R$ 179,90","amount":2},
            {"id":2,"title":"Shoe 2","price":10,"amount":3}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.entries()[0].line_total(), None);
        assert_eq!(cart.subtotal(), Decimal::new(30, 0));
    }
}
