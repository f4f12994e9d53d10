//! Shopping cart held in the visitor's session.
//!
//! The cart is a plain list with one entry per product id. Prices are copied
//! from the catalog when the item is added; the backend re-prices the order
//! at checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::types::{ContentId, Price};

/// A product and chosen quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ContentId,
    pub title: String,
    /// Display price as shown in the catalog.
    pub price: String,
    pub price_numeric: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub btu_capacity: Option<String>,
}

impl CartItem {
    /// Build a cart line from a catalog product.
    ///
    /// Returns `None` for products without a usable price, which cannot be
    /// sold online.
    #[must_use]
    pub fn from_product(product: &Content, quantity: u32) -> Option<Self> {
        let price_numeric = product.price_value()?;
        Some(Self {
            product_id: product.id,
            title: product.title.clone(),
            price: product
                .price_display()
                .unwrap_or_else(|| Price::cop(price_numeric).display()),
            price_numeric,
            quantity,
            image_url: product.image_url.clone(),
            category: product.category(),
            btu_capacity: product.btu_capacity(),
        })
    }

    /// `price_numeric × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price_numeric * Decimal::from(self.quantity)
    }

    /// Formatted line total.
    #[must_use]
    pub fn line_total_display(&self) -> String {
        Price::cop(self.line_total()).display()
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ContentId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Add an item. If the product is already in the cart its quantity is
    /// increased by `item.quantity`; otherwise the item is appended.
    ///
    /// Adding a quantity of zero does nothing.
    pub fn add(&mut self, item: CartItem) {
        self.add_up_to(item, u32::MAX);
    }

    /// Like [`Cart::add`], but the line never ends up above `max`.
    pub fn add_up_to(&mut self, item: CartItem, max: u32) {
        if item.quantity == 0 || max == 0 {
            return;
        }
        match self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity).min(max);
            }
            None => self.items.push(CartItem {
                quantity: item.quantity.min(max),
                ..item
            }),
        }
    }

    /// Remove a product. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ContentId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Set a product's quantity. Zero or negative quantities remove the line.
    ///
    /// Returns whether the product was in the cart.
    pub fn update_quantity(&mut self, product_id: ContentId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(existing) => {
                existing.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Sum of `price_numeric × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Formatted total.
    #[must_use]
    pub fn total_display(&self) -> String {
        Price::cop(self.total()).display()
    }

    /// Number of units across all lines (badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ContentId::new(id),
            title: format!("Producto {id}"),
            price: Price::cop(Decimal::from(price)).display(),
            price_numeric: Decimal::from(price),
            quantity,
            image_url: None,
            category: None,
            btu_capacity: None,
        }
    }

    #[test]
    fn test_add_same_product_increments_instead_of_duplicating() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, 1));
        cart.add(item(1, 100, 2));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(ContentId::new(1)).unwrap().quantity, 3);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_up_to_caps_merged_line() {
        let mut cart = Cart::new();
        cart.add_up_to(item(1, 100, 99), 99);
        cart.add_up_to(item(1, 100, 99), 99);
        assert_eq!(cart.get(ContentId::new(1)).unwrap().quantity, 99);

        cart.add_up_to(item(2, 100, 150), 99);
        assert_eq!(cart.get(ContentId::new(2)).unwrap().quantity, 99);
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, 1));
        cart.add(item(2, 50, 1));
        assert!(cart.update_quantity(ContentId::new(1), 0));
        assert!(cart.get(ContentId::new(1)).is_none());
        assert_eq!(cart.items().len(), 1);

        assert!(cart.update_quantity(ContentId::new(2), -3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, 1));
        assert!(cart.update_quantity(ContentId::new(1), 5));
        assert_eq!(cart.get(ContentId::new(1)).unwrap().quantity, 5);
        assert!(!cart.update_quantity(ContentId::new(99), 5));
    }

    #[test]
    fn test_total_is_sum_of_price_times_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, 1_200_000, 2));
        cart.add(item(2, 85_000, 3));
        assert_eq!(cart.total(), Decimal::from(2_655_000));
        assert_eq!(cart.total_display(), "$2.655.000");
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_remove_filters_out_product() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, 1));
        assert!(cart.remove(ContentId::new(1)));
        assert!(!cart.remove(ContentId::new(1)));
    }

    #[test]
    fn test_from_product_requires_price() {
        let priced: Content = serde_json::from_value(json!({
            "id": 4, "type": "product", "title": "Split 18k",
            "priceNumeric": 2_400_000,
            "data": {"category": "Split", "btuCapacity": "18000"}
        }))
        .unwrap();
        let line = CartItem::from_product(&priced, 1).unwrap();
        assert_eq!(line.price, "$2.400.000");
        assert_eq!(line.btu_capacity.as_deref(), Some("18000"));

        let unpriced: Content =
            serde_json::from_value(json!({"id": 5, "type": "product", "title": "A cotizar"}))
                .unwrap();
        assert!(CartItem::from_product(&unpriced, 1).is_none());
    }

    #[test]
    fn test_session_roundtrip_preserves_lines() {
        let mut cart = Cart::new();
        cart.add(item(7, 99_900, 2));
        let stored = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, cart);
    }
}
