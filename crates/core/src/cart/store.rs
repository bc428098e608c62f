use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::CartItem;
use crate::metrics::PERSIST_FAILURES;
use crate::store::{keys, load_json, save_json, KeyValueStore};

/// Cart lines, written through to the durable store after every change.
///
/// Lines keep insertion order and ids are unique.
pub struct CartStore {
    items: Mutex<Vec<CartItem>>,
    store: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Rehydrate the cart from the durable store. A corrupt record starts an empty cart.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match load_json::<Vec<CartItem>>(store.as_ref(), keys::CART) {
            Ok(Some(items)) => {
                debug!("Restored cart with {} lines", items.len());
                items
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Error loading cart, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            items: Mutex::new(items),
            store,
        }
    }

    /// Add `quantity` (default 1) of an item, merging with an existing line.
    pub fn add_item(&self, item: CartItem, quantity: Option<u32>) {
        let quantity = quantity.filter(|q| *q > 0).unwrap_or(1);
        let mut items = self.lock();

        match items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => items.push(CartItem { quantity, ..item }),
        }
        self.persist(&items);
    }

    pub fn remove_item(&self, id: u64) {
        let mut items = self.lock();
        items.retain(|line| line.id != id);
        self.persist(&items);
    }

    /// Set a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&self, id: u64, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        let mut items = self.lock();
        if let Some(line) = items.iter_mut().find(|line| line.id == id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        self.persist(&items);
    }

    pub fn clear(&self) {
        let mut items = self.lock();
        items.clear();
        self.persist(&items);
    }

    pub fn contains(&self, id: u64) -> bool {
        self.lock().iter().any(|line| line.id == id)
    }

    /// Sum of quantities.
    pub fn total_items(&self) -> u64 {
        self.lock().iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of unit price times quantity over every line.
    pub fn total_price(&self) -> f64 {
        self.lock().iter().map(CartItem::line_total).sum()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    fn persist(&self, items: &[CartItem]) {
        if let Err(e) = save_json(self.store.as_ref(), keys::CART, items) {
            warn!("Failed to persist cart: {}", e);
            PERSIST_FAILURES.with_label_values(&[keys::CART]).inc();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::fixtures::cart_item;

    fn cart() -> (CartStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CartStore::new(store.clone()), store)
    }

    #[test]
    fn test_add_merges_same_id() {
        let (cart, _) = cart();
        cart.add_item(cart_item(1, "Dune", 10.0), None);
        cart.add_item(cart_item(1, "Dune", 10.0), Some(2));
        cart.add_item(cart_item(2, "Emma", 5.5), Some(0));

        let items = cart.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[1].quantity, 1, "zero quantity counts as one");
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.total_price(), 35.5);
    }

    #[test]
    fn test_update_quantity() {
        let (cart, _) = cart();
        cart.add_item(cart_item(1, "Dune", 10.0), None);
        cart.add_item(cart_item(2, "Emma", 5.0), None);

        cart.update_quantity(1, 4);
        assert_eq!(cart.items()[0].quantity, 4);

        cart.update_quantity(2, 0);
        assert!(!cart.contains(2));

        cart.update_quantity(1, -3);
        assert!(cart.items().is_empty());

        // Unknown id is a no-op
        cart.update_quantity(42, 2);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let (cart, _) = cart();
        cart.add_item(cart_item(1, "Dune", 10.0), None);
        cart.add_item(cart_item(2, "Emma", 5.0), None);

        cart.remove_item(1);
        assert!(!cart.contains(1));
        assert!(cart.contains(2));

        cart.clear();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), 0.0);
    }

    #[test]
    fn test_every_mutation_persists() {
        let (cart, store) = cart();
        cart.add_item(cart_item(7, "Emma", 5.0), Some(2));

        let restored = CartStore::new(store.clone());
        assert_eq!(restored.items(), cart.items());

        cart.clear();
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_record_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::CART, "[{\"id\":").unwrap();

        let cart = CartStore::new(store);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn test_quota_failure_is_not_fatal() {
        let cart = CartStore::new(Arc::new(MemoryStore::with_quota(4)));
        cart.add_item(cart_item(1, "Dune", 10.0), None);
        assert!(cart.contains(1));
    }

    #[test]
    fn test_total_price_is_sum_of_line_totals() {
        let (cart, _) = cart();
        cart.add_item(cart_item(1, "A", 0.1), Some(3));
        cart.add_item(cart_item(2, "B", 0.2), None);

        let expected = 0.1 * 3.0 + 0.2 * 1.0;
        assert_eq!(cart.total_price(), expected);
        assert_eq!(
            cart.total_price(),
            cart.items().iter().map(CartItem::line_total).sum::<f64>()
        );
    }
}
