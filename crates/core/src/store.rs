//! The master product list and its reconciliation rules.
//!
//! The store is fed by exactly two inputs: a one-time bulk replace from the
//! initial fetch, and live events applied one at a time in arrival order.
//!
//! | Event    | Id present                      | Id absent |
//! |----------|---------------------------------|-----------|
//! | `create` | move to front, replace record   | prepend   |
//! | `update` | replace in place                | no-op     |
//! | `delete` | remove                          | no-op     |
//!
//! Every rule is idempotent, so a redelivered event never changes the
//! outcome.

use indexmap::IndexMap;

use crate::event::LiveEvent;
use crate::types::{Product, ProductId};

/// Ordered id → product mapping, most recent first.
#[derive(Debug, Clone, Default)]
pub struct ProductStore {
    items: IndexMap<ProductId, Product>,
}

// IndexMap equality ignores order; two stores are only equal when they would
// render identically.
impl PartialEq for ProductStore {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().eq(other.items.iter())
    }
}

impl Eq for ProductStore {}

impl ProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a bulk snapshot, keeping server order.
    ///
    /// If the snapshot repeats an id, the later record wins but keeps the
    /// position of the first occurrence.
    #[must_use]
    pub fn from_snapshot(products: impl IntoIterator<Item = Product>) -> Self {
        let mut store = Self::new();
        store.replace_all(products);
        store
    }

    /// Pure reference fold: snapshot first, then each event in order.
    #[must_use]
    pub fn fold<'a>(
        snapshot: impl IntoIterator<Item = Product>,
        events: impl IntoIterator<Item = &'a LiveEvent>,
    ) -> Self {
        let mut store = Self::from_snapshot(snapshot);
        for event in events {
            store.apply(event);
        }
        store
    }

    /// Replace everything with a fresh snapshot.
    pub fn replace_all(&mut self, products: impl IntoIterator<Item = Product>) {
        self.items.clear();
        for product in products {
            self.items.insert(product.id, product);
        }
    }

    /// Apply one live event. Returns `true` if the store changed.
    pub fn apply(&mut self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::ConnectionEstablished { .. } => false,
            LiveEvent::Created(product) => self.upsert_front(product.clone()),
            LiveEvent::Updated(product) => self.replace_in_place(product.clone()),
            LiveEvent::Deleted(id) => self.items.shift_remove(id).is_some(),
        }
    }

    fn upsert_front(&mut self, product: Product) -> bool {
        let already_first = self
            .items
            .first()
            .is_some_and(|(id, existing)| *id == product.id && *existing == product);
        if already_first {
            return false;
        }
        self.items.shift_remove(&product.id);
        self.items.shift_insert(0, product.id, product);
        true
    }

    fn replace_in_place(&mut self, product: Product) -> bool {
        match self.items.get_mut(&product.id) {
            Some(existing) if *existing != product => {
                *existing = product;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.items.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Products in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.items.values()
    }

    /// Ids in display order.
    pub fn ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.items.keys().copied()
    }
}

impl<'a> IntoIterator for &'a ProductStore {
    type Item = &'a Product;
    type IntoIter = indexmap::map::Values<'a, ProductId, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::{Category, Price};

    fn product(id: i32, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: String::new(),
            category: Category::Other,
            price: Price::parse("1.00").unwrap(),
            quantity: 1,
            image: None,
            is_active: true,
            created_at: None,
            updated_at: None,
            created_by: None,
        }
    }

    fn ids(store: &ProductStore) -> Vec<i32> {
        store.ids().map(|id| id.as_i32()).collect()
    }

    #[test]
    fn test_create_prepends_new_item() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen")]);
        assert!(store.apply(&LiveEvent::Created(product(2, "Book"))));
        assert_eq!(ids(&store), vec![2, 1]);
        assert_eq!(store.get(ProductId::new(2)).unwrap().name, "Book");
    }

    #[test]
    fn test_create_collision_is_last_write_wins() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen"), product(2, "Book")]);
        store.apply(&LiveEvent::Created(product(2, "Notebook")));
        assert_eq!(ids(&store), vec![2, 1]);
        assert_eq!(store.get(ProductId::new(2)).unwrap().name, "Notebook");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut store =
            ProductStore::from_snapshot([product(1, "Pen"), product(2, "Book"), product(3, "Cup")]);
        assert!(store.apply(&LiveEvent::Updated(product(2, "Hardcover"))));
        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert_eq!(store.get(ProductId::new(2)).unwrap().name, "Hardcover");
    }

    #[test]
    fn test_update_for_absent_id_is_noop() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen")]);
        let before = store.clone();
        assert!(!store.apply(&LiveEvent::Updated(product(9, "Ghost"))));
        assert_eq!(store, before);
    }

    #[test]
    fn test_delete_removes_item() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen"), product(2, "Book")]);
        assert!(store.apply(&LiveEvent::Deleted(ProductId::new(1))));
        assert_eq!(ids(&store), vec![2]);
    }

    #[test]
    fn test_delete_for_absent_id_is_noop() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen")]);
        let before = store.clone();
        assert!(!store.apply(&LiveEvent::Deleted(ProductId::new(42))));
        assert_eq!(store, before);
    }

    #[test]
    fn test_connection_marker_is_ignored() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen")]);
        assert!(!store.apply(&LiveEvent::ConnectionEstablished { message: None }));
        assert_eq!(ids(&store), vec![1]);
    }

    #[test]
    fn test_replace_all_discards_previous_state() {
        let mut store = ProductStore::from_snapshot([product(1, "Pen")]);
        store.replace_all([product(5, "Lamp"), product(4, "Desk")]);
        assert_eq!(ids(&store), vec![5, 4]);
    }

    #[test]
    fn test_redelivered_create_reports_no_change() {
        let mut store = ProductStore::new();
        let event = LiveEvent::Created(product(1, "Pen"));
        assert!(store.apply(&event));
        assert!(!store.apply(&event));
        assert_eq!(ids(&store), vec![1]);
    }

    #[test]
    fn test_order_sensitivity() {
        let create = LiveEvent::Created(product(7, "Mug"));
        let delete = LiveEvent::Deleted(ProductId::new(7));
        let created_last = ProductStore::fold(Vec::new(), [&delete, &create]);
        let deleted_last = ProductStore::fold(Vec::new(), [&create, &delete]);
        assert_eq!(ids(&created_last), vec![7]);
        assert!(deleted_last.is_empty());
    }

    fn arb_event() -> impl Strategy<Value = LiveEvent> {
        let id = 1..6i32;
        let name = "[a-z]{1,4}";
        prop_oneof![
            (id.clone(), name).prop_map(|(id, n)| LiveEvent::Created(product(id, &n))),
            (id.clone(), name).prop_map(|(id, n)| LiveEvent::Updated(product(id, &n))),
            id.prop_map(|id| LiveEvent::Deleted(ProductId::new(id))),
        ]
    }

    fn arb_snapshot() -> impl Strategy<Value = Vec<Product>> {
        prop::collection::btree_set(1..6i32, 0..5).prop_map(|ids| {
            ids.into_iter()
                .map(|id| product(id, &format!("p{id}")))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_incremental_apply_matches_fold(
            snapshot in arb_snapshot(),
            events in prop::collection::vec(arb_event(), 0..20),
        ) {
            let mut store = ProductStore::from_snapshot(snapshot.clone());
            for event in &events {
                store.apply(event);
            }
            prop_assert_eq!(store, ProductStore::fold(snapshot, &events));
        }

        #[test]
        fn prop_redelivery_is_idempotent(
            snapshot in arb_snapshot(),
            events in prop::collection::vec(arb_event(), 0..20),
        ) {
            let once = ProductStore::fold(snapshot.clone(), &events);
            let mut twice = ProductStore::from_snapshot(snapshot);
            for event in &events {
                twice.apply(event);
                twice.apply(event);
            }
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn prop_updates_never_insert(
            snapshot in arb_snapshot(),
            id in 1..6i32,
        ) {
            let mut store = ProductStore::from_snapshot(snapshot);
            let existed = store.contains(ProductId::new(id));
            store.apply(&LiveEvent::Updated(product(id, "changed")));
            prop_assert_eq!(store.contains(ProductId::new(id)), existed);
        }
    }
}
