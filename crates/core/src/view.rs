//! Product listing state: the master store plus the active search query.

use crate::event::LiveEvent;
use crate::search::filter_products;
use crate::store::ProductStore;
use crate::types::Product;

/// What a listing screen renders from.
///
/// The visible list is derived on every call to [`ProductView::visible`],
/// so it always reflects the latest store and query.
#[derive(Debug, Clone, Default)]
pub struct ProductView {
    store: ProductStore,
    query: String,
    loaded: bool,
}

impl ProductView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Install the initial bulk load.
    pub fn load(&mut self, products: impl IntoIterator<Item = Product>) {
        self.store.replace_all(products);
        self.loaded = true;
    }

    /// Mark the initial load as settled without data (the fetch failed).
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Apply a live event to the store. Returns `true` if anything changed.
    pub fn apply(&mut self, event: &LiveEvent) -> bool {
        self.store.apply(event)
    }

    /// Change the search query. Returns `true` if it differs from before.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.query {
            return false;
        }
        self.query = query;
        true
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn store(&self) -> &ProductStore {
        &self.store
    }

    /// Whether the initial bulk load has settled.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The filtered list, in store order.
    #[must_use]
    pub fn visible(&self) -> Vec<&Product> {
        filter_products(&self.store, &self.query)
    }

    /// Message to show when nothing is visible.
    #[must_use]
    pub fn empty_hint(&self) -> &'static str {
        if self.query.is_empty() {
            "Add your first product to get started!"
        } else {
            "Try adjusting your search terms"
        }
    }
}
