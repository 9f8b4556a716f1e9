//! Client-side search over the product store.

use crate::store::ProductStore;
use crate::types::Product;

/// Filter `store` by `query`, keeping store order.
///
/// Matching is a case-insensitive substring test against the name, the
/// description and the category's wire value. An empty query returns every
/// product.
#[must_use]
pub fn filter_products<'a>(store: &'a ProductStore, query: &str) -> Vec<&'a Product> {
    if query.is_empty() {
        return store.iter().collect();
    }

    let needle = query.to_lowercase();
    store
        .iter()
        .filter(|product| matches_needle(product, &needle))
        .collect()
}

/// Whether `product` matches an already lowercased needle.
#[must_use]
pub fn matches_needle(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product.category.as_str().contains(needle)
}
