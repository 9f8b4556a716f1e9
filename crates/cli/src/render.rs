//! Plain-text rendering for terminal output.

use std::fmt::Write;

use inventory_client::Listing;
use inventory_core::{ChannelStatus, Product, UserProfile};

const NAME_WIDTH: usize = 28;

/// Write a block of output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    println!("{text}");
}

/// Live indicator line.
#[must_use]
pub fn status_line(status: ChannelStatus) -> String {
    format!("Live Feed: {}", status.label())
}

/// Products as an aligned table.
#[must_use]
pub fn product_table(products: &[Product]) -> String {
    let mut out = format!(
        "{:>5}  {:<NAME_WIDTH$}  {:<13}  {:>10}  {:>5}  {}\n",
        "ID", "NAME", "CATEGORY", "PRICE", "QTY", "STATUS"
    );
    for product in products {
        let _ = writeln!(
            out,
            "{:>5}  {:<NAME_WIDTH$}  {:<13}  {:>10}  {:>5}  {}",
            product.id.as_i32(),
            truncate(&product.name, NAME_WIDTH),
            product.category.label(),
            product.price.to_wire(),
            product.quantity,
            product.status_label(),
        );
    }
    out.pop();
    out
}

/// One product with every field.
#[must_use]
pub fn product_detail(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", product.id, product.name);
    let _ = writeln!(out, "  Category:    {}", product.category.label());
    let _ = writeln!(out, "  Price:       {}", product.price);
    let _ = writeln!(
        out,
        "  Quantity:    {}{}",
        product.quantity,
        if product.is_in_stock() { "" } else { " (out of stock)" }
    );
    let _ = writeln!(out, "  Total value: {:.2}", product.total_value());
    let _ = writeln!(out, "  Status:      {}", product.status_label());
    if let Some(image) = &product.image {
        let _ = writeln!(out, "  Image:       {image}");
    }
    if let Some(created_at) = product.created_at {
        let _ = writeln!(out, "  Created:     {}", created_at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(updated_at) = product.updated_at {
        let _ = writeln!(out, "  Updated:     {}", updated_at.format("%Y-%m-%d %H:%M"));
    }
    if !product.description.is_empty() {
        let _ = write!(out, "\n  {}", product.description);
    }
    out.trim_end().to_owned()
}

/// A live listing: summary line, then the table or the empty hint.
#[must_use]
pub fn listing(listing: &Listing) -> String {
    let mut out = if listing.query.is_empty() {
        format!("Products ({})", listing.total)
    } else {
        format!(
            "Products ({} of {}) matching \"{}\"",
            listing.products.len(),
            listing.total,
            listing.query
        )
    };
    out.push('\n');
    if listing.products.is_empty() {
        out.push_str(listing.empty_hint);
    } else {
        out.push_str(&product_table(&listing.products));
    }
    out
}

#[must_use]
pub fn profile(profile: &UserProfile) -> String {
    if profile.email.is_empty() {
        profile.username.clone()
    } else {
        format!("{} <{}>", profile.username, profile.email)
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: &str) -> Product {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(ChannelStatus::Connecting), "Live Feed: Connecting...");
        assert_eq!(status_line(ChannelStatus::NoAuth), "Live Feed: No Auth Token");
    }

    #[test]
    fn test_table_rows() {
        let table = product_table(&[product(
            r#"{"id":7,"name":"Desk Lamp","category":"home","price":"24.5","quantity":4}"#,
        )]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Desk Lamp"));
        assert!(lines[1].contains("Home & Garden"));
        assert!(lines[1].contains("24.50"));
        assert!(lines[1].ends_with("Active"));
    }

    #[test]
    fn test_detail_shows_derived_values() {
        let detail = product_detail(&product(
            r#"{"id":3,"name":"Mug","price":"2.50","quantity":4,"description":"Blue"}"#,
        ));
        assert!(detail.contains("Total value: 10.00"));
        assert!(detail.ends_with("Blue"));

        let detail = product_detail(&product(r#"{"id":3,"name":"Mug","price":"2.50"}"#));
        assert!(detail.contains("(out of stock)"));
    }

    #[test]
    fn test_empty_listing_shows_hint() {
        let text = listing(&Listing {
            query: "zzz".to_owned(),
            products: Vec::new(),
            total: 3,
            empty_hint: "Try adjusting your search terms",
        });
        assert_eq!(
            text,
            "Products (0 of 3) matching \"zzz\"\nTry adjusting your search terms"
        );
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long product name", 10), "a very ...");
    }
}
