//! Product add, update and partial-update forms.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{FieldErrors, FormError, REQUIRED};
use crate::types::{Category, Price, Product};

/// File extensions accepted for product images.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "img"];

static QUANTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("Invalid regex"));

/// Raw input for creating or fully replacing a product.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub quantity: String,
    pub image: Option<PathBuf>,
}

/// A product that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Price,
    pub quantity: u32,
    pub image: Option<PathBuf>,
}

impl ProductForm {
    /// Prefill from an existing record, as the update screen does.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.as_str().to_owned(),
            price: product.price.to_wire(),
            quantity: product.quantity.to_string(),
            image: None,
        }
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] with one entry per failing field.
    pub fn validate(&self) -> Result<NewProduct, FormError> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", &self.name);
        let description = required(&mut errors, "description", &self.description);
        let category = required(&mut errors, "category", &self.category)
            .and_then(|raw| check_category(&mut errors, raw));
        let price = required(&mut errors, "price", &self.price)
            .and_then(|raw| check_price(&mut errors, raw));
        let quantity = required(&mut errors, "quantity", &self.quantity)
            .and_then(|raw| check_quantity(&mut errors, raw));
        check_image(&mut errors, self.image.as_deref());

        match (name, description, category, price, quantity) {
            (Some(name), Some(description), Some(category), Some(price), Some(quantity))
                if errors.is_empty() =>
            {
                Ok(NewProduct {
                    name: name.to_owned(),
                    description: description.to_owned(),
                    category,
                    price,
                    quantity,
                    image: self.image.clone(),
                })
            }
            _ => Err(FormError::Invalid(errors)),
        }
    }
}

impl NewProduct {
    /// Text parts of the multipart body, in form order.
    #[must_use]
    pub fn text_fields(&self) -> [(&'static str, String); 5] {
        [
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("category", self.category.as_str().to_owned()),
            ("price", self.price.to_wire()),
            ("quantity", self.quantity.to_string()),
        ]
    }
}

/// Raw input for a partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatchForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub is_active: Option<bool>,
}

/// JSON body for `PATCH`; absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProductPatchForm {
    /// Validate the fields that were provided.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NothingToUpdate`] when no field was provided and
    /// [`FormError::Invalid`] when a provided field fails its check.
    pub fn validate(&self) -> Result<ProductChanges, FormError> {
        let mut errors = FieldErrors::new();

        let text = |errors: &mut FieldErrors, field, value: &Option<String>| {
            value
                .as_deref()
                .and_then(|raw| required(errors, field, raw))
                .map(str::to_owned)
        };

        let changes = ProductChanges {
            name: text(&mut errors, "name", &self.name),
            description: text(&mut errors, "description", &self.description),
            category: self
                .category
                .as_deref()
                .and_then(|raw| required(&mut errors, "category", raw))
                .and_then(|raw| check_category(&mut errors, raw)),
            price: self
                .price
                .as_deref()
                .and_then(|raw| required(&mut errors, "price", raw))
                .and_then(|raw| check_price(&mut errors, raw)),
            quantity: self
                .quantity
                .as_deref()
                .and_then(|raw| required(&mut errors, "quantity", raw))
                .and_then(|raw| check_quantity(&mut errors, raw)),
            is_active: self.is_active,
        };

        if !errors.is_empty() {
            return Err(FormError::Invalid(errors));
        }
        if changes.is_empty() {
            return Err(FormError::NothingToUpdate);
        }
        Ok(changes)
    }
}

impl ProductChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.is_active.is_none()
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a str) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, REQUIRED);
        None
    } else {
        Some(trimmed)
    }
}

fn check_category(errors: &mut FieldErrors, raw: &str) -> Option<Category> {
    raw.parse::<Category>()
        .map_err(|e| errors.push("category", e.to_string()))
        .ok()
}

fn check_price(errors: &mut FieldErrors, raw: &str) -> Option<Price> {
    Price::parse(raw)
        .map_err(|e| errors.push("price", e.to_string()))
        .ok()
}

fn check_quantity(errors: &mut FieldErrors, raw: &str) -> Option<u32> {
    if !QUANTITY_RE.is_match(raw) {
        errors.push("quantity", "enter numbers only (e.g., 123)");
        return None;
    }
    raw.parse::<u32>()
        .map_err(|_| errors.push("quantity", "quantity is too large"))
        .ok()
}

fn check_image(errors: &mut FieldErrors, path: Option<&Path>) {
    let Some(path) = path else { return };
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    if !accepted {
        errors.push(
            "image",
            format!("unsupported file type, expected one of: .{}", IMAGE_EXTENSIONS.join(", .")),
        );
    }
}
