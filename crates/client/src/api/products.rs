//! Product endpoints.

use inventory_core::form::{ConfirmedDelete, NewProduct, ProductChanges};
use inventory_core::{Category, Product, ProductId};
use reqwest::Method;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::instrument;

use super::{ApiClient, ImageUpload};
use crate::error::ClientError;
use crate::session::Session;

/// List responses come back bare, or wrapped when the server paginates.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductList {
    Bare(Vec<Product>),
    Page { results: Vec<Product> },
}

impl From<ProductList> for Vec<Product> {
    fn from(list: ProductList) -> Self {
        match list {
            ProductList::Bare(products) | ProductList::Page { results: products } => products,
        }
    }
}

/// Field the server can order product lists by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Price,
    Quantity,
    CreatedAt,
}

impl SortKey {
    pub const ALL: [Self; 4] = [Self::Name, Self::Price, Self::Quantity, Self::CreatedAt];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Quantity => "quantity",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Server-side ordering, written `price` or `-price` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrder {
    pub key: SortKey,
    pub descending: bool,
}

#[derive(Debug, Error)]
#[error("Unknown ordering \"{0}\"; expected one of name, price, quantity, created_at, optionally prefixed with -")]
pub struct ParseOrderError(String);

impl std::fmt::Display for ProductOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.key.as_str())
    }
}

impl std::str::FromStr for ProductOrder {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (descending, field) = match trimmed.strip_prefix('-') {
            Some(field) => (true, field),
            None => (false, trimmed),
        };
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == field)
            .map(|key| Self { key, descending })
            .ok_or_else(|| ParseOrderError(s.to_owned()))
    }
}

impl Serialize for ProductOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Filters and ordering for `GET api/products/`, sent as query parameters.
///
/// `search` matches name and description on the server. Unset fields are
/// left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<ProductOrder>,
}

impl ProductQuery {
    /// True when nothing would be sent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.is_active.is_none()
            && self.search.is_none()
            && self.ordering.is_none()
    }
}

fn product_path(id: ProductId) -> String {
    format!("api/products/{id}/")
}

impl ApiClient {
    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_products(&self, session: &Session) -> Result<Vec<Product>, ClientError> {
        self.query_products(session, &ProductQuery::default()).await
    }

    /// Products matching `query`, filtered and ordered by the server.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn query_products(
        &self,
        session: &Session,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, ClientError> {
        let list: ProductList = self
            .get_with_query("api/products/", query, Some(session))
            .await?;
        Ok(list.into())
    }

    /// Products created by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn my_products(&self, session: &Session) -> Result<Vec<Product>, ClientError> {
        let list: ProductList = self.get("api/products/my_products/", Some(session)).await?;
        Ok(list.into())
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if no product has this id.
    #[instrument(skip(self, session), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        session: &Session,
        id: ProductId,
    ) -> Result<Product, ClientError> {
        self.get(&product_path(id), Some(session)).await
    }

    /// Create a product. The image, if any, must already be loaded.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` when the server rejects a field.
    #[instrument(skip(self, session, product, image), fields(name = %product.name))]
    pub async fn create_product(
        &self,
        session: &Session,
        product: &NewProduct,
        image: Option<ImageUpload>,
    ) -> Result<Product, ClientError> {
        let form = product_form(product, image)?;
        self.send_multipart(Method::POST, "api/products/", form, Some(session))
            .await
    }

    /// Replace every editable field of a product.
    ///
    /// Without an image the stored image is kept.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` if the product belongs to another
    /// user and `ClientError::Validation` when the server rejects a field.
    #[instrument(skip(self, session, product, image), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        session: &Session,
        id: ProductId,
        product: &NewProduct,
        image: Option<ImageUpload>,
    ) -> Result<Product, ClientError> {
        let form = product_form(product, image)?;
        self.send_multipart(Method::PUT, &product_path(id), form, Some(session))
            .await
    }

    /// Change only the given fields.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` if the product belongs to another
    /// user and `ClientError::Validation` when the server rejects a field.
    #[instrument(skip(self, session, changes), fields(product_id = %id))]
    pub async fn patch_product(
        &self,
        session: &Session,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, ClientError> {
        self.patch(&product_path(id), changes, Some(session)).await
    }

    /// Delete a product. Needs a confirmed request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` if the product belongs to another
    /// user and `ClientError::NotFound` if it is already gone.
    #[instrument(skip(self, session), fields(product_id = %confirmed.id()))]
    pub async fn delete_product(
        &self,
        session: &Session,
        confirmed: ConfirmedDelete,
    ) -> Result<(), ClientError> {
        self.delete(&product_path(confirmed.id()), Some(session))
            .await
    }
}

fn product_form(product: &NewProduct, image: Option<ImageUpload>) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for (name, value) in product.text_fields() {
        form = form.text(name, value);
    }
    if let Some(image) = image {
        form = form.part("image", image.into_part()?);
    }
    Ok(form)
}
