//! Inventory REST API client.
//!
//! # Endpoints
//!
//! | Operation      | Request                               |
//! |----------------|---------------------------------------|
//! | token pair     | `POST api/token/`                     |
//! | refresh        | `POST api/token/refresh/`             |
//! | logout         | `POST api/token/blacklist/`           |
//! | register       | `POST api/user/register/`             |
//! | user info      | `GET api/user/`                       |
//! | products       | `GET/POST api/products/`              |
//! | filtered list  | `GET api/products/?category=&is_active=&search=&ordering=` |
//! | my products    | `GET api/products/my_products/`       |
//! | one product    | `GET/PUT/PATCH/DELETE api/products/{id}/` |
//!
//! Authenticated calls send `Authorization: Bearer <access>`.

mod auth;
mod products;
mod upload;

pub use auth::{AccessToken, RegisteredUser, TokenPair};
pub use products::{ParseOrderError, ProductOrder, ProductQuery, SortKey};
pub use upload::ImageUpload;

use std::sync::Arc;

use inventory_core::FieldErrors;
use reqwest::StatusCode;
use reqwest::multipart::Form;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

const USER_AGENT: &str = concat!("inventory-client/", env!("CARGO_PKG_VERSION"));

/// Inventory API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

/// DRF error bodies usually carry a `detail` string.
#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ClientError::Parse(format!("Invalid request path {path}: {e}")))
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        session: Option<&Session>,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let builder = self.inner.client.request(method, self.url(path)?);
        Ok(match session {
            Some(session) => builder.bearer_auth(session.access_token().expose_secret()),
            None => builder,
        })
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        let response = self
            .request(reqwest::Method::GET, path, session)?
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a GET request with query parameters.
    pub(crate) async fn get_with_query<T: DeserializeOwned, Q: serde::Serialize + Sync>(
        &self,
        path: &str,
        query: &Q,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        let response = self
            .request(reqwest::Method::GET, path, session)?
            .query(query)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        let response = self
            .request(reqwest::Method::POST, path, session)?
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a POST request whose response body is not needed.
    pub(crate) async fn post_unit<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        session: Option<&Session>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, path, session)?
            .json(body)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Execute a PATCH request with a JSON body.
    pub(crate) async fn patch<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        let response = self
            .request(reqwest::Method::PATCH, path, session)?
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a POST or PUT request with a multipart body.
    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        form: Form,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        let response = self
            .request(method, path, session)?
            .multipart(form)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(
        &self,
        path: &str,
        session: Option<&Session>,
    ) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, path, session)?
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(self.parse_error(response).await)
    }

    /// Map an error response onto [`ClientError`].
    async fn parse_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            StatusCode::BAD_REQUEST => ClientError::Validation(validation_errors(&body)),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(detail_or(&body, "not authenticated")),
            StatusCode::FORBIDDEN => ClientError::Forbidden(detail_or(&body, "permission denied")),
            StatusCode::NOT_FOUND => ClientError::NotFound(detail_or(&body, "resource not found")),
            _ => ClientError::Api {
                status: status.as_u16(),
                message: body,
            },
        }
    }
}

fn validation_errors(body: &str) -> FieldErrors {
    serde_json::from_str::<serde_json::Value>(body).map_or_else(
        |_| {
            let mut errors = FieldErrors::new();
            errors.push_general(body.trim());
            errors
        },
        |value| FieldErrors::from_json(&value),
    )
}

fn detail_or(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorDetail>(body)
        .map_or_else(|_| fallback.to_string(), |e| e.detail)
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_paths_resolve_against_base() {
        let config =
            ClientConfig::new("http://localhost:8000/v1", None, PathBuf::from("s.json")).unwrap();
        let api = ApiClient::new(&config).unwrap();
        assert_eq!(
            api.url("api/products/7/").unwrap().as_str(),
            "http://localhost:8000/v1/api/products/7/"
        );
    }

    #[test]
    fn test_validation_body_parsing() {
        let errors = validation_errors(r#"{"name": ["product with this name already exists."]}"#);
        assert_eq!(
            errors.to_string(),
            "name: product with this name already exists."
        );
        assert_eq!(validation_errors("Bad Request").to_string(), "Bad Request");
    }

    #[test]
    fn test_detail_extraction() {
        assert_eq!(
            detail_or(r#"{"detail": "Given token not valid for any token type"}"#, "x"),
            "Given token not valid for any token type"
        );
        assert_eq!(detail_or("<html>", "fallback"), "fallback");
    }
}
