//! Token and account endpoints.

use inventory_core::form::{Credentials, Registration};
use inventory_core::{UserId, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiClient;
use crate::error::ClientError;
use crate::session::Session;

/// Access and refresh token returned by `api/token/`.
#[derive(Deserialize)]
#[serde(try_from = "RawTokens")]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

/// Wire shape of both token responses; wrapped into secrets right away.
#[derive(Deserialize)]
struct RawTokens {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

impl TryFrom<RawTokens> for TokenPair {
    type Error = &'static str;

    fn try_from(raw: RawTokens) -> Result<Self, Self::Error> {
        let refresh = raw.refresh.ok_or("missing field `refresh`")?;
        Ok(Self {
            access: SecretString::from(raw.access),
            refresh: SecretString::from(refresh),
        })
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Fresh access token from `api/token/refresh/`.
///
/// When the server rotates refresh tokens it also sends a new refresh token.
#[derive(Deserialize)]
#[serde(from = "RawTokens")]
pub struct AccessToken {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
}

impl From<RawTokens> for AccessToken {
    fn from(raw: RawTokens) -> Self {
        Self {
            access: SecretString::from(raw.access),
            refresh: raw.refresh.map(SecretString::from),
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access", &"[REDACTED]")
            .field("rotated", &self.refresh.is_some())
            .finish()
    }
}

/// Account created by `api/user/register/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    #[serde(default)]
    pub id: Option<UserId>,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh: &'a str,
}

impl ApiClient {
    /// Exchange a username and password for a token pair.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        self.post("api/token/", credentials, None).await
    }

    /// Get a new access token for `session`'s refresh token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the refresh token expired or
    /// was blacklisted.
    #[instrument(skip(self, session))]
    pub async fn refresh_token(&self, session: &Session) -> Result<AccessToken, ClientError> {
        let body = RefreshBody {
            refresh: session.refresh_token().expose_secret(),
        };
        self.post("api/token/refresh/", &body, None).await
    }

    /// Invalidate `session`'s refresh token on the server.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn blacklist(&self, session: &Session) -> Result<(), ClientError> {
        let body = RefreshBody {
            refresh: session.refresh_token().expose_secret(),
        };
        self.post_unit("api/token/blacklist/", &body, Some(session))
            .await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` when the server rejects a field,
    /// e.g. a username that is already taken.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegisteredUser, ClientError> {
        self.post("api/user/register/", registration, None).await
    }

    /// Profile of the user `session` belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the access token is not valid.
    #[instrument(skip(self, session))]
    pub async fn user_info(&self, session: &Session) -> Result<UserProfile, ClientError> {
        self.get("api/user/", Some(session)).await
    }
}
