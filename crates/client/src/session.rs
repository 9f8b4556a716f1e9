//! Session context: the signed-in user's tokens and profile.
//!
//! The application root loads the session once, verifies it against
//! `api/user/`, and passes `&Session` to every operation. Nothing here is
//! global.
//!
//! The session is persisted between invocations as a small JSON file. Tokens
//! only leave [`SecretString`] when they are written to that file or put on
//! the wire.

use std::path::{Path, PathBuf};

use inventory_core::UserProfile;
use inventory_core::form::Credentials;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::api::{AccessToken, ApiClient, TokenPair};
use crate::error::ClientError;

/// Credential pair plus, once verified, who it belongs to.
#[derive(Clone)]
pub struct Session {
    access: SecretString,
    refresh: SecretString,
    profile: Option<UserProfile>,
}

impl Session {
    #[must_use]
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            access: tokens.access,
            refresh: tokens.refresh,
            profile: None,
        }
    }

    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access
    }

    #[must_use]
    pub const fn refresh_token(&self) -> &SecretString {
        &self.refresh
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Whether the server has confirmed the access token.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.profile.is_some()
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    /// Swap in a refreshed access token (and rotated refresh token, if any).
    pub fn apply_refresh(&mut self, token: AccessToken) {
        self.access = token.access;
        if let Some(refresh) = token.refresh {
            self.refresh = refresh;
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Gate for commands that need a signed-in user.
///
/// # Errors
///
/// Returns `ClientError::NotAuthenticated` when there is no session.
pub const fn require(session: Option<&Session>) -> Result<&Session, ClientError> {
    match session {
        Some(session) => Ok(session),
        None => Err(ClientError::NotAuthenticated),
    }
}

/// On-disk shape of a session.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access: String,
    refresh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<UserProfile>,
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the file exists but cannot be read and
    /// `ClientError::Parse` if it is not a session file.
    pub async fn load(&self) -> Result<Option<Session>, ClientError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&raw).map_err(|e| {
            ClientError::Parse(format!(
                "Invalid session file {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(Some(Session {
            access: SecretString::from(stored.access),
            refresh: SecretString::from(stored.refresh),
            profile: stored.profile,
        }))
    }

    /// Persist `session`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the file cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), ClientError> {
        let stored = StoredSession {
            access: session.access.expose_secret().to_owned(),
            refresh: session.refresh.expose_secret().to_owned(),
            profile: session.profile.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| ClientError::Parse(format!("Failed to encode session: {e}")))?;

        let mut file = open_private(&self.path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Remove the session file. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<bool, ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Open for writing, truncated. On unix a new file is created owner-only,
/// and an existing one is tightened before anything is written to it.
#[cfg(unix)]
async fn open_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    use std::os::unix::fs::PermissionsExt;

    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .await?;
    Ok(file)
}

#[cfg(not(unix))]
async fn open_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
}

/// Obtain a token pair, verify it and persist the session.
///
/// # Errors
///
/// Returns `ClientError::Unauthorized` for wrong credentials.
#[instrument(skip_all, fields(username = %credentials.username))]
pub async fn login(
    api: &ApiClient,
    store: &SessionStore,
    credentials: &Credentials,
) -> Result<Session, ClientError> {
    let tokens = api.obtain_token(credentials).await?;
    let mut session = Session::new(tokens);
    let profile = api.user_info(&session).await?;
    session.set_profile(profile);
    store.save(&session).await?;
    info!("Logged in");
    Ok(session)
}

/// Load the saved session and verify it against the server.
///
/// A session the server rejects is treated as absent; the file is kept so
/// that `refresh` can still use its refresh token.
///
/// # Errors
///
/// Returns error if the file cannot be read or the server cannot be reached.
#[instrument(skip_all)]
pub async fn restore(api: &ApiClient, store: &SessionStore) -> Result<Option<Session>, ClientError> {
    let Some(mut session) = store.load().await? else {
        return Ok(None);
    };

    match api.user_info(&session).await {
        Ok(profile) => {
            session.set_profile(profile);
            Ok(Some(session))
        }
        Err(ClientError::Unauthorized(reason)) => {
            warn!(%reason, "Saved session was rejected");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Exchange the saved refresh token for a new access token.
///
/// # Errors
///
/// Returns `ClientError::NotAuthenticated` without a saved session and
/// `ClientError::Unauthorized` if the refresh token is no longer valid.
#[instrument(skip_all)]
pub async fn refresh(api: &ApiClient, store: &SessionStore) -> Result<Session, ClientError> {
    let mut session = store.load().await?.ok_or(ClientError::NotAuthenticated)?;
    let token = api.refresh_token(&session).await?;
    session.apply_refresh(token);
    if let Ok(profile) = api.user_info(&session).await {
        session.set_profile(profile);
    }
    store.save(&session).await?;
    info!("Access token refreshed");
    Ok(session)
}

/// Blacklist the refresh token and delete the session file.
///
/// The file is removed even when the blacklist call fails; that failure is
/// returned afterwards.
///
/// # Errors
///
/// Returns the blacklist error, or `ClientError::Io` if the file could not
/// be removed.
#[instrument(skip_all)]
pub async fn logout(
    api: &ApiClient,
    store: &SessionStore,
    session: &Session,
) -> Result<(), ClientError> {
    let blacklisted = api.blacklist(session).await;
    store.clear().await?;
    match blacklisted {
        Ok(()) => {
            info!("Logged out");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Refresh token was not blacklisted; local session removed anyway");
            Err(e)
        }
    }
}
