//! Command implementations.

pub mod auth;
pub mod products;
pub mod watch;

use std::io::{BufRead, Write};

use inventory_client::session::{self, require};
use inventory_client::{ApiClient, ClientConfig, ClientError, Session, SessionStore};

/// Everything a command needs: configuration, the API client and the
/// session file.
#[derive(Debug, Clone)]
pub struct App {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub store: SessionStore,
}

impl App {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let store = SessionStore::new(config.session_file.clone());
        Ok(Self { config, api, store })
    }

    /// Load and verify the saved session.
    ///
    /// # Errors
    ///
    /// Returns error if the session file is unreadable or the server cannot
    /// be reached.
    pub async fn session(&self) -> Result<Option<Session>, ClientError> {
        session::restore(&self.api, &self.store).await
    }

    /// Like [`App::session`], but a missing session is an error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` if nobody is logged in.
    pub async fn require_session(&self) -> Result<Session, ClientError> {
        let session = self.session().await?;
        require(session.as_ref()).cloned()
    }
}

/// Ask a question on stderr and read one line from stdin.
///
/// # Errors
///
/// Returns error if stdin or stderr is closed.
pub fn prompt(question: &str) -> std::io::Result<String> {
    let mut stderr = std::io::stderr().lock();
    write!(stderr, "{question}")?;
    stderr.flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim_end_matches(['\r', '\n']).to_owned())
}

/// Use `value` if given, otherwise prompt for it.
///
/// # Errors
///
/// Returns error if prompting fails.
pub fn value_or_prompt(value: Option<String>, question: &str) -> std::io::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(question),
    }
}
