//! Client error types.

use inventory_core::FieldErrors;
use thiserror::Error;

/// Errors that can occur when talking to the inventory API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the submitted fields (`400`).
    #[error("{0}")]
    Validation(FieldErrors),

    /// Missing, expired or rejected credential (`401`).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed, e.g. editing someone else's product.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an unexpected error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command needs a session and there is none.
    #[error("Not logged in. Run `inv login` first.")]
    NotAuthenticated,

    /// The live channel failed.
    #[error("Live channel error: {0}")]
    Channel(String),
}

/// How an error should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Per-field messages, shown next to the form.
    Validation,
    /// Request failures, shown as a blocking notification.
    Transport,
    /// Live channel failures, shown only through the status indicator.
    Channel,
}

impl ClientError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Channel(_) => ErrorKind::Channel,
            Self::Http(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::NotFound(_)
            | Self::Api { .. }
            | Self::Parse(_)
            | Self::Io(_)
            | Self::NotAuthenticated => ErrorKind::Transport,
        }
    }

    /// Field messages, if the server rejected the input.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
