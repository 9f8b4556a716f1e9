//! Live channel lifecycle.
//!
//! ```text
//!             credential?
//!            yes /   \ no
//!     Connecting      NoAuth (terminal)
//!      |      \
//!  handshake   remote close
//!      v        \
//!     Open ----> Closed
//!      |
//!  transport error (from Connecting or Open)
//!      v
//!   Errored
//! ```
//!
//! The socket itself lives in the client crate; this module only decides
//! what each signal does to the status.

use serde::Serialize;

/// Current state of the live update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Connecting,
    Open,
    Closed,
    Errored,
    /// No credential was available, so no connection was attempted.
    NoAuth,
}

/// Something that happened to the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSignal {
    /// The websocket handshake completed.
    Handshake,
    /// The server closed the connection cleanly.
    RemoteClose,
    /// The transport failed, including a failed handshake.
    TransportError,
    /// The local side closed the connection on teardown.
    LocalClose,
}

impl ChannelStatus {
    /// Status on mount.
    #[must_use]
    pub const fn initial(has_credential: bool) -> Self {
        if has_credential {
            Self::Connecting
        } else {
            Self::NoAuth
        }
    }

    /// Status after `signal`. Signals that do not apply leave the status
    /// unchanged.
    #[must_use]
    pub const fn on(self, signal: ChannelSignal) -> Self {
        match (self, signal) {
            (Self::NoAuth, _) => Self::NoAuth,
            (Self::Connecting, ChannelSignal::Handshake) => Self::Open,
            (Self::Connecting | Self::Open, ChannelSignal::RemoteClose | ChannelSignal::LocalClose) => {
                Self::Closed
            }
            (_, ChannelSignal::TransportError) => Self::Errored,
            (status, _) => status,
        }
    }

    /// Whether teardown has to close a socket.
    #[must_use]
    pub const fn needs_close(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    /// Whether events can still arrive.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Indicator text for the live feed.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Open => "Connected",
            Self::Closed => "Disconnected",
            Self::Errored => "Error",
            Self::NoAuth => "No Auth Token",
        }
    }
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
