//! Live product channel.
//!
//! One websocket per feed run, opened at `<ws base>/ws/products/?token=...`.
//! Status transitions follow [`ChannelStatus::on`]; this module only turns
//! socket outcomes into [`ChannelSignal`]s.

mod feed;

pub use feed::{FeedInput, FeedUpdate, Listing, LiveFeed};

use futures::StreamExt;
use inventory_core::{ChannelSignal, ChannelStatus, EventParseError, LiveEvent};
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::ClientError;
use crate::session::Session;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Path of the product feed under the websocket base.
const PRODUCTS_PATH: &str = "ws/products/";

/// What the channel produced next.
#[derive(Debug)]
pub enum ChannelItem {
    /// A decoded frame.
    Event(LiveEvent),
    /// A frame that could not be decoded. The channel stays open.
    Malformed(EventParseError),
    /// The connection ended; carries the new status.
    Ended(ChannelStatus),
}

/// A live channel and its status.
pub struct LiveChannel {
    status: ChannelStatus,
    socket: Option<Socket>,
}

/// Product feed endpoint for `ws_base`, without the token.
///
/// # Errors
///
/// Returns `ClientError::Channel` if `ws_base` cannot be joined.
pub fn products_endpoint(ws_base: &Url) -> Result<Url, ClientError> {
    ws_base
        .join(PRODUCTS_PATH)
        .map_err(|e| ClientError::Channel(format!("Invalid websocket base {ws_base}: {e}")))
}

impl LiveChannel {
    /// A channel that was never opened because there is no credential.
    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            status: ChannelStatus::initial(false),
            socket: None,
        }
    }

    /// Stand-in while the handshake is still in flight. Never yields items;
    /// closing it only records the local close.
    #[must_use]
    pub const fn connecting() -> Self {
        Self {
            status: ChannelStatus::initial(true),
            socket: None,
        }
    }

    /// Open the channel.
    ///
    /// Never fails outright: without a session the status is `NoAuth`, and a
    /// failed handshake leaves it `Errored`.
    #[instrument(skip_all)]
    pub async fn connect(ws_base: &Url, session: Option<&Session>) -> Self {
        let Some(session) = session else {
            info!("No credential, live channel not opened");
            return Self::unauthenticated();
        };

        let status = ChannelStatus::initial(true);
        let mut endpoint = match products_endpoint(ws_base) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(error = %e, "Live channel endpoint is invalid");
                return Self {
                    status: status.on(ChannelSignal::TransportError),
                    socket: None,
                };
            }
        };
        let display_endpoint = endpoint.to_string();
        endpoint
            .query_pairs_mut()
            .append_pair("token", session.access_token().expose_secret());

        match tokio_tungstenite::connect_async(endpoint.as_str()).await {
            Ok((socket, _response)) => {
                info!(endpoint = %display_endpoint, "Live channel connected");
                Self {
                    status: status.on(ChannelSignal::Handshake),
                    socket: Some(socket),
                }
            }
            Err(e) => {
                warn!(endpoint = %display_endpoint, error = %e, "Live channel handshake failed");
                Self {
                    status: status.on(ChannelSignal::TransportError),
                    socket: None,
                }
            }
        }
    }

    #[must_use]
    pub const fn status(&self) -> ChannelStatus {
        self.status
    }

    /// Wait for the next item.
    ///
    /// Once the connection has ended this never resolves, so it can sit in a
    /// `select!` next to other inputs. Cancel safe.
    pub async fn recv(&mut self) -> ChannelItem {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                return std::future::pending().await;
            };

            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    debug!(frame = %text.as_str(), "Live frame");
                    return match LiveEvent::parse(text.as_str()) {
                        Ok(event) => ChannelItem::Event(event),
                        Err(e) => ChannelItem::Malformed(e),
                    };
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Live channel closed by server");
                    return self.end(ChannelSignal::RemoteClose);
                }
                // Ping replies are queued by tungstenite and flushed on the
                // next read.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Live channel transport error");
                    return self.end(ChannelSignal::TransportError);
                }
                None => {
                    info!("Live channel stream ended");
                    return self.end(ChannelSignal::RemoteClose);
                }
            }
        }
    }

    fn end(&mut self, signal: ChannelSignal) -> ChannelItem {
        self.socket = None;
        self.status = self.status.on(signal);
        ChannelItem::Ended(self.status)
    }

    /// Tear down. Sends a close frame if the channel is still connecting or
    /// open; otherwise does nothing.
    pub async fn close(&mut self) {
        if !self.status.needs_close() {
            return;
        }
        if let Some(mut socket) = self.socket.take()
            && let Err(e) = socket.close(None).await
        {
            debug!(error = %e, "Close frame not delivered");
        }
        self.status = self.status.on(ChannelSignal::LocalClose);
        info!("Live channel closed");
    }
}

impl std::fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChannel")
            .field("status", &self.status)
            .field("connected", &self.socket.is_some())
            .finish()
    }
}
