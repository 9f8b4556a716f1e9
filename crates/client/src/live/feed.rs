//! Live feed coordinator: one mounted run of the product listing.
//!
//! The bulk fetch and the channel handshake are polled from the same loop as
//! the caller's inputs, so neither one holds up the other or a shutdown.
//! Channel frames are only read once the bulk load has settled; anything that
//! arrives earlier waits in the socket, so the bulk replace always comes
//! first. After that, query changes and channel events
//! are handled one at a time in arrival order.

use async_stream::stream;
use futures::Stream;
use futures::future::OptionFuture;
use inventory_core::{ChannelStatus, Product, ProductView};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::{ChannelItem, LiveChannel};
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::Session;

/// Input from whoever is showing the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedInput {
    /// Replace the search query.
    Query(String),
    /// Unmount: close the channel and end the feed.
    Shutdown,
}

/// What the listing should show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub query: String,
    /// Visible products, in store order.
    pub products: Vec<Product>,
    /// Products in the store before filtering.
    pub total: usize,
    /// Shown when `products` is empty.
    pub empty_hint: &'static str,
}

impl Listing {
    fn from_view(view: &ProductView) -> Self {
        Self {
            query: view.query().to_owned(),
            products: view.visible().into_iter().cloned().collect(),
            total: view.store().len(),
            empty_hint: view.empty_hint(),
        }
    }
}

/// Something the observer should render.
#[derive(Debug)]
pub enum FeedUpdate {
    /// The channel status changed.
    Status(ChannelStatus),
    /// The visible listing changed.
    Listing(Listing),
    /// The initial fetch failed; the feed continues with an empty store.
    LoadFailed(ClientError),
}

enum Step {
    Input(Option<FeedInput>),
    Connected(LiveChannel),
    Loaded(Result<Vec<Product>, ClientError>),
    Channel(ChannelItem),
}

/// One run of the live product listing.
#[derive(Debug)]
pub struct LiveFeed {
    api: ApiClient,
    ws_base: Url,
    session: Option<Session>,
    query: String,
}

impl LiveFeed {
    #[must_use]
    pub const fn new(api: ApiClient, ws_base: Url, session: Option<Session>) -> Self {
        Self {
            api,
            ws_base,
            session,
            query: String::new(),
        }
    }

    /// Start with a search query already applied.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Run the feed until `inputs` sends [`FeedInput::Shutdown`] or is
    /// dropped.
    ///
    /// The first [`FeedUpdate::Listing`] is produced as soon as the initial
    /// fetch settles, whether or not the handshake has finished. Inputs are
    /// read the whole time, so a shutdown during the handshake abandons it.
    /// The channel is closed before the stream ends.
    pub fn run(self, mut inputs: mpsc::Receiver<FeedInput>) -> impl Stream<Item = FeedUpdate> {
        stream! {
            let Self { api, ws_base, session, query } = self;
            let mut view = ProductView::with_query(query);

            let mut status = ChannelStatus::initial(session.is_some());
            yield FeedUpdate::Status(status);

            let (mut fetch, mut handshake, mut channel) = match session.as_ref() {
                Some(session) => (
                    Some(Box::pin(api.list_products(session))),
                    Some(Box::pin(LiveChannel::connect(&ws_base, Some(session)))),
                    LiveChannel::connecting(),
                ),
                None => (None, None, LiveChannel::unauthenticated()),
            };
            if fetch.is_none() {
                view.mark_loaded();
                yield FeedUpdate::Listing(Listing::from_view(&view));
            }

            loop {
                let step = tokio::select! {
                    biased;
                    input = inputs.recv() => Step::Input(input),
                    Some(opened) = OptionFuture::from(handshake.as_mut()), if handshake.is_some() => {
                        Step::Connected(opened)
                    }
                    Some(loaded) = OptionFuture::from(fetch.as_mut()), if fetch.is_some() => {
                        Step::Loaded(loaded)
                    }
                    // Frames wait in the socket until the bulk load is in.
                    item = channel.recv(), if view.is_loaded() => Step::Channel(item),
                };

                match step {
                    Step::Input(Some(FeedInput::Query(query))) => {
                        if view.set_query(query) && view.is_loaded() {
                            yield FeedUpdate::Listing(Listing::from_view(&view));
                        }
                    }
                    Step::Input(Some(FeedInput::Shutdown) | None) => break,
                    Step::Connected(opened) => {
                        handshake = None;
                        channel = opened;
                        if channel.status() != status {
                            status = channel.status();
                            yield FeedUpdate::Status(status);
                        }
                    }
                    Step::Loaded(loaded) => {
                        fetch = None;
                        match loaded {
                            Ok(products) => {
                                info!(count = products.len(), "Initial product load");
                                view.load(products);
                            }
                            Err(e) => {
                                warn!(error = %e, "Initial product load failed");
                                view.mark_loaded();
                                yield FeedUpdate::LoadFailed(e);
                            }
                        }
                        yield FeedUpdate::Listing(Listing::from_view(&view));
                    }
                    Step::Channel(ChannelItem::Event(event)) => {
                        if view.apply(&event) {
                            yield FeedUpdate::Listing(Listing::from_view(&view));
                        } else {
                            debug!(product_id = ?event.product_id(), "Live event changed nothing");
                        }
                    }
                    Step::Channel(ChannelItem::Malformed(e)) => {
                        warn!(error = %e, "Skipping live frame");
                    }
                    Step::Channel(ChannelItem::Ended(ended)) => {
                        status = ended;
                        yield FeedUpdate::Status(status);
                    }
                }
            }

            if handshake.take().is_some() {
                debug!("Abandoning live channel handshake");
            }
            channel.close().await;
            if channel.status() != status {
                yield FeedUpdate::Status(channel.status());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::config::ClientConfig;

    fn feed() -> LiveFeed {
        let config =
            ClientConfig::new("http://127.0.0.1:9/", None, PathBuf::from("unused.json")).unwrap();
        let api = ApiClient::new(&config).unwrap();
        LiveFeed::new(api, config.ws_url, None)
    }

    /// A feed whose websocket endpoint accepts TCP but never answers the
    /// upgrade. The listener must outlive the feed.
    async fn stalled_feed() -> (LiveFeed, tokio::net::TcpListener) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws = format!("ws://{}/", listener.local_addr().unwrap());
        let config = ClientConfig::new(
            "http://127.0.0.1:9/",
            Some(ws.as_str()),
            PathBuf::from("unused.json"),
        )
        .unwrap();
        let api = ApiClient::new(&config).unwrap();
        let tokens: crate::api::TokenPair =
            serde_json::from_str(r#"{"access":"acc","refresh":"ref"}"#).unwrap();
        let feed = LiveFeed::new(api, config.ws_url, Some(Session::new(tokens)));
        (feed, listener)
    }

    #[tokio::test]
    async fn test_shutdown_during_handshake_closes_channel() {
        let (feed, _listener) = stalled_feed().await;
        let (tx, rx) = mpsc::channel(4);
        tx.send(FeedInput::Shutdown).await.unwrap();

        let updates: Vec<_> = tokio::time::timeout(Duration::from_secs(3), feed.run(rx).collect())
            .await
            .unwrap();
        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], FeedUpdate::Status(ChannelStatus::Connecting)));
        assert!(matches!(updates[1], FeedUpdate::Status(ChannelStatus::Closed)));
    }

    #[tokio::test]
    async fn test_listing_does_not_wait_for_handshake() {
        let (feed, _listener) = stalled_feed().await;
        let (tx, rx) = mpsc::channel(4);
        let updates = feed.run(rx);
        futures::pin_mut!(updates);

        let mut seen = Vec::new();
        while let Some(update) = tokio::time::timeout(Duration::from_secs(3), updates.next())
            .await
            .unwrap()
        {
            let listing = matches!(update, FeedUpdate::Listing(_));
            seen.push(update);
            if listing {
                break;
            }
        }
        assert!(matches!(seen[0], FeedUpdate::Status(ChannelStatus::Connecting)));
        assert!(matches!(seen[1], FeedUpdate::LoadFailed(_)));
        assert_eq!(seen.len(), 3);

        tx.send(FeedInput::Shutdown).await.unwrap();
        assert!(matches!(
            updates.next().await,
            Some(FeedUpdate::Status(ChannelStatus::Closed))
        ));
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn test_without_session_reports_no_auth_and_empty_listing() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(FeedInput::Shutdown).await.unwrap();

        let updates: Vec<_> = feed().with_query("lamp").run(rx).collect().await;
        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], FeedUpdate::Status(ChannelStatus::NoAuth)));
        match &updates[1] {
            FeedUpdate::Listing(listing) => {
                assert!(listing.products.is_empty());
                assert_eq!(listing.query, "lamp");
                assert_eq!(listing.empty_hint, "Try adjusting your search terms");
            }
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_change_emits_listing_and_dropped_sender_ends_feed() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(FeedInput::Query("mug".to_owned())).await.unwrap();
        tx.send(FeedInput::Query("mug".to_owned())).await.unwrap();
        drop(tx);

        let updates: Vec<_> = feed().run(rx).collect().await;
        let listings: Vec<_> = updates
            .iter()
            .filter_map(|u| match u {
                FeedUpdate::Listing(l) => Some(l.query.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(listings, vec!["", "mug"]);
    }
}
