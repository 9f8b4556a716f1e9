//! Live product feed in the terminal.
//!
//! Each line typed on stdin replaces the search query; an empty line clears
//! it. Ctrl-C or end of input stops the feed.

use std::io::BufRead;

use futures::StreamExt;
use inventory_client::{FeedInput, FeedUpdate, LiveFeed};
use tokio::sync::mpsc;

use super::App;
use crate::render;

const INPUT_BUFFER: usize = 16;

/// Run the live feed until interrupted.
///
/// Without a saved session nothing is fetched and the live channel reports
/// `No Auth Token`.
///
/// # Errors
///
/// Returns error if the saved session cannot be read.
pub async fn run(app: &App, search: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.session().await?;
    if session.is_none() {
        tracing::warn!("No saved session; live updates are disabled");
    }

    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    spawn_stdin_reader(tx.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(FeedInput::Shutdown).await;
        }
    });

    let feed = LiveFeed::new(app.api.clone(), app.config.ws_url.clone(), session)
        .with_query(search.unwrap_or_default());
    let updates = feed.run(rx);
    futures::pin_mut!(updates);

    while let Some(update) = updates.next().await {
        match update {
            FeedUpdate::Status(status) => render::emit(&render::status_line(status)),
            FeedUpdate::Listing(listing) => render::emit(&render::listing(&listing)),
            FeedUpdate::LoadFailed(e) => {
                tracing::error!(error = %e, "Failed to load products");
            }
        }
    }
    Ok(())
}

/// Forward stdin lines as query changes from a plain thread.
///
/// Tokio's stdin blocks runtime shutdown while a read is pending, so the
/// read happens off the runtime and the thread is left to die with the
/// process.
fn spawn_stdin_reader(tx: mpsc::Sender<FeedInput>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(FeedInput::Query(line)).is_err() {
                return;
            }
        }
        let _ = tx.blocking_send(FeedInput::Shutdown);
    });
}
