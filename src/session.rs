//! Feed-driven session: the single writer of a book.
//!
//! A producer task (see [`spawn_feed`]) sends [`FeedMessage`]s over a bounded
//! `tokio::sync::mpsc` channel; [`Session::run`] consumes them one at a time
//! and applies them to a [`SharedBook`]. Because the session is the only
//! consumer, batches are applied strictly in the order the feed sent them.
//!
//! Rejected changes are logged and counted; they never stop the session.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Precision;
use crate::error::Error;
use crate::feed::RandomFeed;
use crate::orderbook::{OrderBook, SharedBook};
use crate::types::{FeedMessage, L2Update, Snapshot};

/// Channel capacity between feed and session
pub const CHANNEL_CAPACITY: usize = 64;

/// Counters for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Snapshots received (the first seeds the book, later ones replace it)
    pub snapshots: u64,
    /// Update batches applied
    pub batches: u64,
    /// Changes applied across all batches
    pub changes_applied: u64,
    /// Changes rejected across all batches
    pub changes_rejected: u64,
    /// Messages dropped (update before snapshot, wrong instrument, bad snapshot)
    pub messages_dropped: u64,
}

/// What handling one message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// The book was (re)built from a snapshot
    Seeded,
    /// A batch was applied; `rejected` changes were skipped
    Applied {
        /// Number of applied changes
        applied: usize,
        /// Number of rejected changes
        rejected: usize,
    },
    /// The message was not applied
    Dropped,
}

/// Single-writer consumer of a feed
#[derive(Debug)]
pub struct Session {
    product_id: String,
    precision: Precision,
    book: Option<SharedBook>,
    stats: SessionStats,
}

impl Session {
    /// Create a session for `product_id`; the book is created by the first
    /// snapshot for that instrument
    pub fn new(product_id: impl Into<String>, precision: Precision) -> Self {
        Self {
            product_id: product_id.into(),
            precision,
            book: None,
            stats: SessionStats::default(),
        }
    }

    /// Handle to the book, once seeded
    pub fn book(&self) -> Option<&SharedBook> {
        self.book.as_ref()
    }

    /// Counters so far
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Apply one feed message
    pub fn handle(&mut self, message: &FeedMessage) -> Handled {
        if message.product_id() != self.product_id {
            debug!(
                expected = %self.product_id,
                got = %message.product_id(),
                "dropping message for another instrument"
            );
            self.stats.messages_dropped += 1;
            return Handled::Dropped;
        }

        match message {
            FeedMessage::Snapshot(snapshot) => self.handle_snapshot(snapshot),
            FeedMessage::L2Update(update) => self.handle_update(update),
        }
    }

    fn handle_snapshot(&mut self, snapshot: &Snapshot) -> Handled {
        let book = match OrderBook::from_snapshot(snapshot, self.precision) {
            Ok(book) => book,
            Err(e) => {
                warn!(product_id = %snapshot.product_id, error = %e, "rejecting snapshot");
                self.stats.messages_dropped += 1;
                return Handled::Dropped;
            }
        };

        let (bids, asks) = book.num_levels();
        match &self.book {
            Some(shared) => shared.replace(book),
            None => self.book = Some(SharedBook::new(book)),
        }
        self.stats.snapshots += 1;
        info!(product_id = %snapshot.product_id, bids, asks, "book seeded from snapshot");
        Handled::Seeded
    }

    fn handle_update(&mut self, update: &L2Update) -> Handled {
        let Some(book) = &self.book else {
            debug!(product_id = %update.product_id, "update before snapshot, dropping");
            self.stats.messages_dropped += 1;
            return Handled::Dropped;
        };

        let (applied, rejected) = match book.apply_update(update) {
            Ok(report) => {
                debug!(%report, "batch applied");
                (report.applied(), 0)
            }
            Err(Error::Book(err)) => {
                for rejection in &err.rejected {
                    warn!(
                        index = rejection.index,
                        error = %rejection.error,
                        "change rejected"
                    );
                }
                (err.applied, err.rejected.len())
            }
            Err(e) => {
                warn!(error = %e, "update not applied");
                self.stats.messages_dropped += 1;
                return Handled::Dropped;
            }
        };

        self.stats.batches += 1;
        self.stats.changes_applied += applied as u64;
        self.stats.changes_rejected += rejected as u64;
        info!(
            batch = book.batches_applied(),
            applied, rejected, "update batch processed"
        );
        Handled::Applied { applied, rejected }
    }

    /// Consume messages until the channel closes.
    ///
    /// `on_change` is called with the book after every snapshot and every
    /// applied batch.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelClosed`] if the channel closed before any snapshot
    /// seeded the book.
    pub async fn run<F>(
        &mut self,
        mut rx: mpsc::Receiver<FeedMessage>,
        mut on_change: F,
    ) -> Result<SessionStats, Error>
    where
        F: FnMut(&SharedBook),
    {
        while let Some(message) = rx.recv().await {
            match self.handle(&message) {
                Handled::Dropped => {}
                Handled::Seeded | Handled::Applied { .. } => {
                    if let Some(book) = &self.book {
                        on_change(book);
                    }
                }
            }
        }

        if self.book.is_none() {
            return Err(Error::ChannelClosed);
        }
        info!(stats = ?self.stats, "feed closed");
        Ok(self.stats)
    }
}

/// Spawn a task that sends a snapshot followed by `batches` updates, waiting
/// `interval` between messages, then closes the channel
pub fn spawn_feed(
    mut feed: RandomFeed,
    batches: usize,
    interval: Option<Duration>,
) -> mpsc::Receiver<FeedMessage> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        for message in feed.messages(batches) {
            if tx.send(message).await.is_err() {
                debug!("session gone, stopping feed");
                return;
            }
            if let Some(interval) = interval {
                tokio::time::sleep(interval).await;
            }
        }
    });

    rx
}
