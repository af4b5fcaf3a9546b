//! Feed message types.
//!
//! These mirror the shape of a typical exchange level-2 channel: one full
//! snapshot when the subscription starts, followed by incremental updates.
//! Prices and sizes are accepted as JSON strings or numbers.
//!
//! ```json
//! {"type": "snapshot", "product_id": "BTC-USD", "bids": [["100.00", "1.0"]], "asks": [["101.00", "1.5"]]}
//! {"type": "l2update", "product_id": "BTC-USD", "changes": [["buy", "100.00", "0"]]}
//! ```

use serde::{Deserialize, Serialize};

use super::change::{RawChange, RawLevel};

/// Message received from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Full book state
    Snapshot(Snapshot),
    /// Incremental update
    #[serde(rename = "l2update")]
    L2Update(L2Update),
}

impl FeedMessage {
    /// Instrument the message is for
    pub fn product_id(&self) -> &str {
        match self {
            FeedMessage::Snapshot(s) => &s.product_id,
            FeedMessage::L2Update(u) => &u.product_id,
        }
    }
}

/// Full book state for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Instrument identifier
    pub product_id: String,
    /// Bid levels: [[price, size], ...]
    pub bids: Vec<RawLevel>,
    /// Ask levels: [[price, size], ...]
    pub asks: Vec<RawLevel>,
}

/// Batch of changes for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L2Update {
    /// Instrument identifier
    pub product_id: String,
    /// Changes in the order they must be applied: [[side, price, size], ...]
    pub changes: Vec<RawChange>,
}
