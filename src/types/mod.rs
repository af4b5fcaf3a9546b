//! Core value types shared by the book, the feed and the reports.
//!
//! - [`change`] - Changes (typed and raw) and conversions into them
//! - [`messages`] - Feed message shapes (snapshot and incremental update)

pub mod change;
pub mod messages;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

pub use change::{Change, IntoChange, IntoLevel, RawChange, RawLevel};
pub use messages::{FeedMessage, L2Update, Snapshot};

/// Price of a level
///
/// Exact decimal rather than floating point, so two prices that round to the
/// same value compare (and hash) equal.
pub type Price = Decimal;

/// Aggregate resting size at a price
pub type Size = Decimal;

/// Book side a change applies to
///
/// `Buy` changes update the bids, `Sell` changes update the asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid side (sorted by price descending)
    Buy,
    /// Ask side (sorted by price ascending)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Feed tag for this side
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = LevelError;

    /// Parse a feed side tag (ASCII case-insensitive)
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        if tag.eq_ignore_ascii_case("buy") {
            Ok(Side::Buy)
        } else if tag.eq_ignore_ascii_case("sell") {
            Ok(Side::Sell)
        } else {
            Err(LevelError::UnknownSide(tag.to_string()))
        }
    }
}

/// A single price level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    /// Level price (unique within a side)
    pub price: Price,
    /// Aggregate size resting at `price`
    pub size: Size,
}

impl Level {
    /// Create a level
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }
}

impl From<(Price, Size)> for Level {
    fn from((price, size): (Price, Size)) -> Self {
        Self { price, size }
    }
}
