//! Core orderbook data structure.
//!
//! [`OrderBook`] owns a bid [`LevelStore`] and an ask [`LevelStore`] and is
//! the only way to mutate them. Construction and incremental updates share
//! the same upsert path, so they share the same invariants:
//!
//! - levels are unique by price within a side
//! - bids are ordered by price descending, asks ascending
//! - no level with size zero is ever retained
//! - prices and sizes are rounded to the book's [`Precision`]

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::levels::{LevelStore, Upsert};
use crate::config::Precision;
use crate::error::{BookError, Error, LevelError, Rejection};
use crate::types::{Change, IntoChange, IntoLevel, L2Update, Level, Price, Side, Size, Snapshot};

/// Level-2 order book for a single instrument.
///
/// # Design Decisions
///
/// 1. **Decimal prices**: prices and sizes are `rust_decimal::Decimal`,
///    rounded on insertion, so equal prices are exactly equal.
///
/// 2. **Replace semantics**: a change carries the new absolute size at a
///    price. Applying the same change twice is the same as applying it once.
///
/// 3. **Per-change batches**: a rejected change in a batch does not undo the
///    changes before it nor stop the ones after it; the batch result lists
///    every rejection.
///
/// # Thread Safety
///
/// This struct is `Send + Sync` but not internally synchronized. Use
/// [`SharedBook`](super::SharedBook) when readers run alongside the writer.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Instrument identifier
    instrument_id: String,

    /// Buy side, best (highest) first
    bids: LevelStore,

    /// Sell side, best (lowest) first
    asks: LevelStore,

    /// Number of update batches applied since construction
    batches_applied: u64,
}

/// Counts of what a successfully applied batch did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Levels created
    pub inserted: usize,
    /// Levels whose size changed
    pub updated: usize,
    /// Levels removed
    pub removed: usize,
    /// Changes that left the book as it was
    pub unchanged: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Updated => self.updated += 1,
            Upsert::Removed => self.removed += 1,
            Upsert::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of changes applied
    pub fn applied(&self) -> usize {
        self.inserted + self.updated + self.removed + self.unchanged
    }
}

/// Detached, ordered copy of a book's levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Instrument identifier
    pub instrument_id: String,
    /// Bid levels, highest price first
    pub bids: Vec<Level>,
    /// Ask levels, lowest price first
    pub asks: Vec<Level>,
}

impl OrderBook {
    /// Create a book from initial bid and ask levels, using the default
    /// precision (prices to 2 places, sizes to 8, half-even rounding)
    ///
    /// Levels need not be sorted or unique; a later level at the same price
    /// replaces an earlier one, and zero sizes are dropped.
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] if any initial level is invalid. No book
    /// is created in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use levelbook::OrderBook;
    /// use rust_decimal::Decimal;
    ///
    /// let d = |s: &str| s.parse::<Decimal>().unwrap();
    /// let mut book = OrderBook::new(
    ///     "BTC-USD",
    ///     [(d("100.00"), d("1.0")), (d("99.50"), d("2.0"))],
    ///     [(d("101.00"), d("1.5"))],
    /// )?;
    ///
    /// book.apply([("buy", d("100.00"), d("0")), ("sell", d("101.00"), d("3.0"))])
    ///     .expect("valid batch");
    ///
    /// assert_eq!(book.best_bid().map(|l| l.price), Some(d("99.50")));
    /// # Ok::<(), levelbook::error::LevelError>(())
    /// ```
    pub fn new<B, A>(
        instrument_id: impl Into<String>,
        bids: impl IntoIterator<Item = B>,
        asks: impl IntoIterator<Item = A>,
    ) -> Result<Self, LevelError>
    where
        B: IntoLevel,
        A: IntoLevel,
    {
        Self::with_precision(instrument_id, Precision::default(), bids, asks)
    }

    /// Create a book with an explicit precision
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] if any initial level is invalid.
    pub fn with_precision<B, A>(
        instrument_id: impl Into<String>,
        precision: Precision,
        bids: impl IntoIterator<Item = B>,
        asks: impl IntoIterator<Item = A>,
    ) -> Result<Self, LevelError>
    where
        B: IntoLevel,
        A: IntoLevel,
    {
        let mut book = Self::empty(instrument_id, precision);

        for level in bids {
            let level = level.into_level()?;
            book.bids.upsert(level.price, level.size)?;
        }
        for level in asks {
            let level = level.into_level()?;
            book.asks.upsert(level.price, level.size)?;
        }

        Ok(book)
    }

    /// Create a book with no levels
    #[must_use]
    pub fn empty(instrument_id: impl Into<String>, precision: Precision) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            bids: LevelStore::with_precision(Side::Buy, precision),
            asks: LevelStore::with_precision(Side::Sell, precision),
            batches_applied: 0,
        }
    }

    /// Create a book from a feed snapshot message
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] if any level in the snapshot is invalid.
    pub fn from_snapshot(snapshot: &Snapshot, precision: Precision) -> Result<Self, LevelError> {
        Self::with_precision(
            snapshot.product_id.clone(),
            precision,
            &snapshot.bids,
            &snapshot.asks,
        )
    }

    /// Get the instrument identifier
    #[must_use]
    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    /// Get the rounding applied on insertion
    #[must_use]
    pub fn precision(&self) -> Precision {
        self.bids.precision()
    }

    /// Number of update batches applied since construction
    #[must_use]
    pub const fn batches_applied(&self) -> u64 {
        self.batches_applied
    }

    /// Apply a single change
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] for a bad price or size.
    pub fn apply_change(&mut self, change: Change) -> Result<Upsert, LevelError> {
        self.side_mut(change.side).upsert(change.price, change.size)
    }

    /// Apply a batch of changes in order.
    ///
    /// Each change is applied independently: a rejected change (unknown side
    /// tag, invalid price or size) is recorded and skipped, and processing
    /// continues with the next one. When the same price appears more than once
    /// on a side, the last change wins.
    ///
    /// # Errors
    ///
    /// [`BookError`] listing every rejected change. All other changes of the
    /// batch have been applied when it is returned.
    pub fn apply<I>(&mut self, changes: I) -> Result<BatchReport, BookError>
    where
        I: IntoIterator,
        I::Item: IntoChange,
    {
        let mut report = BatchReport::default();
        let mut rejected = Vec::new();

        for (index, change) in changes.into_iter().enumerate() {
            match change
                .into_change()
                .and_then(|change| self.apply_change(change))
            {
                Ok(outcome) => report.record(outcome),
                Err(error) => rejected.push(Rejection { index, error }),
            }
        }

        self.batches_applied += 1;

        if rejected.is_empty() {
            Ok(report)
        } else {
            Err(BookError {
                applied: report.applied(),
                rejected,
            })
        }
    }

    /// Apply a feed update message
    ///
    /// # Errors
    ///
    /// [`Error::InstrumentMismatch`] if the message is for another instrument
    /// (nothing is applied), otherwise [`Error::Book`] as for [`Self::apply`].
    pub fn apply_update(&mut self, update: &L2Update) -> Result<BatchReport, Error> {
        if update.product_id != self.instrument_id {
            return Err(Error::InstrumentMismatch {
                expected: self.instrument_id.clone(),
                got: update.product_id.clone(),
            });
        }
        Ok(self.apply(&update.changes)?)
    }

    /// Ordered copy of both sides
    #[must_use]
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            instrument_id: self.instrument_id.clone(),
            bids: self.bids.snapshot(),
            asks: self.asks.snapshot(),
        }
    }

    /// Get the bid side
    #[must_use]
    pub fn bids(&self) -> &LevelStore {
        &self.bids
    }

    /// Get the ask side
    #[must_use]
    pub fn asks(&self) -> &LevelStore {
        &self.asks
    }

    /// Get one side of the book
    #[must_use]
    pub fn side(&self, side: Side) -> &LevelStore {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut LevelStore {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Get the best bid (highest price)
    #[must_use]
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.best()
    }

    /// Get the best ask (lowest price)
    #[must_use]
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.best()
    }

    /// Get the mid price
    ///
    /// Returns the average of best bid and best ask, or `None` if either is
    /// missing or their sum does not fit in a `Decimal`.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        let (bid, ask) = (self.best_bid()?, self.best_ask()?);
        bid.price.checked_add(ask.price)?.checked_div(Decimal::TWO)
    }

    /// Get the spread (best ask minus best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Check if the book is crossed (best bid >= best ask)
    ///
    /// Cross prevention is the feed's job; this is for validation only.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }

    /// Get the top N bid levels
    #[must_use]
    pub fn top_bids(&self, n: usize) -> Vec<Level> {
        self.bids.top(n)
    }

    /// Get the top N ask levels
    #[must_use]
    pub fn top_asks(&self, n: usize) -> Vec<Level> {
        self.asks.top(n)
    }

    /// Get total bid size (`None` on overflow)
    #[must_use]
    pub fn total_bid_size(&self) -> Option<Size> {
        self.bids.total_size()
    }

    /// Get total ask size (`None` on overflow)
    #[must_use]
    pub fn total_ask_size(&self) -> Option<Size> {
        self.asks.total_size()
    }

    /// Check if the book has no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get the number of price levels as `(bids, asks)`
    #[must_use]
    pub fn num_levels(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}

impl BookSnapshot {
    /// Keep only the best `depth` levels per side
    #[must_use]
    pub fn truncated(mut self, depth: usize) -> Self {
        self.bids.truncate(depth);
        self.asks.truncate(depth);
        self
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} removed, {} unchanged",
            self.inserted, self.updated, self.removed, self.unchanged
        )
    }
}
