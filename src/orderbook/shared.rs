//! Shared handle to an order book with a per-batch consistency boundary.
//!
//! [`SharedBook`] wraps an [`OrderBook`] in `Arc<parking_lot::RwLock<_>>`.
//! A batch is applied while holding the write lock and snapshots are taken
//! under the read lock, so a reader sees either the complete pre-batch or the
//! complete post-batch state, never a partially applied batch.
//!
//! Only one task should write to a given book; the lock orders readers
//! against that writer, it does not reconcile concurrent writers.

use std::sync::Arc;

use parking_lot::RwLock;

use super::book::{BatchReport, BookSnapshot, OrderBook};
use crate::error::{BookError, Error};
use crate::types::{IntoChange, L2Update, Level};

/// Cloneable, thread-safe handle to one order book.
///
/// # Example
///
/// ```rust
/// use levelbook::orderbook::{OrderBook, SharedBook};
/// use rust_decimal::Decimal;
///
/// let book = OrderBook::new("BTC-USD", [(Decimal::ONE_HUNDRED, Decimal::ONE)], Vec::<(Decimal, Decimal)>::new())?;
/// let shared = SharedBook::new(book);
///
/// let reader = shared.clone();
/// std::thread::spawn(move || {
///     let snap = reader.snapshot();
///     assert!(snap.bids.len() <= 1);
/// })
/// .join()
/// .unwrap();
/// # Ok::<(), levelbook::error::LevelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SharedBook {
    inner: Arc<RwLock<OrderBook>>,
}

impl SharedBook {
    /// Wrap a book
    pub fn new(book: OrderBook) -> Self {
        Self {
            inner: Arc::new(RwLock::new(book)),
        }
    }

    /// Apply a batch atomically with respect to readers
    ///
    /// The iterator is drained before the write lock is taken, so it may
    /// itself read this book.
    ///
    /// # Errors
    ///
    /// [`BookError`] as for [`OrderBook::apply`].
    pub fn apply<I>(&self, changes: I) -> Result<BatchReport, BookError>
    where
        I: IntoIterator,
        I::Item: IntoChange,
    {
        let changes: Vec<I::Item> = changes.into_iter().collect();
        self.inner.write().apply(changes)
    }

    /// Apply a feed update message atomically with respect to readers
    ///
    /// # Errors
    ///
    /// As for [`OrderBook::apply_update`].
    pub fn apply_update(&self, update: &L2Update) -> Result<BatchReport, Error> {
        self.inner.write().apply_update(update)
    }

    /// Replace the whole book (used when the feed resends a snapshot)
    pub fn replace(&self, book: OrderBook) {
        *self.inner.write() = book;
    }

    /// Ordered copy of both sides, taken between batches
    pub fn snapshot(&self) -> BookSnapshot {
        self.inner.read().snapshot()
    }

    /// Instrument identifier
    pub fn instrument_id(&self) -> String {
        self.inner.read().instrument_id().to_string()
    }

    /// Best bid
    pub fn best_bid(&self) -> Option<Level> {
        self.inner.read().best_bid()
    }

    /// Best ask
    pub fn best_ask(&self) -> Option<Level> {
        self.inner.read().best_ask()
    }

    /// Number of update batches applied
    pub fn batches_applied(&self) -> u64 {
        self.inner.read().batches_applied()
    }

    /// Run `f` against the book under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&OrderBook) -> R) -> R {
        f(&self.inner.read())
    }

    /// Clone the current book state
    pub fn to_book(&self) -> OrderBook {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Change;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::thread;

    fn empty_shared() -> SharedBook {
        SharedBook::new(OrderBook::empty("TEST", Default::default()))
    }

    #[test]
    fn test_apply_and_read() {
        let shared = empty_shared();
        shared
            .apply([Change::buy(dec!(100), dec!(1)), Change::sell(dec!(101), dec!(2))])
            .unwrap();

        assert_eq!(shared.best_bid().map(|l| l.price), Some(dec!(100)));
        assert_eq!(shared.best_ask().map(|l| l.size), Some(dec!(2)));
        assert_eq!(shared.batches_applied(), 1);
        assert_eq!(shared.read(|b| b.num_levels()), (1, 1));
    }

    #[test]
    fn test_clones_share_book() {
        let shared = empty_shared();
        let other = shared.clone();
        other.apply([Change::buy(dec!(10), dec!(1))]).unwrap();
        assert_eq!(shared.snapshot().bids.len(), 1);
    }

    #[test]
    fn test_replace() {
        let shared = empty_shared();
        shared.apply([Change::buy(dec!(10), dec!(1))]).unwrap();
        shared.replace(OrderBook::empty("OTHER", Default::default()));
        assert_eq!(shared.instrument_id(), "OTHER");
        assert!(shared.to_book().is_empty());
    }

    #[test]
    fn test_apply_lazy_changes_reading_same_book() {
        let shared = empty_shared();
        shared.apply([Change::buy(dec!(100), dec!(1))]).unwrap();

        // Each change is derived from the book at the time it is produced
        let changes = (1..=3u32).map(|i| {
            let best = shared.best_bid().map_or(Decimal::ZERO, |l| l.price);
            Change::buy(best - Decimal::from(i), Decimal::from(i))
        });
        let report = shared.apply(changes).unwrap();

        assert_eq!(report.inserted, 3);
        let prices: Vec<_> = shared.snapshot().bids.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![dec!(100), dec!(99), dec!(98), dec!(97)]);
    }

    #[test]
    fn test_readers_never_see_partial_batch() {
        let shared = empty_shared();

        // Every batch sets all ten bid levels to the batch number, so a
        // consistent snapshot has equal sizes at every level.
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for batch in 1..=200u32 {
                    let size = Decimal::from(batch);
                    let changes: Vec<Change> = (1..=10u32)
                        .map(|p| Change::buy(Decimal::from(p), size))
                        .collect();
                    shared.apply(changes).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = shared.snapshot();
                        if let Some(first) = snap.bids.first() {
                            assert_eq!(snap.bids.len(), 10);
                            assert!(snap.bids.iter().all(|l| l.size == first.size));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(shared.batches_applied(), 200);
    }
}
