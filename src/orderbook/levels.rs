//! One side of the book: price levels unique by price, kept in price order.
//!
//! Each store keeps two structures in sync:
//!
//! - an `FxHashMap` from price to size for O(1) lookup and replacement
//! - a `BTreeSet` of prices for ordered iteration, O(log n) insert/remove
//!   and O(1)-ish access to the best price
//!
//! Every mutation goes through [`LevelStore::upsert`], which validates and
//! rounds its input before touching either structure, so the two never
//! disagree and no zero-size level is ever retained.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::config::Precision;
use crate::error::{LevelError, LevelField};
use crate::types::{Level, Price, Side, Size};

/// Outcome of a single upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new level was created
    Inserted,
    /// An existing level got a new size
    Updated,
    /// An existing level was removed (size zero)
    Removed,
    /// Nothing changed: same size as before, or a removal of an absent level
    Unchanged,
}

/// Price levels for one side of an order book.
///
/// Bids iterate from the highest price down, asks from the lowest price up.
#[derive(Debug, Clone)]
pub struct LevelStore {
    side: Side,
    precision: Precision,
    /// price -> size
    sizes: FxHashMap<Price, Size>,
    /// Ascending; bids are read in reverse
    prices: BTreeSet<Price>,
}

impl LevelStore {
    /// Create an empty store for `side` with the default precision
    pub fn new(side: Side) -> Self {
        Self::with_precision(side, Precision::default())
    }

    /// Create an empty store for `side`
    pub fn with_precision(side: Side, precision: Precision) -> Self {
        Self {
            side,
            precision,
            sizes: FxHashMap::default(),
            prices: BTreeSet::new(),
        }
    }

    /// Side this store holds
    pub fn side(&self) -> Side {
        self.side
    }

    /// Rounding applied on insertion
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Check and round a raw (price, size) pair without modifying the store
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] if the price is not positive or the size
    /// is negative, before or after rounding.
    pub fn normalize(&self, price: Price, size: Size) -> Result<Level, LevelError> {
        if price <= Decimal::ZERO {
            return Err(LevelError::invalid(LevelField::Price, price, "not positive"));
        }
        if size.is_sign_negative() && !size.is_zero() {
            return Err(LevelError::invalid(LevelField::Size, size, "negative"));
        }

        let rounded = self.precision.round_price(price);
        if rounded.is_zero() {
            return Err(LevelError::invalid(
                LevelField::Price,
                price,
                "zero after rounding",
            ));
        }
        // -0 and sizes below the size precision collapse to zero
        let size = self.precision.round_size(size);
        let size = if size.is_zero() { Decimal::ZERO } else { size };

        Ok(Level::new(rounded, size))
    }

    /// Insert, replace or remove the level at `price`.
    ///
    /// `size` is the new absolute size; zero removes the level. Both values
    /// are rounded first, so raw prices that round to the same value address
    /// the same level.
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] for a non-positive price or negative
    /// size. The store is left untouched in that case.
    pub fn upsert(&mut self, price: Price, size: Size) -> Result<Upsert, LevelError> {
        let level = self.normalize(price, size)?;
        Ok(self.upsert_normalized(level))
    }

    fn upsert_normalized(&mut self, level: Level) -> Upsert {
        let Level { price, size } = level;

        if size.is_zero() {
            return match self.sizes.remove(&price) {
                Some(_) => {
                    self.prices.remove(&price);
                    Upsert::Removed
                }
                None => Upsert::Unchanged,
            };
        }

        match self.sizes.insert(price, size) {
            Some(previous) if previous == size => Upsert::Unchanged,
            Some(_) => Upsert::Updated,
            None => {
                self.prices.insert(price);
                Upsert::Inserted
            }
        }
    }

    /// Size resting at `price` (after rounding `price`)
    #[must_use]
    pub fn get(&self, price: Price) -> Option<Size> {
        self.sizes
            .get(&self.precision.round_price(price))
            .copied()
    }

    /// Best level: highest bid or lowest ask
    #[must_use]
    pub fn best(&self) -> Option<Level> {
        let price = match self.side {
            Side::Buy => self.prices.last(),
            Side::Sell => self.prices.first(),
        }?;
        self.level_at(*price)
    }

    fn level_at(&self, price: Price) -> Option<Level> {
        self.sizes.get(&price).map(|&size| Level::new(price, size))
    }

    /// Levels in book order (best first)
    pub fn iter(&self) -> Box<dyn Iterator<Item = Level> + '_> {
        let sizes = &self.sizes;
        let lookup = move |price: &Price| {
            sizes
                .get(price)
                .map(|&size| Level::new(*price, size))
        };
        match self.side {
            Side::Buy => Box::new(self.prices.iter().rev().filter_map(lookup)),
            Side::Sell => Box::new(self.prices.iter().filter_map(lookup)),
        }
    }

    /// Ordered copy of all levels (best first)
    #[must_use]
    pub fn snapshot(&self) -> Vec<Level> {
        self.iter().collect()
    }

    /// First `n` levels (best first)
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<Level> {
        self.iter().take(n).collect()
    }

    /// Sum of the sizes of all levels
    ///
    /// `None` if the sum does not fit in a `Decimal`.
    #[must_use]
    pub fn total_size(&self) -> Option<Size> {
        self.sizes
            .values()
            .try_fold(Decimal::ZERO, |acc, &size| acc.checked_add(size))
    }

    /// Number of levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if the store has no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Remove all levels
    pub fn clear(&mut self) {
        self.sizes.clear();
        self.prices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(store: &LevelStore) -> Vec<Price> {
        store.iter().map(|l| l.price).collect()
    }

    #[test]
    fn test_bids_descending() {
        let mut bids = LevelStore::new(Side::Buy);
        bids.upsert(dec!(99.5), dec!(2)).unwrap();
        bids.upsert(dec!(100), dec!(1)).unwrap();
        bids.upsert(dec!(98), dec!(3)).unwrap();

        assert_eq!(prices(&bids), vec![dec!(100), dec!(99.5), dec!(98)]);
        assert_eq!(bids.best(), Some(Level::new(dec!(100), dec!(1))));
    }

    #[test]
    fn test_asks_ascending() {
        let mut asks = LevelStore::new(Side::Sell);
        asks.upsert(dec!(102), dec!(1)).unwrap();
        asks.upsert(dec!(101), dec!(1)).unwrap();

        assert_eq!(prices(&asks), vec![dec!(101), dec!(102)]);
        assert_eq!(asks.best().map(|l| l.price), Some(dec!(101)));
    }

    #[test]
    fn test_upsert_outcomes() {
        let mut bids = LevelStore::new(Side::Buy);

        assert_eq!(bids.upsert(dec!(100), dec!(1)), Ok(Upsert::Inserted));
        assert_eq!(bids.upsert(dec!(100), dec!(2)), Ok(Upsert::Updated));
        assert_eq!(bids.upsert(dec!(100), dec!(2)), Ok(Upsert::Unchanged));
        assert_eq!(bids.upsert(dec!(100), dec!(0)), Ok(Upsert::Removed));
        assert_eq!(bids.upsert(dec!(100), dec!(0)), Ok(Upsert::Unchanged));
        assert!(bids.is_empty());
    }

    #[test]
    fn test_replace_not_append() {
        let mut asks = LevelStore::new(Side::Sell);
        asks.upsert(dec!(101), dec!(1.5)).unwrap();
        asks.upsert(dec!(101), dec!(3)).unwrap();

        assert_eq!(asks.len(), 1);
        assert_eq!(asks.get(dec!(101)), Some(dec!(3)));
    }

    #[test]
    fn test_prices_collapse_after_rounding() {
        let mut bids = LevelStore::new(Side::Buy);
        bids.upsert(dec!(100.001), dec!(1)).unwrap();
        bids.upsert(dec!(99.999), dec!(4)).unwrap();

        assert_eq!(bids.len(), 1);
        assert_eq!(bids.get(dec!(100)), Some(dec!(4)));
    }

    #[test]
    fn test_midpoint_uses_half_even() {
        let mut bids = LevelStore::new(Side::Buy);
        bids.upsert(dec!(100.005), dec!(1)).unwrap();
        bids.upsert(dec!(100.005), dec!(2)).unwrap();

        assert_eq!(bids.snapshot(), vec![Level::new(dec!(100.00), dec!(2))]);
    }

    #[test]
    fn test_dust_size_removes_level() {
        let mut asks = LevelStore::new(Side::Sell);
        asks.upsert(dec!(101), dec!(1)).unwrap();
        assert_eq!(
            asks.upsert(dec!(101), dec!(0.000000001)),
            Ok(Upsert::Removed)
        );
        assert!(asks.is_empty());
    }

    #[test]
    fn test_rejects_invalid_levels() {
        let mut bids = LevelStore::new(Side::Buy);
        bids.upsert(dec!(100), dec!(1)).unwrap();

        let err = bids.upsert(dec!(-1), dec!(1)).unwrap_err();
        assert!(matches!(
            err,
            LevelError::InvalidLevel {
                field: LevelField::Price,
                ..
            }
        ));

        let err = bids.upsert(dec!(100), dec!(-0.5)).unwrap_err();
        assert!(matches!(
            err,
            LevelError::InvalidLevel {
                field: LevelField::Size,
                ..
            }
        ));

        assert!(bids.upsert(dec!(0.001), dec!(1)).is_err());

        // Rejected upserts leave the store alone
        assert_eq!(bids.snapshot(), vec![Level::new(dec!(100), dec!(1))]);
    }

    #[test]
    fn test_top_and_total() {
        let mut bids = LevelStore::new(Side::Buy);
        bids.upsert(dec!(45), dec!(100)).unwrap();
        bids.upsert(dec!(44), dec!(200)).unwrap();
        bids.upsert(dec!(43), dec!(300)).unwrap();

        let top = bids.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], Level::new(dec!(45), dec!(100)));
        assert_eq!(top[1], Level::new(dec!(44), dec!(200)));
        assert_eq!(bids.total_size(), Some(dec!(600)));

        bids.clear();
        assert!(bids.is_empty());
        assert_eq!(bids.best(), None);
        assert_eq!(bids.total_size(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_total_size_overflow() {
        let mut asks = LevelStore::new(Side::Sell);
        let half = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        asks.upsert(dec!(1), half).unwrap();
        asks.upsert(dec!(2), half).unwrap();

        assert_eq!(asks.len(), 2);
        assert_eq!(asks.total_size(), None);
    }
}
