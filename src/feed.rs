//! Random market data feed.
//!
//! Stands in for an exchange websocket: produces one initial [`Snapshot`] and
//! then any number of [`L2Update`] batches with random buy/sell changes.
//! Prices are drawn uniformly from the configured range with six decimal
//! places and sizes with twelve, so the book's rounding is always exercised.
//! Sizes can come out as exactly zero, which removes a level.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::config::FeedConfig;
use crate::types::{FeedMessage, L2Update, RawChange, RawLevel, Side, Snapshot};

const PRICE_SCALE: u32 = 6;
const SIZE_SCALE: u32 = 12;

/// Seedable generator of feed messages
#[derive(Debug)]
pub struct RandomFeed {
    config: FeedConfig,
    rng: StdRng,
}

impl RandomFeed {
    /// Create a feed; uses `config.seed` when set
    pub fn new(config: FeedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Feed settings
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Generate an initial snapshot with the configured depth
    pub fn initial_state(&mut self) -> Snapshot {
        let bids = (0..self.config.initial_bids)
            .map(|_| self.random_level())
            .collect();
        let asks = (0..self.config.initial_asks)
            .map(|_| self.random_level())
            .collect();

        Snapshot {
            product_id: self.config.product_id.clone(),
            bids,
            asks,
        }
    }

    /// Generate a batch of `n` random changes
    pub fn random_change(&mut self, n: usize) -> L2Update {
        let changes = (0..n)
            .map(|_| {
                let side = if self.rng.gen_bool(0.5) {
                    Side::Buy
                } else {
                    Side::Sell
                };
                let RawLevel(price, size) = self.random_level();
                RawChange::new(side.as_str(), price, size)
            })
            .collect();

        L2Update {
            product_id: self.config.product_id.clone(),
            changes,
        }
    }

    /// Generate a batch with the configured number of changes
    pub fn next_update(&mut self) -> L2Update {
        self.random_change(self.config.changes_per_batch)
    }

    /// Snapshot followed by `batches` updates, as feed messages
    pub fn messages(&mut self, batches: usize) -> Vec<FeedMessage> {
        let mut messages = Vec::with_capacity(batches + 1);
        messages.push(FeedMessage::Snapshot(self.initial_state()));
        for _ in 0..batches {
            messages.push(FeedMessage::L2Update(self.next_update()));
        }
        messages
    }

    // Mantissas are drawn in i128: u32 bounds scaled by 10^12 overflow i64
    // but stay well inside a Decimal's 96 bits.
    fn random_level(&mut self) -> RawLevel {
        let price_unit = 10i128.pow(PRICE_SCALE);
        let lo = i128::from(self.config.price_min) * price_unit;
        let hi = (i128::from(self.config.price_max) * price_unit).max(lo + 1);
        let price = Decimal::from_i128_with_scale(self.rng.gen_range(lo..hi), PRICE_SCALE);

        let size_hi = i128::from(self.config.size_max) * 10i128.pow(SIZE_SCALE);
        let size = Decimal::from_i128_with_scale(self.rng.gen_range(0..=size_hi), SIZE_SCALE);

        RawLevel(price, size)
    }
}
