//! Configuration for the book, the random feed and the demo binary.
//!
//! This module provides [`Precision`] (rounding applied at insertion),
//! [`FeedConfig`] (shape of the generated market data) and [`Config`], which
//! bundles both for the binary and can be read from `LEVELBOOK_*` variables.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::Error;

/// Rounding rule applied to prices and sizes at insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingRule {
    /// Round half to even (banker's rounding): `100.005` -> `100.00`
    #[default]
    HalfEven,
    /// Round half away from zero: `100.005` -> `100.01`
    HalfUp,
}

impl RoundingRule {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingRule::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingRule::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

impl std::str::FromStr for RoundingRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "half-even" | "bankers" => Ok(RoundingRule::HalfEven),
            "half-up" => Ok(RoundingRule::HalfUp),
            other => Err(Error::Config(format!("unknown rounding rule: {other}"))),
        }
    }
}

/// Decimal places kept for prices and sizes
///
/// # Example
///
/// ```rust
/// use levelbook::config::{Precision, RoundingRule};
/// use rust_decimal::Decimal;
///
/// let precision = Precision::default().with_rounding(RoundingRule::HalfUp);
/// let price: Decimal = "100.005".parse().unwrap();
/// assert_eq!(precision.round_price(price).to_string(), "100.01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    price_dp: u32,
    size_dp: u32,
    rounding: RoundingRule,
}

impl Precision {
    /// Default price precision (cents)
    pub const PRICE_DP: u32 = 2;
    /// Default size precision
    pub const SIZE_DP: u32 = 8;

    /// Set the number of decimal places kept for prices
    #[must_use]
    pub fn with_price_dp(mut self, dp: u32) -> Self {
        self.price_dp = dp;
        self
    }

    /// Set the number of decimal places kept for sizes
    #[must_use]
    pub fn with_size_dp(mut self, dp: u32) -> Self {
        self.size_dp = dp;
        self
    }

    /// Set the rounding rule
    #[must_use]
    pub fn with_rounding(mut self, rounding: RoundingRule) -> Self {
        self.rounding = rounding;
        self
    }

    /// Decimal places kept for prices
    pub fn price_dp(&self) -> u32 {
        self.price_dp
    }

    /// Decimal places kept for sizes
    pub fn size_dp(&self) -> u32 {
        self.size_dp
    }

    /// Rounding rule in effect
    pub fn rounding(&self) -> RoundingRule {
        self.rounding
    }

    /// Round a price to the configured precision
    pub fn round_price(&self, price: Decimal) -> Decimal {
        price.round_dp_with_strategy(self.price_dp, self.rounding.strategy())
    }

    /// Round a size to the configured precision
    pub fn round_size(&self, size: Decimal) -> Decimal {
        size.round_dp_with_strategy(self.size_dp, self.rounding.strategy())
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            price_dp: Self::PRICE_DP,
            size_dp: Self::SIZE_DP,
            rounding: RoundingRule::default(),
        }
    }
}

/// Shape of the data produced by the random feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Instrument the feed publishes
    pub product_id: String,
    /// Bid levels in the initial snapshot
    pub initial_bids: usize,
    /// Ask levels in the initial snapshot
    pub initial_asks: usize,
    /// Changes per update batch
    pub changes_per_batch: usize,
    /// Lower bound of generated prices (whole units, inclusive)
    pub price_min: u32,
    /// Upper bound of generated prices (whole units, exclusive)
    pub price_max: u32,
    /// Upper bound of generated sizes (whole units, inclusive)
    pub size_max: u32,
    /// Seed for reproducible output; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl FeedConfig {
    /// Create a feed configuration for an instrument with default ranges
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            ..Self::default()
        }
    }

    /// Set the initial snapshot depth per side
    #[must_use]
    pub fn with_depth(mut self, bids: usize, asks: usize) -> Self {
        self.initial_bids = bids;
        self.initial_asks = asks;
        self
    }

    /// Set the number of changes per batch
    #[must_use]
    pub fn with_changes_per_batch(mut self, n: usize) -> Self {
        self.changes_per_batch = n;
        self
    }

    /// Set the seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            product_id: "BTC-USD".to_string(),
            initial_bids: 5,
            initial_asks: 5,
            changes_per_batch: 5,
            price_min: 10_000,
            price_max: 20_000,
            size_max: 1,
            seed: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// How the demo binary prints the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Centred Price | Quantity tables
    #[default]
    Table,
    /// Pretty-printed JSON snapshots
    Json,
}

/// Configuration for the demo binary
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Rounding applied by the book
    pub precision: Precision,
    /// Random feed settings
    pub feed: FeedConfig,
    /// Number of update batches to apply after the snapshot
    pub batches: usize,
    /// Levels per side shown in reports (`None` shows all)
    pub report_depth: Option<usize>,
    /// Report output format
    pub report_format: ReportFormat,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Read the configuration from `LEVELBOOK_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Recognised keys: `LEVELBOOK_PRODUCT_ID`, `LEVELBOOK_BATCHES`,
    /// `LEVELBOOK_CHANGES`, `LEVELBOOK_DEPTH`, `LEVELBOOK_SEED`,
    /// `LEVELBOOK_ROUNDING`, `LEVELBOOK_REPORT`, `LEVELBOOK_REPORT_DEPTH`,
    /// `LEVELBOOK_LOG` and `LEVELBOOK_LOG_FORMAT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(id) = lookup("LEVELBOOK_PRODUCT_ID") {
            config.feed.product_id = id;
        }
        if let Some(n) = parse_var(&lookup, "LEVELBOOK_BATCHES")? {
            config.batches = n;
        }
        if let Some(n) = parse_var(&lookup, "LEVELBOOK_CHANGES")? {
            config.feed.changes_per_batch = n;
        }
        if let Some(n) = parse_var(&lookup, "LEVELBOOK_DEPTH")? {
            config.feed.initial_bids = n;
            config.feed.initial_asks = n;
        }
        if let Some(seed) = parse_var(&lookup, "LEVELBOOK_SEED")? {
            config.feed.seed = Some(seed);
        }
        if let Some(rule) = lookup("LEVELBOOK_ROUNDING") {
            config.precision = config.precision.with_rounding(rule.parse()?);
        }
        if let Some(format) = lookup("LEVELBOOK_REPORT") {
            config.report_format = match format.as_str() {
                "json" => ReportFormat::Json,
                "table" => ReportFormat::Table,
                other => return Err(Error::Config(format!("unknown report format: {other}"))),
            };
        }
        if let Some(n) = parse_var(&lookup, "LEVELBOOK_REPORT_DEPTH")? {
            config.report_depth = Some(n);
        }
        if let Some(level) = lookup("LEVELBOOK_LOG") {
            config.log_level = level;
        }
        if let Some(format) = lookup("LEVELBOOK_LOG_FORMAT") {
            config.log_format = match format.as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => return Err(Error::Config(format!("unknown log format: {other}"))),
            };
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            feed: FeedConfig::default(),
            batches: 3,
            report_depth: None,
            report_format: ReportFormat::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key}: cannot parse {raw:?}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_precision() {
        let precision = Precision::default();
        assert_eq!(precision.price_dp(), 2);
        assert_eq!(precision.size_dp(), 8);
        assert_eq!(precision.rounding(), RoundingRule::HalfEven);
    }

    #[test]
    fn test_half_even_rounding() {
        let precision = Precision::default();
        assert_eq!(precision.round_price(dec!(100.005)), dec!(100.00));
        assert_eq!(precision.round_price(dec!(100.015)), dec!(100.02));
        assert_eq!(precision.round_size(dec!(0.123456785)), dec!(0.12345678));
    }

    #[test]
    fn test_half_up_rounding() {
        let precision = Precision::default().with_rounding(RoundingRule::HalfUp);
        assert_eq!(precision.round_price(dec!(100.005)), dec!(100.01));
        assert_eq!(precision.round_size(dec!(0.123456785)), dec!(0.12345679));
    }

    #[test]
    fn test_rounding_rule_from_str() {
        assert_eq!("half_even".parse::<RoundingRule>().unwrap(), RoundingRule::HalfEven);
        assert_eq!("HALF-UP".parse::<RoundingRule>().unwrap(), RoundingRule::HalfUp);
        assert!("ceiling".parse::<RoundingRule>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.feed.product_id, "BTC-USD");
        assert_eq!(config.batches, 3);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("LEVELBOOK_PRODUCT_ID", "ETH-USD"),
            ("LEVELBOOK_BATCHES", "7"),
            ("LEVELBOOK_SEED", "42"),
            ("LEVELBOOK_ROUNDING", "half-up"),
            ("LEVELBOOK_LOG_FORMAT", "json"),
            ("LEVELBOOK_REPORT", "json"),
            ("LEVELBOOK_REPORT_DEPTH", "3"),
        ]))
        .unwrap();

        assert_eq!(config.feed.product_id, "ETH-USD");
        assert_eq!(config.batches, 7);
        assert_eq!(config.feed.seed, Some(42));
        assert_eq!(config.precision.rounding(), RoundingRule::HalfUp);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.report_format, ReportFormat::Json);
        assert_eq!(config.report_depth, Some(3));
    }

    #[test]
    fn test_config_rejects_bad_number() {
        let err = Config::from_lookup(lookup_from(&[("LEVELBOOK_BATCHES", "many")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("LEVELBOOK_BATCHES"));
    }

    #[test]
    fn test_feed_builder() {
        let feed = FeedConfig::new("SOL-USD")
            .with_depth(3, 4)
            .with_changes_per_batch(8)
            .with_seed(7);
        assert_eq!(feed.product_id, "SOL-USD");
        assert_eq!((feed.initial_bids, feed.initial_asks), (3, 4));
        assert_eq!(feed.changes_per_batch, 8);
        assert_eq!(feed.seed, Some(7));
    }
}
