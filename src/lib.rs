//! # levelbook
//!
//! An in-memory level-2 order book for a single instrument, kept up to date
//! from a stream of buy/sell changes.
//!
//! ## Features
//!
//! - **Price-level ledger** - bids descending, asks ascending, unique by price
//! - **Replace semantics** - each change states the new absolute size; zero removes
//! - **Exact decimals** - `rust_decimal` prices (2 dp) and sizes (8 dp), rounded on insertion
//! - **Partial batches** - a bad change is reported without losing the rest of the batch
//! - **Consistent reads** - [`SharedBook`] never exposes a half-applied batch
//!
//! ## Quick Start
//!
//! ```rust
//! use levelbook::OrderBook;
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new(
//!     "BTC-USD",
//!     [(dec!(100.00), dec!(1.0)), (dec!(99.50), dec!(2.0))],
//!     [(dec!(101.00), dec!(1.5))],
//! )?;
//!
//! // "hold" is not a side: that change is rejected, the others are applied
//! let err = book
//!     .apply([
//!         ("buy", dec!(100.00), dec!(0.0)),
//!         ("hold", dec!(100.50), dec!(1.0)),
//!         ("sell", dec!(101.00), dec!(3.0)),
//!     ])
//!     .unwrap_err();
//! assert_eq!(err.rejected_indices(), vec![1]);
//!
//! let snapshot = book.snapshot();
//! assert_eq!(snapshot.bids[0].price, dec!(99.50));
//! assert_eq!(snapshot.asks[0].size, dec!(3.0));
//! # Ok::<(), levelbook::error::LevelError>(())
//! ```
//!
//! ## Rounding
//!
//! Prices are rounded to 2 decimal places and sizes to 8 using round half to
//! even, so `100.005` is stored as `100.00` every time. Raw prices that round
//! to the same value address the same level. See [`config::Precision`].
//!
//! ## Architecture
//!
//! - [`orderbook`] - the level stores, the book and the shared handle
//! - [`types`] - sides, levels, changes and feed messages
//! - [`feed`] - random feed generator
//! - [`session`] - async single-writer loop feeding a book from a channel
//! - [`report`] - table and JSON rendering of snapshots
//! - [`config`] - precision, feed and binary configuration
//! - [`error`] - error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod feed;
pub mod orderbook;
pub mod report;
pub mod session;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::{Config, Precision, RoundingRule};
pub use error::{BookError, Error, LevelError};
pub use orderbook::{BookSnapshot, OrderBook, SharedBook};
pub use types::{Change, Level, Side};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
