//! Price-level ledger for one instrument.
//!
//! This module provides the order book itself:
//!
//! - [`LevelStore`] - one side's levels, unique by price and kept in order
//! - [`OrderBook`] - bids and asks, updated by batches of changes
//! - [`SharedBook`] - lock-protected handle for concurrent readers
//!
//! Nothing in this module logs or prints; errors are returned to the caller.
//!
//! # Example
//!
//! ```rust
//! use levelbook::orderbook::OrderBook;
//! use levelbook::types::Change;
//! use rust_decimal::Decimal;
//!
//! let mut book = OrderBook::empty("BTC-USD", Default::default());
//!
//! book.apply([
//!     Change::buy(Decimal::new(10000, 2), Decimal::ONE),
//!     Change::sell(Decimal::new(10100, 2), Decimal::TWO),
//! ])
//! .unwrap();
//!
//! if let Some(bid) = book.best_bid() {
//!     println!("Best bid: {} @ {}", bid.size, bid.price);
//! }
//! ```

pub mod book;
pub mod levels;
pub mod shared;

pub use book::{BatchReport, BookSnapshot, OrderBook};
pub use levels::{LevelStore, Upsert};
pub use shared::SharedBook;
