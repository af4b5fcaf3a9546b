//! Error types for the levelbook crate.
//!
//! Level and batch errors come from the book itself. [`Error`] wraps them
//! together with the failures of the feed, configuration and driver layers.

use std::fmt;

use thiserror::Error;

/// Which numeric field of a level was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelField {
    /// The price of the level
    Price,
    /// The resting size of the level
    Size,
}

impl fmt::Display for LevelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelField::Price => write!(f, "price"),
            LevelField::Size => write!(f, "size"),
        }
    }
}

/// A single level or change could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// Price or size is negative, zero where not allowed, or not finite
    #[error("invalid level: {field} {value} is {reason}")]
    InvalidLevel {
        /// Field that failed validation
        field: LevelField,
        /// Offending value as received
        value: String,
        /// Short description of the violation
        reason: &'static str,
    },

    /// Side tag other than `buy` or `sell`
    #[error("unknown side tag: {0:?}")]
    UnknownSide(String),
}

impl LevelError {
    pub(crate) fn invalid(field: LevelField, value: impl ToString, reason: &'static str) -> Self {
        LevelError::InvalidLevel {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

/// One rejected change within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Position of the change in the batch (0-based)
    pub index: usize,
    /// Why it was rejected
    pub error: LevelError,
}

/// Batch-level failure report.
///
/// Batches are applied change by change: a rejected change neither rolls back
/// the ones before it nor stops the ones after it. The book already holds
/// every accepted change when this error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{} of {} changes rejected{}",
    .rejected.len(),
    .applied + .rejected.len(),
    first_rejection(.rejected)
)]
pub struct BookError {
    /// Number of changes that were applied
    pub applied: usize,
    /// Changes that were rejected, in batch order
    pub rejected: Vec<Rejection>,
}

impl BookError {
    /// Total number of changes in the batch
    pub fn batch_len(&self) -> usize {
        self.applied + self.rejected.len()
    }

    /// Indices of the rejected changes
    pub fn rejected_indices(&self) -> Vec<usize> {
        self.rejected.iter().map(|r| r.index).collect()
    }
}

fn first_rejection(rejected: &[Rejection]) -> String {
    rejected
        .first()
        .map(|r| format!(" (change {}: {})", r.index, r.error))
        .unwrap_or_default()
}

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid level in a snapshot or change
    #[error(transparent)]
    Level(#[from] LevelError),

    /// Some changes of a batch were rejected
    #[error("batch error: {0}")]
    Book(#[from] BookError),

    /// Message addressed to another instrument
    #[error("instrument mismatch: book is {expected}, message is for {got}")]
    InstrumentMismatch {
        /// Instrument the book tracks
        expected: String,
        /// Instrument named in the message
        got: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feed channel closed before the book was seeded
    #[error("feed channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_display() {
        let err = LevelError::invalid(LevelField::Size, "-1.5", "negative");
        assert_eq!(err.to_string(), "invalid level: size -1.5 is negative");
    }

    #[test]
    fn test_unknown_side_display() {
        let err = LevelError::UnknownSide("hold".to_string());
        assert!(err.to_string().contains("\"hold\""));
    }

    #[test]
    fn test_book_error_summary() {
        let err = BookError {
            applied: 2,
            rejected: vec![Rejection {
                index: 1,
                error: LevelError::UnknownSide("hold".to_string()),
            }],
        };
        assert_eq!(err.batch_len(), 3);
        assert_eq!(err.rejected_indices(), vec![1]);
        let msg = err.to_string();
        assert!(msg.starts_with("1 of 3 changes rejected"));
        assert!(msg.contains("change 1"));
    }

    #[test]
    fn test_book_error_is_std_error() {
        let err = BookError {
            applied: 4,
            rejected: Vec::new(),
        };
        let dyn_err: &dyn std::error::Error = &err;
        assert_eq!(dyn_err.to_string(), "0 of 4 changes rejected");
        assert!(dyn_err.source().is_none());

        let wrapped = Error::from(err);
        assert_eq!(wrapped.to_string(), "batch error: 0 of 4 changes rejected");
    }

    #[test]
    fn test_crate_error_from_level() {
        let err: Error = LevelError::UnknownSide("x".into()).into();
        assert!(matches!(err, Error::Level(LevelError::UnknownSide(_))));
    }
}
