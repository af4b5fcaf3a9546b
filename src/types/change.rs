//! Changes and levels as they arrive from a feed.
//!
//! A [`Change`] is the typed form the book applies. Feeds usually deliver
//! something looser (a string side tag, or `f64` numbers); [`IntoChange`] and
//! [`IntoLevel`] turn those into typed values and report what was wrong with
//! them. Range checks (negative sizes and so on) are left to the level store.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Level, Price, Side, Size};
use crate::error::{LevelError, LevelField};

/// Replace-semantics update: `size` is the new absolute size at `price`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    /// Side of the book to update
    pub side: Side,
    /// Price level to update
    pub price: Price,
    /// New absolute size (zero removes the level)
    pub size: Size,
}

impl Change {
    /// Create a change
    pub fn new(side: Side, price: Price, size: Size) -> Self {
        Self { side, price, size }
    }

    /// Change on the bid side
    pub fn buy(price: Price, size: Size) -> Self {
        Self::new(Side::Buy, price, size)
    }

    /// Change on the ask side
    pub fn sell(price: Price, size: Size) -> Self {
        Self::new(Side::Sell, price, size)
    }
}

/// Change as carried on the wire: `[side_tag, price, size]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange(pub String, pub Price, pub Size);

impl RawChange {
    /// Create a raw change
    pub fn new(tag: impl Into<String>, price: Price, size: Size) -> Self {
        Self(tag.into(), price, size)
    }

    /// Side tag as received
    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl From<Change> for RawChange {
    fn from(change: Change) -> Self {
        Self(change.side.as_str().to_string(), change.price, change.size)
    }
}

/// Level as carried on the wire: `[price, size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLevel(pub Price, pub Size);

impl From<Level> for RawLevel {
    fn from(level: Level) -> Self {
        Self(level.price, level.size)
    }
}

/// Convert an `f64` into a decimal, rejecting NaN, infinities and values
/// outside the decimal range
pub fn decimal_from_f64(field: LevelField, value: f64) -> Result<Decimal, LevelError> {
    if !value.is_finite() {
        return Err(LevelError::invalid(field, value, "not finite"));
    }
    Decimal::from_f64(value).ok_or_else(|| LevelError::invalid(field, value, "out of range"))
}

/// Anything a batch of changes can be built from
pub trait IntoChange {
    /// Convert into a typed change
    ///
    /// # Errors
    ///
    /// [`LevelError::UnknownSide`] for an unrecognised side tag and
    /// [`LevelError::InvalidLevel`] for a non-finite number.
    fn into_change(self) -> Result<Change, LevelError>;
}

impl IntoChange for Change {
    fn into_change(self) -> Result<Change, LevelError> {
        Ok(self)
    }
}

impl IntoChange for &Change {
    fn into_change(self) -> Result<Change, LevelError> {
        Ok(*self)
    }
}

impl IntoChange for RawChange {
    fn into_change(self) -> Result<Change, LevelError> {
        (&self).into_change()
    }
}

impl IntoChange for &RawChange {
    fn into_change(self) -> Result<Change, LevelError> {
        Ok(Change::new(self.0.parse()?, self.1, self.2))
    }
}

impl IntoChange for (Side, Price, Size) {
    fn into_change(self) -> Result<Change, LevelError> {
        Ok(Change::new(self.0, self.1, self.2))
    }
}

impl IntoChange for (&str, Price, Size) {
    fn into_change(self) -> Result<Change, LevelError> {
        Ok(Change::new(self.0.parse()?, self.1, self.2))
    }
}

impl IntoChange for (&str, f64, f64) {
    fn into_change(self) -> Result<Change, LevelError> {
        let side = self.0.parse()?;
        let price = decimal_from_f64(LevelField::Price, self.1)?;
        let size = decimal_from_f64(LevelField::Size, self.2)?;
        Ok(Change::new(side, price, size))
    }
}

/// Anything an initial snapshot side can be built from
pub trait IntoLevel {
    /// Convert into a typed level
    ///
    /// # Errors
    ///
    /// [`LevelError::InvalidLevel`] for a non-finite number.
    fn into_level(self) -> Result<Level, LevelError>;
}

impl IntoLevel for Level {
    fn into_level(self) -> Result<Level, LevelError> {
        Ok(self)
    }
}

impl IntoLevel for (Price, Size) {
    fn into_level(self) -> Result<Level, LevelError> {
        Ok(Level::new(self.0, self.1))
    }
}

impl IntoLevel for RawLevel {
    fn into_level(self) -> Result<Level, LevelError> {
        Ok(Level::new(self.0, self.1))
    }
}

impl IntoLevel for &RawLevel {
    fn into_level(self) -> Result<Level, LevelError> {
        Ok(Level::new(self.0, self.1))
    }
}

impl IntoLevel for (f64, f64) {
    fn into_level(self) -> Result<Level, LevelError> {
        Ok(Level::new(
            decimal_from_f64(LevelField::Price, self.0)?,
            decimal_from_f64(LevelField::Size, self.1)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_raw_change_into_change() {
        let raw = RawChange::new("BUY", dec!(100.5), dec!(2));
        assert_eq!(raw.into_change(), Ok(Change::buy(dec!(100.5), dec!(2))));
    }

    #[test]
    fn test_unknown_tag() {
        let err = ("hold", dec!(1), dec!(1)).into_change().unwrap_err();
        assert_eq!(err, LevelError::UnknownSide("hold".to_string()));
    }

    #[test]
    fn test_non_finite_f64_rejected() {
        let err = ("sell", f64::NAN, 1.0).into_change().unwrap_err();
        assert!(matches!(
            err,
            LevelError::InvalidLevel {
                field: LevelField::Price,
                reason: "not finite",
                ..
            }
        ));

        let err = (100.0, f64::INFINITY).into_level().unwrap_err();
        assert!(matches!(
            err,
            LevelError::InvalidLevel {
                field: LevelField::Size,
                ..
            }
        ));
    }

    #[test]
    fn test_raw_change_wire_format() {
        let raw: RawChange = serde_json::from_str(r#"["sell", "101.25", "0.5"]"#).unwrap();
        assert_eq!(raw.tag(), "sell");
        assert_eq!(raw.1, dec!(101.25));
        assert_eq!(raw.2, dec!(0.5));

        let level: RawLevel = serde_json::from_str(r#"["99.5", 3]"#).unwrap();
        assert_eq!(level, RawLevel(dec!(99.5), dec!(3)));
    }
}
