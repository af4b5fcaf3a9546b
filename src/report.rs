//! Rendering of book snapshots for people and for other programs.
//!
//! The table layout is two centred 20-character columns per side:
//!
//! ```text
//!       Order Book for 'BTC-USD'
//!                   Buy
//! -----------------------------------------
//!        Price        |      Quantity
//! -----------------------------------------
//!        100.00       |     1.00000000
//! ```

use std::fmt;

use crate::config::Precision;
use crate::error::Error;
use crate::orderbook::BookSnapshot;
use crate::types::Level;

const COLUMN: usize = 20;
const WIDTH: usize = COLUMN * 2 + 1;

/// Text table view of a snapshot, formatted on demand
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    snapshot: &'a BookSnapshot,
    precision: Precision,
}

impl<'a> Table<'a> {
    /// Table of `snapshot` with prices and sizes at `precision`
    pub fn new(snapshot: &'a BookSnapshot, precision: Precision) -> Self {
        Self { snapshot, precision }
    }
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("Order Book for '{}'", self.snapshot.instrument_id);
        writeln!(f, "{title:^w$}", w = WIDTH)?;

        write_side(f, "Buy", &self.snapshot.bids, self.precision)?;
        writeln!(f)?;
        write_side(f, "Sell", &self.snapshot.asks, self.precision)
    }
}

/// Render a snapshot as a text table, prices and sizes at `precision`
pub fn render_table(snapshot: &BookSnapshot, precision: Precision) -> String {
    Table::new(snapshot, precision).to_string()
}

fn write_side(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    levels: &[Level],
    precision: Precision,
) -> fmt::Result {
    let rule = "-".repeat(WIDTH);
    writeln!(f, "{heading:^w$}", w = WIDTH)?;
    writeln!(f, "{rule}")?;
    writeln!(f, "{:^w$}|{:^w$}", "Price", "Quantity", w = COLUMN)?;
    writeln!(f, "{rule}")?;
    for level in levels {
        let price = format!("{:.*}", precision.price_dp() as usize, level.price);
        let size = format!("{:.*}", precision.size_dp() as usize, level.size);
        writeln!(f, "{price:^w$}|{size:^w$}", w = COLUMN)?;
    }
    Ok(())
}

/// Render a snapshot as pretty-printed JSON
///
/// # Errors
///
/// [`Error::Json`] if serialization fails.
pub fn render_json(snapshot: &BookSnapshot) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> BookSnapshot {
        BookSnapshot {
            instrument_id: "BTC-USD".to_string(),
            bids: vec![Level::new(dec!(100), dec!(1)), Level::new(dec!(99.5), dec!(2))],
            asks: vec![Level::new(dec!(101), dec!(1.5))],
        }
    }

    #[test]
    fn test_table_layout() {
        let table = render_table(&snapshot(), Precision::default());
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("Order Book for 'BTC-USD'"));
        assert_eq!(lines[1].trim(), "Buy");
        assert_eq!(lines[2], "-".repeat(41));
        assert!(lines[3].contains("Price") && lines[3].contains('|'));
        let cells = |line: &str| line.split('|').map(str::trim).collect::<Vec<_>>().join(" ");
        assert_eq!(cells(lines[5]), "100.00 1.00000000");
        assert_eq!(cells(lines[6]), "99.50 2.00000000");
        assert!(table.contains("Sell"));
        assert!(table.contains("101.00"));
    }

    #[test]
    fn test_empty_side_renders_headers_only() {
        let mut snap = snapshot();
        snap.asks.clear();
        let table = render_table(&snap, Precision::default());
        let lines: Vec<&str> = table.lines().collect();

        // Title, four Buy header lines, two bids, blank, four Sell header lines
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[8].trim(), "Sell");
        assert!(lines[10].contains("Quantity"));
        assert_eq!(lines[11], "-".repeat(41));
    }

    #[test]
    fn test_table_display_matches_render() {
        let snap = snapshot();
        let precision = Precision::default().with_price_dp(1);
        let table = Table::new(&snap, precision);
        assert_eq!(format!("{table}"), render_table(&snap, precision));
        assert!(table.to_string().contains("99.5 "));
    }

    #[test]
    fn test_json_round_trip() {
        let json = render_json(&snapshot()).unwrap();
        let back: BookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot());
    }
}
