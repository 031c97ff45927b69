use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One side of a candlestick: open/high/low/close prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
}

impl PriceBar {
    pub fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self { o, h, l, c }
    }

    fn to_csv(self) -> String {
        format!("{},{},{},{}", self.o, self.h, self.l, self.c)
    }
}

/// A single candlestick record as fetched from the market-data API.
///
/// Immutable once fetched. Price sides not requested from the API stay at
/// their zero default so the CSV row layout is always the full 15 fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub volume: u64,
    pub complete: bool,
    pub bid: PriceBar,
    pub ask: PriceBar,
    pub mid: PriceBar,
}

impl Candle {
    /// Serialize to the fixed-order CSV row:
    /// `time,volume,complete,bid_o,bid_h,bid_l,bid_c,ask_o,...,mid_c`
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.time.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.volume,
            self.complete,
            self.bid.to_csv(),
            self.ask.to_csv(),
            self.mid.to_csv(),
        )
    }

    /// Parse a row previously produced by [`Candle::to_csv_row`].
    pub fn from_csv_row(row: &str) -> Result<Self> {
        let parts: Vec<&str> = row.split(',').collect();
        if parts.len() != 15 {
            return Err(Error::Parse(format!(
                "Expected 15 CSV fields, got {}",
                parts.len()
            )));
        }

        let time = DateTime::parse_from_rfc3339(parts[0])
            .map_err(|e| Error::Parse(format!("Invalid candle time '{}': {}", parts[0], e)))?
            .with_timezone(&Utc);

        let volume: u64 = parts[1]
            .parse()
            .map_err(|e| Error::Parse(format!("Invalid volume '{}': {}", parts[1], e)))?;

        let complete: bool = parts[2]
            .parse()
            .map_err(|e| Error::Parse(format!("Invalid complete flag '{}': {}", parts[2], e)))?;

        let price = |idx: usize| -> Result<f64> {
            parts[idx]
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid price '{}': {}", parts[idx], e)))
        };

        Ok(Self {
            time,
            volume,
            complete,
            bid: PriceBar::new(price(3)?, price(4)?, price(5)?, price(6)?),
            ask: PriceBar::new(price(7)?, price(8)?, price(9)?, price(10)?),
            mid: PriceBar::new(price(11)?, price(12)?, price(13)?, price(14)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_candle() -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2021, 1, 1, 13, 0, 0).unwrap(),
            volume: 4205,
            complete: true,
            bid: PriceBar::new(1.22395, 1.22473, 1.22311, 1.22432),
            ask: PriceBar::new(1.22412, 1.22489, 1.22328, 1.22449),
            mid: PriceBar::new(1.22404, 1.22481, 1.22320, 1.22440),
        }
    }

    #[test]
    fn test_csv_row_field_order() {
        let row = sample_candle().to_csv_row();
        let parts: Vec<&str> = row.split(',').collect();
        assert_eq!(parts.len(), 15);
        assert_eq!(parts[0], "2021-01-01T13:00:00.000000000Z");
        assert_eq!(parts[1], "4205");
        assert_eq!(parts[2], "true");
        // bid, then ask, then mid
        assert_eq!(parts[3], "1.22395");
        assert_eq!(parts[7], "1.22412");
        assert_eq!(parts[11], "1.22404");
        assert_eq!(parts[14], "1.2244");
    }

    #[test]
    fn test_csv_row_roundtrip() {
        let candle = sample_candle();
        let parsed = Candle::from_csv_row(&candle.to_csv_row()).unwrap();
        assert_eq!(parsed, candle);
    }

    #[test]
    fn test_from_csv_row_rejects_short_row() {
        assert!(Candle::from_csv_row("2021-01-01T00:00:00Z,1,true").is_err());
    }
}
