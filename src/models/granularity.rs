use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::constants::WINDOW_RECORD_CAP;
use crate::error::Error;

/// Candle granularity supported by the batch loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// 1-hour candles
    H1,
    /// 1-minute candles
    M1,
    /// 30-second candles
    S30,
    /// 15-second candles
    S15,
    /// 5-second candles
    S5,
}

impl Granularity {
    /// Candles produced per day at this granularity.
    pub fn candles_per_day(&self) -> i64 {
        match self {
            Granularity::H1 => 24,
            Granularity::M1 => 1440,
            Granularity::S30 => 2880,
            Granularity::S15 => 5760,
            Granularity::S5 => 17280,
        }
    }

    /// Maximum fetch window span: `WINDOW_RECORD_CAP / candles_per_day` days,
    /// expressed in seconds so the sub-day spans of S15/S5 stay exact.
    pub fn window_span(&self) -> Duration {
        Duration::seconds(86_400 * WINDOW_RECORD_CAP / self.candles_per_day())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::H1 => "H1",
            Granularity::M1 => "M1",
            Granularity::S30 => "S30",
            Granularity::S15 => "S15",
            Granularity::S5 => "S5",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H1" => Ok(Granularity::H1),
            "M1" => Ok(Granularity::M1),
            "S30" => Ok(Granularity::S30),
            "S15" => Ok(Granularity::S15),
            "S5" => Ok(Granularity::S5),
            other => Err(Error::Config(format!(
                "Unknown granularity '{}' (expected one of H1, M1, S30, S15, S5)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_granularities() {
        assert_eq!("H1".parse::<Granularity>().unwrap(), Granularity::H1);
        assert_eq!("S5".parse::<Granularity>().unwrap(), Granularity::S5);
        assert!("D1".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_window_span_scales_with_frequency() {
        // 2880-record cap: H1 fetches 120 days per request, S30 exactly one day
        assert_eq!(Granularity::H1.window_span(), Duration::days(120));
        assert_eq!(Granularity::M1.window_span(), Duration::days(2));
        assert_eq!(Granularity::S30.window_span(), Duration::days(1));
        assert_eq!(Granularity::S15.window_span(), Duration::hours(12));
        assert_eq!(Granularity::S5.window_span(), Duration::hours(4));
    }
}
