//! Pipeline tuning constants.
//!
//! The fetch windows are sized so a single candles request stays under the
//! upstream per-call record cap: a window spans `WINDOW_RECORD_CAP / frequency`
//! days, where frequency is the granularity's candles-per-day.

/// Maximum candle records one upstream request may return.
pub const WINDOW_RECORD_CAP: i64 = 2880;

/// Retries per sub-window after the initial attempt fails.
pub const MAX_PAGE_RETRIES: u32 = 5;

/// Minimum spacing between upstream requests, in milliseconds.
pub const RATE_LIMIT_INTERVAL_MS: u64 = 250;

/// CLI date format for --from-time / --to-time.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Key prefix for per-instrument candle batches.
pub const CANDLE_KEY_SOURCE: &str = "oanda";

/// Default root directory for the filesystem store.
pub const DEFAULT_OUTPUT_DIR: &str = "market_data";

/// Default OANDA REST host when OANDA_API_HOST is unset.
pub const DEFAULT_OANDA_HOST: &str = "https://api-fxpractice.oanda.com";
