use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::constants::MAX_PAGE_RETRIES;
use crate::error::Error;
use crate::models::Candle;
use crate::services::rate_limiter::RateLimiter;
use crate::services::source::{CandleQuery, CandleSource};

/// One bounded time slice `[from, to)` of the overall fetch range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Split `[begin, end)` into consecutive windows of length <= `time_inc`.
///
/// The windows tile the range exactly: no gaps, no overlaps, and the last
/// window is truncated to end at `end`.
pub fn windows(begin: DateTime<Utc>, end: DateTime<Utc>, time_inc: Duration) -> Vec<Window> {
    let mut out = Vec::new();
    let mut start = begin;
    while start < end {
        let finish = std::cmp::min(start + time_inc, end);
        out.push(Window {
            from: start,
            to: finish,
        });
        start = finish;
    }
    out
}

/// Result of fetching one sub-window.
///
/// A window whose fetch keeps failing is skipped rather than aborting the
/// run; surfacing the skip as a value lets callers count the data loss
/// instead of having to grep logs for it.
#[derive(Debug)]
pub enum PageOutcome {
    Fetched(Vec<Candle>),
    Skipped(Window),
}

/// Fetches candles one rate-limited sub-window at a time.
///
/// Borrows the run's rate limiter so request spacing holds across
/// instruments, not just within one.
pub struct WindowedFetcher<'a> {
    source: &'a dyn CandleSource,
    limiter: &'a mut RateLimiter,
    query: CandleQuery,
}

impl<'a> WindowedFetcher<'a> {
    pub fn new(
        source: &'a dyn CandleSource,
        limiter: &'a mut RateLimiter,
        query: CandleQuery,
    ) -> Self {
        Self {
            source,
            limiter,
            query,
        }
    }

    /// Fetch one window, retrying transient errors in place.
    ///
    /// Up to `MAX_PAGE_RETRIES` retries after the first failed attempt, with
    /// no backoff beyond the rate limiter's base interval. After exhaustion
    /// the window is abandoned and the fetch moves on.
    pub async fn fetch_window(&mut self, instrument: &str, window: Window) -> PageOutcome {
        let mut last_error: Option<Error> = None;

        for attempt in 0..=MAX_PAGE_RETRIES {
            self.limiter.wait().await;

            match self
                .source
                .candles(instrument, window.from, window.to, &self.query)
                .await
            {
                Ok(candles) => return PageOutcome::Fetched(candles),
                Err(e) => {
                    if attempt < MAX_PAGE_RETRIES {
                        warn!(
                            "Fetch failed for {} [{} .. {}): {} - retrying",
                            instrument, window.from, window.to, e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        warn!(
            "Skipping window [{} .. {}) for {} after {} retries: {}",
            window.from,
            window.to,
            instrument,
            MAX_PAGE_RETRIES,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        );
        PageOutcome::Skipped(window)
    }
}
