use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::constants::DEFAULT_OANDA_HOST;
use crate::error::{Error, Result};
use crate::models::{Candle, Granularity, PriceBar, PriceFilter};

/// Query parameters shared by every candles request in a run.
#[derive(Debug, Clone)]
pub struct CandleQuery {
    pub granularity: Granularity,
    pub price: PriceFilter,
    pub smooth: bool,
    pub alignment_timezone: Option<String>,
}

/// Anything that can serve candles for a bounded time interval.
///
/// The production implementation is [`OandaClient`]; tests swap in scripted
/// sources. Paging and response decoding are the implementor's concern; the
/// fetcher only sees the decoded candles or an error.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn candles(
        &self,
        instrument: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        query: &CandleQuery,
    ) -> Result<Vec<Candle>>;
}

/// OANDA v20 REST client for the instrument candles endpoint.
pub struct OandaClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl OandaClient {
    pub fn new(base_url: String, token: String) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid OANDA host: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// Build a client from `OANDA_API_HOST` / `OANDA_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("OANDA_API_HOST").unwrap_or_else(|_| DEFAULT_OANDA_HOST.to_string());
        let token = std::env::var("OANDA_API_TOKEN")
            .map_err(|_| Error::Config("OANDA_API_TOKEN is not set".to_string()))?;
        Self::new(host, token)
    }
}

#[async_trait]
impl CandleSource for OandaClient {
    async fn candles(
        &self,
        instrument: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        query: &CandleQuery,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/v3/instruments/{}/candles", self.base_url, instrument);

        let mut params: Vec<(&str, String)> = vec![
            ("granularity", query.granularity.as_str().to_string()),
            ("from", from.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            ("to", to.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        ];
        if !query.price.is_empty() {
            params.push(("price", query.price.flag_string()));
        }
        if query.smooth {
            params.push(("smooth", "true".to_string()));
        }
        if let Some(ref tz) = query.alignment_timezone {
            params.push(("alignmentTimezone", tz.clone()));
        }

        debug!("Requesting candles: url={}, from={}, to={}", url, from, to);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Candles request failed: {} (url: {})", e, url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::Network(format!(
                "Candles API returned error status {}: {}",
                status, body
            )));
        }

        let body: CandlesResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to decode candles response: {}", e)))?;

        body.candles.into_iter().map(RawCandle::into_candle).collect()
    }
}

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<RawCandle>,
}

/// Wire form of one candle. OANDA serializes prices as decimal strings and
/// omits the price sides that were not requested.
#[derive(Debug, Deserialize)]
struct RawCandle {
    time: String,
    volume: u64,
    complete: bool,
    #[serde(default)]
    bid: Option<RawBar>,
    #[serde(default)]
    ask: Option<RawBar>,
    #[serde(default)]
    mid: Option<RawBar>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    o: String,
    h: String,
    l: String,
    c: String,
}

impl RawBar {
    fn into_bar(self) -> Result<PriceBar> {
        let price = |field: &str, value: &str| -> Result<f64> {
            value
                .parse()
                .map_err(|e| Error::Parse(format!("Invalid {} price '{}': {}", field, value, e)))
        };
        Ok(PriceBar::new(
            price("o", &self.o)?,
            price("h", &self.h)?,
            price("l", &self.l)?,
            price("c", &self.c)?,
        ))
    }
}

impl RawCandle {
    fn into_candle(self) -> Result<Candle> {
        let time = DateTime::parse_from_rfc3339(&self.time)
            .map_err(|e| Error::Parse(format!("Invalid candle time '{}': {}", self.time, e)))?
            .with_timezone(&Utc);

        let bar = |raw: Option<RawBar>| -> Result<PriceBar> {
            raw.map(RawBar::into_bar).transpose().map(Option::unwrap_or_default)
        };

        Ok(Candle {
            time,
            volume: self.volume,
            complete: self.complete,
            bid: bar(self.bid)?,
            ask: bar(self.ask)?,
            mid: bar(self.mid)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_candles_response() {
        let body = r#"{
            "instrument": "EUR_USD",
            "granularity": "H1",
            "candles": [
                {
                    "time": "2021-01-04T09:00:00.000000000Z",
                    "volume": 5214,
                    "complete": true,
                    "bid": {"o": "1.22403", "h": "1.22473", "l": "1.22311", "c": "1.22432"},
                    "mid": {"o": "1.22411", "h": "1.22481", "l": "1.22320", "c": "1.22440"}
                }
            ]
        }"#;

        let decoded: CandlesResponse = serde_json::from_str(body).unwrap();
        let candle = decoded.candles.into_iter().next().unwrap().into_candle().unwrap();

        assert_eq!(candle.volume, 5214);
        assert!(candle.complete);
        assert_eq!(candle.bid.o, 1.22403);
        assert_eq!(candle.mid.c, 1.22440);
        // ask was not requested, so it stays at the zero default
        assert_eq!(candle.ask, PriceBar::default());
    }

    #[test]
    fn test_decode_empty_candle_list() {
        let decoded: CandlesResponse = serde_json::from_str(r#"{"candles": []}"#).unwrap();
        assert!(decoded.candles.is_empty());
    }

    #[test]
    fn test_rejects_malformed_price() {
        let raw = RawBar {
            o: "not-a-price".to_string(),
            h: "1.0".to_string(),
            l: "1.0".to_string(),
            c: "1.0".to_string(),
        };
        assert!(raw.into_bar().is_err());
    }

    #[test]
    fn test_client_rejects_bad_host() {
        assert!(OandaClient::new("ftp://example.com".to_string(), "token".to_string()).is_err());
    }
}
