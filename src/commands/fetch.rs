use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::constants::{DATE_TIME_FORMAT, RATE_LIMIT_INTERVAL_MS};
use crate::error::{Error, Result};
use crate::models::{BucketMode, Granularity, PriceFilter};
use crate::services::{
    windows, BatchPartitioner, BatchWriter, BlobStore, CandleQuery, CandleSource, FileStore,
    OandaClient, PageOutcome, RateLimiter, S3Store, Window, WindowedFetcher,
};

/// Raw CLI arguments for the fetch command.
pub struct FetchArgs {
    pub instruments: String,
    pub granularity: String,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub hourly: bool,
    pub alignment_timezone: Option<String>,
    pub smooth: bool,
    pub mid: bool,
    pub bid: bool,
    pub ask: bool,
    pub output_dir: PathBuf,
    pub s3_endpoint: Option<String>,
    pub s3_bucket: Option<String>,
}

/// Validated run parameters shared by every instrument in a run.
pub struct PullParams {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: BucketMode,
    pub query: CandleQuery,
}

/// Per-instrument outcome counts for the run summary.
#[derive(Debug, Default)]
pub struct InstrumentSummary {
    pub candles: u64,
    pub batches: u64,
    pub skipped_windows: Vec<Window>,
}

pub fn run(args: FetchArgs) {
    let (instruments, params) = match validate(&args) {
        Ok(validated) => validated,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let source = match OandaClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let store: Box<dyn BlobStore> = match build_store(&args) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Fetching {} candles for {} instrument(s), {} -> {}",
        params.query.granularity,
        instruments.len(),
        params.begin.format(DATE_TIME_FORMAT),
        params.end.format(DATE_TIME_FORMAT)
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let mut limiter = RateLimiter::new(StdDuration::from_millis(RATE_LIMIT_INTERVAL_MS));
        let mut total = InstrumentSummary::default();

        for (idx, instrument) in instruments.iter().enumerate() {
            println!("[{}/{}] Fetching {}...", idx + 1, instruments.len(), instrument);
            let summary =
                pull_instrument(&source, &*store, &mut limiter, &params, instrument).await?;

            println!(
                "   ✅ {}: {} candles in {} batches{}",
                instrument,
                summary.candles,
                summary.batches,
                if summary.skipped_windows.is_empty() {
                    String::new()
                } else {
                    format!(", {} window(s) skipped", summary.skipped_windows.len())
                }
            );

            total.candles += summary.candles;
            total.batches += summary.batches;
            total.skipped_windows.extend(summary.skipped_windows);
        }

        Ok::<InstrumentSummary, Error>(total)
    });

    match result {
        Ok(total) => {
            println!(
                "Done: {} candles, {} batches written, {} window(s) skipped",
                total.candles,
                total.batches,
                total.skipped_windows.len()
            );
            if !total.skipped_windows.is_empty() {
                eprintln!("⚠️  Skipped windows mean gaps in the stored data:");
                for window in &total.skipped_windows {
                    eprintln!("   [{} .. {})", window.from, window.to);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Run aborted: {}", e);
            std::process::exit(1);
        }
    }
}

/// Fetch, partition and write one instrument end-to-end.
pub async fn pull_instrument(
    source: &dyn CandleSource,
    store: &dyn BlobStore,
    limiter: &mut RateLimiter,
    params: &PullParams,
    instrument: &str,
) -> Result<InstrumentSummary> {
    let mut fetcher = WindowedFetcher::new(source, limiter, params.query.clone());
    let writer = BatchWriter::new(store, instrument, params.query.granularity);
    let mut partitioner = BatchPartitioner::new(params.mode);
    let mut summary = InstrumentSummary::default();

    let time_inc = params.query.granularity.window_span();
    for window in windows(params.begin, params.end, time_inc) {
        match fetcher.fetch_window(instrument, window).await {
            PageOutcome::Fetched(candles) => {
                for candle in candles {
                    summary.candles += 1;
                    if let Some(batch) = partitioner.push(&candle) {
                        writer.write_batch(&batch).await?;
                        summary.batches += 1;
                    }
                }
            }
            PageOutcome::Skipped(window) => summary.skipped_windows.push(window),
        }
    }

    if let Some(batch) = partitioner.finish() {
        writer.write_batch(&batch).await?;
        summary.batches += 1;
    }

    Ok(summary)
}

fn validate(args: &FetchArgs) -> Result<(Vec<String>, PullParams)> {
    let granularity: Granularity = args.granularity.parse()?;

    let instruments: Vec<String> = args
        .instruments
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if instruments.is_empty() {
        return Err(Error::Config("No instruments given".to_string()));
    }

    let end = match &args.to_time {
        Some(raw) => parse_date_time(raw)?,
        None => Utc::now(),
    };
    let begin = match &args.from_time {
        Some(raw) => parse_date_time(raw)?,
        None => end - Duration::days(1),
    };
    if begin >= end {
        return Err(Error::Config(format!(
            "--from-time must be before --to-time (got {} >= {})",
            begin, end
        )));
    }

    let price = PriceFilter::new(args.mid, args.bid, args.ask);
    if price.is_empty() {
        eprintln!("⚠️  No price flags selected (--mid/--bid/--ask); the API default applies");
    }

    let params = PullParams {
        begin,
        end,
        mode: if args.hourly {
            BucketMode::Hourly
        } else {
            BucketMode::Daily
        },
        query: CandleQuery {
            granularity,
            price,
            smooth: args.smooth,
            alignment_timezone: args.alignment_timezone.clone(),
        },
    };

    Ok((instruments, params))
}

fn parse_date_time(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            Error::Config(format!(
                "Invalid date '{}' (expected 'YYYY-MM-DD HH:MM:SS'): {}",
                raw, e
            ))
        })
}

fn build_store(args: &FetchArgs) -> Result<Box<dyn BlobStore>> {
    match (&args.s3_endpoint, &args.s3_bucket) {
        (Some(endpoint), Some(bucket)) => {
            Ok(Box::new(S3Store::new(endpoint.clone(), bucket.clone())?))
        }
        (None, None) => Ok(Box::new(FileStore::new(&args.output_dir))),
        _ => Err(Error::Config(
            "--s3-endpoint and --s3-bucket must be given together".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> FetchArgs {
        FetchArgs {
            instruments: "EUR_USD,GBP_JPY".to_string(),
            granularity: "H1".to_string(),
            from_time: Some("2021-01-01 00:00:00".to_string()),
            to_time: Some("2021-01-03 00:00:00".to_string()),
            hourly: false,
            alignment_timezone: None,
            smooth: false,
            mid: true,
            bid: false,
            ask: false,
            output_dir: PathBuf::from("market_data"),
            s3_endpoint: None,
            s3_bucket: None,
        }
    }

    #[test]
    fn test_validate_splits_instruments() {
        let (instruments, params) = validate(&base_args()).unwrap();
        assert_eq!(instruments, vec!["EUR_USD", "GBP_JPY"]);
        assert_eq!(params.query.granularity, Granularity::H1);
        assert_eq!(params.end - params.begin, Duration::days(2));
    }

    #[test]
    fn test_validate_rejects_unknown_granularity() {
        let mut args = base_args();
        args.granularity = "D1".to_string();
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_malformed_date() {
        let mut args = base_args();
        args.from_time = Some("2021/01/01".to_string());
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut args = base_args();
        args.from_time = Some("2021-01-04 00:00:00".to_string());
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_validate_defaults_to_last_24_hours() {
        let mut args = base_args();
        args.from_time = None;
        args.to_time = None;
        let (_, params) = validate(&args).unwrap();
        assert_eq!(params.end - params.begin, Duration::days(1));
    }

    #[test]
    fn test_build_store_requires_both_s3_flags() {
        let mut args = base_args();
        args.s3_endpoint = Some("https://s3.example.com".to_string());
        assert!(build_store(&args).is_err());

        args.s3_bucket = Some("candles".to_string());
        assert!(build_store(&args).is_ok());
    }
}
