use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::commands::fetch::FetchArgs;
use crate::constants::DEFAULT_OUTPUT_DIR;

#[derive(Parser)]
#[command(name = "candlebatch")]
#[command(about = "Batch loader for OANDA candle history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch candles for a time range and store them as CSV batches
    Fetch {
        /// Comma-separated instruments to get candles for, e.g. EUR_USD,GBP_JPY
        instruments: String,

        /// The candles granularity to fetch (H1, M1, S30, S15, S5)
        #[arg(long)]
        granularity: String,

        /// Range start, format 'YYYY-MM-DD HH:MM:SS' (default: 24 hours before the end)
        #[arg(long)]
        from_time: Option<String>,

        /// Range end, format 'YYYY-MM-DD HH:MM:SS' (default: now)
        #[arg(long)]
        to_time: Option<String>,

        /// Store hourly batch files instead of daily
        #[arg(long)]
        hourly: bool,

        /// The timezone used for aligning daily candles
        #[arg(long)]
        alignment_timezone: Option<String>,

        /// 'Smooth' the candles
        #[arg(long)]
        smooth: bool,

        /// Get midpoint-based candles
        #[arg(long)]
        mid: bool,

        /// Get bid-based candles
        #[arg(long)]
        bid: bool,

        /// Get ask-based candles
        #[arg(long)]
        ask: bool,

        /// Root directory for the filesystem store
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// S3-compatible endpoint URL (use together with --s3-bucket)
        #[arg(long)]
        s3_endpoint: Option<String>,

        /// S3 bucket name (use together with --s3-endpoint)
        #[arg(long)]
        s3_bucket: Option<String>,
    },
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            instruments,
            granularity,
            from_time,
            to_time,
            hourly,
            alignment_timezone,
            smooth,
            mid,
            bid,
            ask,
            output_dir,
            s3_endpoint,
            s3_bucket,
        } => {
            commands::fetch::run(FetchArgs {
                instruments,
                granularity,
                from_time,
                to_time,
                hourly,
                alignment_timezone,
                smooth,
                mid,
                bid,
                ask,
                output_dir,
                s3_endpoint,
                s3_bucket,
            });
        }
    }
}
