pub mod fetcher;
pub mod partitioner;
pub mod rate_limiter;
pub mod source;
pub mod storage;
pub mod writer;

pub use fetcher::{windows, PageOutcome, Window, WindowedFetcher};
pub use partitioner::{BatchPartitioner, CandleBatch};
pub use rate_limiter::RateLimiter;
pub use source::{CandleQuery, CandleSource, OandaClient};
pub use storage::{BlobStore, FileStore, S3Store};
pub use writer::{BatchWriter, DatedRow, InstrumentInfo, InstrumentStore};
