mod bucket;
mod candle;
mod granularity;
mod price_filter;

pub use bucket::{Bucket, BucketMode};
pub use candle::{Candle, PriceBar};
pub use granularity::Granularity;
pub use price_filter::PriceFilter;
