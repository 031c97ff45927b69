use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

/// How candle timestamps are truncated when grouping into output batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    /// One batch per calendar day.
    Daily,
    /// One batch per calendar day + hour.
    Hourly,
}

/// A candle timestamp truncated to its batch bucket.
///
/// `hour` is present exactly when the run is in hourly mode, so the bucket
/// itself decides whether the object key carries an hour component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bucket {
    pub date: NaiveDate,
    pub hour: Option<u32>,
}

impl Bucket {
    pub fn of(time: DateTime<Utc>, mode: BucketMode) -> Self {
        Self {
            date: time.date_naive(),
            hour: match mode {
                BucketMode::Daily => None,
                BucketMode::Hourly => Some(time.hour()),
            },
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_daily_bucket_ignores_time_of_day() {
        let morning = Utc.with_ymd_and_hms(2021, 3, 14, 1, 59, 26).unwrap();
        let evening = Utc.with_ymd_and_hms(2021, 3, 14, 23, 0, 0).unwrap();
        assert_eq!(
            Bucket::of(morning, BucketMode::Daily),
            Bucket::of(evening, BucketMode::Daily)
        );
    }

    #[test]
    fn test_hourly_bucket_splits_on_hour() {
        let first = Utc.with_ymd_and_hms(2021, 3, 14, 9, 0, 0).unwrap();
        let same_hour = Utc.with_ymd_and_hms(2021, 3, 14, 9, 59, 59).unwrap();
        let next_hour = Utc.with_ymd_and_hms(2021, 3, 14, 10, 0, 0).unwrap();

        assert_eq!(
            Bucket::of(first, BucketMode::Hourly),
            Bucket::of(same_hour, BucketMode::Hourly)
        );
        assert_ne!(
            Bucket::of(first, BucketMode::Hourly),
            Bucket::of(next_hour, BucketMode::Hourly)
        );
        assert_eq!(Bucket::of(first, BucketMode::Hourly).hour, Some(9));
    }
}
