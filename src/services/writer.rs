use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::constants::CANDLE_KEY_SOURCE;
use crate::error::Result;
use crate::models::{Bucket, Granularity};
use crate::services::partitioner::CandleBatch;
use crate::services::storage::BlobStore;

/// Writes completed candle batches under deterministic, date-partitioned keys.
///
/// The key is a pure function of the batch's identifying fields, so re-running
/// a range overwrites the previous objects instead of duplicating them.
pub struct BatchWriter<'a> {
    store: &'a dyn BlobStore,
    instrument: String,
    granularity: Granularity,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn BlobStore, instrument: &str, granularity: Granularity) -> Self {
        Self {
            store,
            instrument: instrument.to_string(),
            granularity,
        }
    }

    /// Object key for a bucket:
    /// `oanda/{YYYY}/{MM}/{DD}[/{HH}]/{instrument}_CANDLES_{granularity}.csv`
    pub fn batch_key(&self, bucket: &Bucket) -> String {
        match bucket.hour {
            Some(hour) => format!(
                "{}/{:04}/{:02}/{:02}/{:02}/{}_CANDLES_{}.csv",
                CANDLE_KEY_SOURCE,
                bucket.year(),
                bucket.month(),
                bucket.day(),
                hour,
                self.instrument,
                self.granularity
            ),
            None => format!(
                "{}/{:04}/{:02}/{:02}/{}_CANDLES_{}.csv",
                CANDLE_KEY_SOURCE,
                bucket.year(),
                bucket.month(),
                bucket.day(),
                self.instrument,
                self.granularity
            ),
        }
    }

    pub async fn write_batch(&self, batch: &CandleBatch) -> Result<()> {
        let key = self.batch_key(&batch.bucket);
        println!("writing {} lines to {}", batch.rows.len(), key);
        info!("Writing batch: key={}, rows={}", key, batch.rows.len());
        self.store.write(&key, &batch.rows.join("\n")).await
    }
}

/// Identity of a generic instrument dataset in the store.
#[derive(Debug, Clone)]
pub struct InstrumentInfo {
    pub source: String,
    pub instrument: String,
    pub data_type: String,
    pub granularity: String,
}

/// One pre-serialized CSV row tagged with its calendar date.
#[derive(Debug, Clone)]
pub struct DatedRow {
    pub date: NaiveDate,
    pub csv: String,
}

/// Day-splitting writer for upstream stores that hand back one file per
/// request: re-partitions an arbitrary dated row sequence by calendar day
/// before writing, so a multi-day pull still lands as one object per day.
pub struct InstrumentStore<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> InstrumentStore<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    /// Object key:
    /// `{source}/{YYYY}/{MM}/{DD}/{instrument_lowercased}_{data_type}_{granularity}.csv`
    pub fn file_key(info: &InstrumentInfo, date: NaiveDate) -> String {
        format!(
            "{}/{:04}/{:02}/{:02}/{}_{}_{}.csv",
            info.source,
            date.year(),
            date.month(),
            date.day(),
            info.instrument.to_lowercase(),
            info.data_type,
            info.granularity
        )
    }

    pub async fn put(&self, key: &str, text: &str) -> Result<()> {
        self.store.write(key, text).await
    }

    /// Write a row sequence, splitting by calendar day.
    ///
    /// Grouping is consecutive: the first row's date seeds the current day,
    /// and a row from a different date flushes the accumulated day before
    /// starting the next one with that row. The comparison is by calendar
    /// date, not elapsed time. The trailing day flushes on input exhaustion.
    pub async fn mput<I>(&self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = (InstrumentInfo, DatedRow)>,
    {
        let mut current: Option<(InstrumentInfo, NaiveDate)> = None;
        let mut accumulated: Vec<String> = Vec::new();

        for (info, row) in rows {
            current = match current.take() {
                Some((file_info, file_date)) if file_date != row.date => {
                    let key = Self::file_key(&file_info, file_date);
                    info!("Writing day file: key={}, rows={}", key, accumulated.len());
                    self.put(&key, &accumulated.join("\n")).await?;
                    accumulated.clear();
                    Some((info, row.date))
                }
                Some(existing) => Some(existing),
                None => Some((info, row.date)),
            };
            accumulated.push(row.csv);
        }

        if let Some((ref file_info, file_date)) = current {
            if !accumulated.is_empty() {
                let key = Self::file_key(file_info, file_date);
                self.put(&key, &accumulated.join("\n")).await?;
            }
        }

        Ok(())
    }
}
