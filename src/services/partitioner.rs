use crate::models::{Bucket, BucketMode, Candle};

/// An ordered run of serialized candle rows sharing one time bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleBatch {
    pub bucket: Bucket,
    pub rows: Vec<String>,
}

/// Groups a chronological candle stream into day- or hour-aligned batches.
///
/// Push candles one at a time; a completed batch comes back the moment a
/// candle from a different bucket arrives. Call `finish` after the stream
/// ends to flush the trailing batch. Each batch is emitted exactly once, in
/// input order, and no candle is dropped or duplicated between batches.
#[derive(Debug)]
pub struct BatchPartitioner {
    mode: BucketMode,
    bucket: Option<Bucket>,
    rows: Vec<String>,
}

impl BatchPartitioner {
    pub fn new(mode: BucketMode) -> Self {
        Self {
            mode,
            bucket: None,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, candle: &Candle) -> Option<CandleBatch> {
        let bucket = Bucket::of(candle.time, self.mode);
        let row = candle.to_csv_row();

        match self.bucket {
            None => {
                self.bucket = Some(bucket);
                self.rows.push(row);
                None
            }
            Some(current) if current == bucket => {
                self.rows.push(row);
                None
            }
            Some(current) => {
                let completed = CandleBatch {
                    bucket: current,
                    rows: std::mem::replace(&mut self.rows, vec![row]),
                };
                self.bucket = Some(bucket);
                Some(completed)
            }
        }
    }

    /// Flush the trailing accumulator once the input stream is exhausted.
    pub fn finish(self) -> Option<CandleBatch> {
        let bucket = self.bucket?;
        if self.rows.is_empty() {
            return None;
        }
        Some(CandleBatch {
            bucket,
            rows: self.rows,
        })
    }
}
