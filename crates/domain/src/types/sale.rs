//! Card-sale records and batch partitioning

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A card sale whose installment count is still missing.
///
/// The triple `(sale_date, nsu, merchant_id)` is the natural key used both for
/// the API lookup and for the conditional update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_date: NaiveDate,
    pub nsu: String,
    pub merchant_id: String,
}

impl SaleRecord {
    pub fn new(
        sale_date: NaiveDate,
        nsu: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        Self { sale_date, nsu: nsu.into(), merchant_id: merchant_id.into() }
    }

    /// Sale date in the `YYYY-MM-DD` form expected by the lookup endpoint.
    pub fn sale_date_param(&self) -> String {
        self.sale_date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for SaleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.sale_date, self.nsu, self.merchant_id)
    }
}

/// Records that could not be reconciled in one batch.
pub type FailureSet = Vec<SaleRecord>;

/// Ordered, disjoint slice of the work set handed to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of the batch in the run.
    pub index: usize,
    pub records: Vec<SaleRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split `records` into batches of at most `batch_size`, preserving order.
    ///
    /// The final batch holds the remainder. A `batch_size` of zero is treated
    /// as one.
    pub fn partition(records: Vec<SaleRecord>, batch_size: usize) -> Vec<Self> {
        let size = batch_size.max(1);
        let mut batches = Vec::with_capacity(records.len().div_ceil(size));
        let mut iter = records.into_iter().peekable();

        while iter.peek().is_some() {
            let chunk: Vec<SaleRecord> = iter.by_ref().take(size).collect();
            batches.push(Self { index: batches.len(), records: chunk });
        }

        batches
    }
}
