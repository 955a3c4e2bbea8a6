//! Year bucketing
//!
//! Candles are appended to their year's bucket in arrival order. Nothing is
//! sorted or deduplicated within a bucket; buckets themselves iterate in
//! ascending year order.

use std::collections::BTreeMap;

use crate::types::{Candle, ParsedRow};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearBuckets {
    buckets: BTreeMap<i32, Vec<Candle>>,
}

impl YearBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candle to its year, creating the bucket on first use
    pub fn push(&mut self, row: ParsedRow) {
        self.buckets.entry(row.year).or_default().push(row.candle);
    }

    pub fn get(&self, year: i32) -> Option<&[Candle]> {
        self.buckets.get(&year).map(Vec::as_slice)
    }

    /// Number of distinct years
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_candles(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.buckets.keys().copied()
    }

    /// Buckets in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[Candle])> {
        self.buckets.iter().map(|(year, candles)| (*year, candles.as_slice()))
    }
}

impl Extend<ParsedRow> for YearBuckets {
    fn extend<I: IntoIterator<Item = ParsedRow>>(&mut self, iter: I) {
        for row in iter {
            self.push(row);
        }
    }
}

impl FromIterator<ParsedRow> for YearBuckets {
    fn from_iter<I: IntoIterator<Item = ParsedRow>>(iter: I) -> Self {
        let mut buckets = YearBuckets::new();
        buckets.extend(iter);
        buckets
    }
}
