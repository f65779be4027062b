//! The accepted-record accumulator and its final pass (dedupe by text, date sort),
//! plus the small summaries the final report needs.

use crate::date::YearMonth;
use crate::export::RecordSink;
use crate::record::CandidateRecord;
use ahash::AHashSet;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<CandidateRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreStats {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<CandidateRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: CandidateRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<CandidateRecord> {
        self.records
    }

    /// Drop records whose text was already seen; the first occurrence wins.
    /// Returns the number of records removed.
    pub fn dedupe_by_text(&mut self) -> usize {
        let before = self.records.len();
        let mut seen: AHashSet<String> = AHashSet::with_capacity(before);
        self.records.retain(|r| seen.insert(r.text.clone()));
        before - self.records.len()
    }

    /// Stable sort by (year, month, day); same-day records keep their order.
    pub fn sort_chronological(&mut self) {
        self.records.sort_by_key(|r| (r.year, r.month, r.day));
    }

    /// The post-collection pass: dedupe, then sort. Returns duplicates removed.
    pub fn finalize(&mut self) -> usize {
        let removed = self.dedupe_by_text();
        self.sort_chronological();
        removed
    }

    pub fn month_distribution(&self) -> BTreeMap<YearMonth, u64> {
        let mut m = BTreeMap::new();
        for r in &self.records {
            *m.entry(r.month_key()).or_insert(0) += 1;
        }
        m
    }

    pub fn subreddits(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.subreddit.clone()).collect()
    }

    pub fn score_stats(&self) -> Option<ScoreStats> {
        let first = self.records.first()?;
        let (mut min, mut max, mut sum) = (first.score, first.score, 0i128);
        for r in &self.records {
            min = min.min(r.score);
            max = max.max(r.score);
            sum += r.score as i128;
        }
        let mean = sum as f64 / self.records.len() as f64;
        Some(ScoreStats { min, max, mean })
    }

    /// Hand every record, in order, to `sink`. Returns the number written.
    pub fn write_to<S: RecordSink>(&self, sink: &mut S) -> Result<u64> {
        let mut n = 0u64;
        for r in &self.records {
            sink.write_record(r)?;
            n += 1;
        }
        Ok(n)
    }
}

impl FromIterator<CandidateRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = CandidateRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}
