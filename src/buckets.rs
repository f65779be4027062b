//! Per-month quota tracking. Every bucket of the collection window is created up front;
//! admission never creates buckets, so activity outside the window cannot be counted.

use crate::date::{iter_year_months, YearMonth};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonthBucketTracker {
    counts: BTreeMap<YearMonth, u64>,
}

impl MonthBucketTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker holding exactly the given months, all at zero.
    pub fn from_months<I: IntoIterator<Item = YearMonth>>(months: I) -> Self {
        let counts = months.into_iter().map(|ym| (ym, 0)).collect();
        Self { counts }
    }

    /// Tracker covering the calendar months spanned by two unix timestamps.
    pub fn for_window(start_ts: i64, end_ts: i64) -> Self {
        let mut t = Self::new();
        t.initialize(YearMonth::from_epoch(start_ts), YearMonth::from_epoch(end_ts));
        t
    }

    /// Add one zeroed bucket per month in `start..=end`. Existing buckets keep their counts.
    pub fn initialize(&mut self, start: YearMonth, end: YearMonth) {
        for ym in iter_year_months(start, end) {
            self.counts.entry(ym).or_insert(0);
        }
    }

    /// Count `key` toward its quota. Returns false, leaving state untouched, when the
    /// month is not tracked or already holds `max_per_month` items.
    pub fn admit(&mut self, key: YearMonth, max_per_month: u64) -> bool {
        match self.counts.get_mut(&key) {
            Some(c) if *c < max_per_month => {
                *c += 1;
                true
            }
            _ => false,
        }
    }

    pub fn below_minimum(&self, min_per_month: u64) -> bool {
        self.counts.values().any(|&c| c < min_per_month)
    }

    pub fn below_maximum(&self, max_per_month: u64) -> bool {
        self.counts.values().any(|&c| c < max_per_month)
    }

    #[inline]
    pub fn contains(&self, key: YearMonth) -> bool {
        self.counts.contains_key(&key)
    }

    #[inline]
    pub fn count(&self, key: YearMonth) -> Option<u64> {
        self.counts.get(&key).copied()
    }

    pub fn counts(&self) -> &BTreeMap<YearMonth, u64> {
        &self.counts
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.counts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Months still under `min_per_month`, in calendar order.
    pub fn missing_months(&self, min_per_month: u64) -> Vec<(YearMonth, u64)> {
        self.counts
            .iter()
            .filter(|(_, &c)| c < min_per_month)
            .map(|(&ym, &c)| (ym, c))
            .collect()
    }

    pub fn balance(&self, min_per_month: u64, max_per_month: u64) -> BalanceReport {
        let rows = self
            .counts
            .iter()
            .map(|(&ym, &count)| {
                let status = if count >= max_per_month {
                    MonthStatus::Complete
                } else if count >= min_per_month {
                    MonthStatus::InProgress
                } else {
                    MonthStatus::Missing
                };
                BalanceRow { month: ym, count, status }
            })
            .collect();
        BalanceReport { rows, min_per_month, max_per_month }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonthStatus {
    /// At or above the per-month maximum.
    Complete,
    /// Minimum reached, maximum not yet.
    InProgress,
    /// Below the per-month minimum.
    Missing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceRow {
    pub month: YearMonth,
    pub count: u64,
    pub status: MonthStatus,
}

/// Snapshot of how every tracked month stands against its quotas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceReport {
    pub rows: Vec<BalanceRow>,
    pub min_per_month: u64,
    pub max_per_month: u64,
}

impl BalanceReport {
    fn tally(&self, status: MonthStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }
    pub fn complete(&self) -> usize { self.tally(MonthStatus::Complete) }
    pub fn in_progress(&self) -> usize { self.tally(MonthStatus::InProgress) }
    pub fn missing(&self) -> usize { self.tally(MonthStatus::Missing) }

    /// True when every month reached its minimum.
    pub fn is_satisfied(&self) -> bool {
        self.missing() == 0
    }

    /// Emit one line per month plus a summary line.
    pub fn log(&self) {
        for row in &self.rows {
            tracing::info!(month = %row.month, "{}", self.describe(row));
        }
        tracing::info!(
            complete = self.complete(),
            in_progress = self.in_progress(),
            missing = self.missing(),
            "monthly balance"
        );
    }

    fn describe(&self, row: &BalanceRow) -> String {
        match row.status {
            MonthStatus::Complete => format!("COMPLETE ({})", row.count),
            MonthStatus::InProgress => format!("IN PROGRESS ({}/{})", row.count, self.max_per_month),
            MonthStatus::Missing => format!("MISSING ({}/{})", row.count, self.min_per_month),
        }
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "  {}: {}", row.month, self.describe(row))?;
        }
        write!(
            f,
            "Summary: {} complete, {} in progress, {} missing",
            self.complete(),
            self.in_progress(),
            self.missing()
        )
    }
}
