//! End-of-run summary: quota satisfaction per month, what survived dedupe, and how
//! each strategy fared.

use crate::buckets::{BalanceReport, MonthBucketTracker};
use crate::config::CollectOptions;
use crate::dataset::{Dataset, ScoreStats};
use crate::date::YearMonth;
use crate::strategy::StrategyStats;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
pub struct CollectionReport {
    pub topic: String,
    /// Tracker tallies at the end of collection (pre-dedupe).
    pub balance: BalanceReport,
    pub missing_months: Vec<(YearMonth, u64)>,
    /// Records per month after dedupe.
    pub distribution: BTreeMap<YearMonth, u64>,
    pub collected: usize,
    pub duplicates_removed: usize,
    pub kept: usize,
    pub subreddits: BTreeSet<String>,
    pub scores: Option<ScoreStats>,
    pub strategies: Vec<StrategyStats>,
}

impl CollectionReport {
    pub fn build(
        opts: &CollectOptions,
        tracker: &MonthBucketTracker,
        dataset: &Dataset,
        collected: usize,
        duplicates_removed: usize,
        strategies: Vec<StrategyStats>,
    ) -> Self {
        Self {
            topic: opts.topic.clone(),
            balance: tracker.balance(opts.min_per_month, opts.max_per_month),
            missing_months: tracker.missing_months(opts.min_per_month),
            distribution: dataset.month_distribution(),
            collected,
            duplicates_removed,
            kept: dataset.len(),
            subreddits: dataset.subreddits(),
            scores: dataset.score_stats(),
            strategies,
        }
    }

    /// Every tracked month reached its minimum.
    pub fn is_satisfied(&self) -> bool {
        self.missing_months.is_empty()
    }

    pub fn log(&self) {
        tracing::info!(
            topic = %self.topic,
            collected = self.collected,
            duplicates = self.duplicates_removed,
            kept = self.kept,
            satisfied = self.is_satisfied(),
            "collection finished"
        );
        self.balance.log();
        for (ym, n) in &self.distribution {
            tracing::info!(month = %ym, records = n, "final distribution");
        }
        if !self.subreddits.is_empty() {
            let subs: Vec<&str> = self.subreddits.iter().map(String::as_str).collect();
            tracing::info!("subreddits: {}", subs.join(", "));
        }
        if let Some(s) = self.scores {
            tracing::info!(min = s.min, max = s.max, mean = %format!("{:.2}", s.mean), "scores");
        }
    }
}
