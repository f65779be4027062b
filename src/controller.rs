//! The balanced collection controller: owns quota state and the record accumulator,
//! runs the targeted then the global strategy, and finishes with dedupe + sort.

use crate::buckets::{BalanceReport, MonthBucketTracker};
use crate::config::CollectOptions;
use crate::dataset::Dataset;
use crate::date::{format_day, window_cutoff, YearMonth};
use crate::progress::make_count_progress;
use crate::record::{build_record, CandidateRecord, Post, SelectedComment};
use crate::report::CollectionReport;
use crate::source::SourceProvider;
use crate::strategy::SearchStrategy;
use crate::util::init_tracing_once;
use anyhow::Result;
use indicatif::ProgressBar;
use time::OffsetDateTime;

/// Quota settings behind the continue-predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quotas {
    pub min_per_month: u64,
    pub max_per_month: u64,
    pub target_total: usize,
}

impl Quotas {
    pub fn from_options(opts: &CollectOptions) -> Self {
        Self {
            min_per_month: opts.min_per_month,
            max_per_month: opts.max_per_month,
            target_total: opts.target_total,
        }
    }

    /// The single gate for all iteration. Stops at the target total; otherwise keeps
    /// going while any month is under its minimum, or under its maximum.
    pub fn should_continue(&self, tracker: &MonthBucketTracker, collected: usize) -> bool {
        if collected >= self.target_total {
            return false;
        }
        if tracker.below_minimum(self.min_per_month) {
            return true;
        }
        tracker.below_maximum(self.max_per_month) && collected < self.target_total
    }
}

/// Mutable collection state: month tallies, accepted records and the id counter.
/// Only the controller's thread touches it.
pub struct CollectionState {
    tracker: MonthBucketTracker,
    records: Vec<CandidateRecord>,
    next_id: u64,
    cutoff: i64,
    quotas: Quotas,
    progress: Option<ProgressBar>,
}

impl CollectionState {
    pub fn new(tracker: MonthBucketTracker, quotas: Quotas, cutoff: i64) -> Self {
        Self { tracker, records: Vec::new(), next_id: 1, cutoff, quotas, progress: None }
    }

    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    #[inline]
    pub fn should_continue(&self) -> bool {
        self.quotas.should_continue(&self.tracker, self.records.len())
    }

    /// Admission step for one selected comment of `post`. Rejects comments older than
    /// the window cutoff, in untracked months, or in months at their maximum.
    pub fn admit(&mut self, context: &str, post: &Post, selected: &SelectedComment) -> bool {
        let ts = selected.comment.created_utc;
        if ts < self.cutoff {
            return false;
        }
        if !self.tracker.admit(YearMonth::from_epoch(ts), self.quotas.max_per_month) {
            return false;
        }
        let record = build_record(self.next_id, context, post, selected);
        self.next_id += 1;
        self.records.push(record);
        if let Some(pb) = &self.progress {
            pb.set_position(self.records.len() as u64);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cutoff(&self) -> i64 {
        self.cutoff
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn quotas(&self) -> Quotas {
        self.quotas
    }

    pub fn tracker(&self) -> &MonthBucketTracker {
        &self.tracker
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn balance(&self) -> BalanceReport {
        self.tracker.balance(self.quotas.min_per_month, self.quotas.max_per_month)
    }

    pub fn into_parts(self) -> (MonthBucketTracker, Vec<CandidateRecord>) {
        if let Some(pb) = &self.progress {
            pb.finish_with_message("collection done");
        }
        (self.tracker, self.records)
    }
}

/// Result of a full collection run.
#[derive(Debug)]
pub struct CollectionOutcome {
    pub dataset: Dataset,
    pub tracker: MonthBucketTracker,
    pub report: CollectionReport,
}

pub struct CollectionController<P> {
    opts: CollectOptions,
    provider: P,
}

impl<P: SourceProvider> CollectionController<P> {
    pub fn new(opts: CollectOptions, provider: P) -> Self {
        Self { opts, provider }
    }

    pub fn options(&self) -> &CollectOptions {
        &self.opts
    }

    /// Collect with the window ending now.
    pub fn collect(&self) -> Result<CollectionOutcome> {
        self.collect_at(OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Collect with the window ending at unix time `now`.
    pub fn collect_at(&self, now: i64) -> Result<CollectionOutcome> {
        self.opts.validate()?;
        init_tracing_once();

        let opts = &self.opts;
        let quotas = Quotas::from_options(opts);
        let cutoff = window_cutoff(now, opts.months);
        let tracker = MonthBucketTracker::for_window(cutoff, now);

        tracing::info!(
            topic = %opts.topic,
            months = opts.months,
            since = %format_day(cutoff),
            target = opts.target_total,
            min_per_month = opts.min_per_month,
            max_per_month = opts.max_per_month,
            "starting balanced collection"
        );
        tracing::info!(
            "target months: {}",
            tracker.months().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
        );

        let mut state = CollectionState::new(tracker, quotas, cutoff);
        if opts.progress {
            let label = format!("Collecting \"{}\"", opts.topic);
            state = state.with_progress(make_count_progress(opts.target_total as u64, &label));
        }

        let mut strategies = Vec::with_capacity(2);
        strategies.push(SearchStrategy::targeted(opts).run(&self.provider, &mut state, opts));
        if state.len() < opts.target_total {
            strategies.push(SearchStrategy::global(opts).run(&self.provider, &mut state, opts));
        }

        for (ym, count) in state.tracker().missing_months(opts.min_per_month) {
            tracing::warn!(month = %ym, count, min = opts.min_per_month, "month below minimum");
        }

        let (tracker, records) = state.into_parts();
        let collected = records.len();
        let mut dataset = Dataset::from_records(records);
        let duplicates = dataset.finalize();

        let report = CollectionReport::build(opts, &tracker, &dataset, collected, duplicates, strategies);
        report.log();

        Ok(CollectionOutcome { dataset, tracker, report })
    }
}

/// Run a full collection for `opts.topic` against `provider`, ending now.
pub fn collect<P: SourceProvider>(provider: P, opts: CollectOptions) -> Result<CollectionOutcome> {
    CollectionController::new(opts, provider).collect()
}
