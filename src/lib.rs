mod config;
mod date;
mod util;
mod progress;

mod quality;
mod buckets;
mod record;
mod source;

mod strategy;
mod controller;
mod dataset;
mod report;

mod jsonl;
mod snapshot;
mod export;

pub use crate::config::{topic_variants, CollectOptions, DEFAULT_TARGET_SUBREDDITS, MAX_WINDOW_MONTHS};
pub use crate::date::{iter_year_months, window_cutoff, ymd_from_epoch, YearMonth};

// Text quality filter and the whitespace cleaner.
pub use crate::quality::{clean_text, is_deletion_sentinel, is_valid, DELETION_SENTINELS, SPAM_PHRASES};

// Month quotas.
pub use crate::buckets::{BalanceReport, BalanceRow, MonthBucketTracker, MonthStatus};

// Source items, records, and the record builder.
pub use crate::record::{
    build_context, build_record, select_best, CandidateRecord, Comment, Post, SelectedComment,
    COMMENT_SEPARATOR, CONTEXT_SEPARATOR, NO_TITLE_CONTEXT,
};

// Source-provider seam.
pub use crate::source::{PostStream, ProviderFault, SearchScope, SourceProvider, TimeFilter};

// Strategies and the controller.
pub use crate::strategy::{process_post, PostOutcome, SearchStrategy, StrategyStats, Termination};
pub use crate::controller::{collect, CollectionController, CollectionOutcome, CollectionState, Quotas};
pub use crate::dataset::{Dataset, ScoreStats};
pub use crate::report::CollectionReport;

// Offline provider and persistence.
pub use crate::snapshot::{query_matches, SnapshotPost, SnapshotSource};
pub use crate::export::{JsonArrayRecordWriter, JsonlRecordWriter, RecordSink};

pub use crate::util::{init_tracing_once, Pacer};
