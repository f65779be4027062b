//! Search strategies. Both variants walk (source x window x query) units and hand each
//! post to `process_post`; the collection state's continue-predicate is checked before
//! every unit, and a false answer unwinds every level at once.

use crate::config::CollectOptions;
use crate::controller::CollectionState;
use crate::record::{build_context, select_best, Post, NO_TITLE_CONTEXT};
use crate::source::{ProviderFault, SearchScope, SourceProvider, TimeFilter};
use crate::util::Pacer;
use std::ops::ControlFlow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Topic query inside a fixed list of topic-relevant subreddits.
    Targeted { subreddits: Vec<String>, windows: Vec<TimeFilter>, query: String },
    /// Topic-variant queries against `r/all`.
    Global { windows: Vec<TimeFilter>, queries: Vec<String> },
}

/// How a strategy run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The continue-predicate turned false.
    Halted,
    /// Every source, window and query was visited.
    Exhausted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyStats {
    pub strategy: &'static str,
    pub posts_seen: usize,
    pub posts_processed: usize,
    pub records_added: usize,
    pub faults: usize,
    pub termination: Termination,
}

impl StrategyStats {
    fn new(strategy: &'static str) -> Self {
        Self {
            strategy,
            posts_seen: 0,
            posts_processed: 0,
            records_added: 0,
            faults: 0,
            termination: Termination::Exhausted,
        }
    }
}

/// What happened to a single post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostOutcome {
    /// No usable title; comments were not fetched.
    Skipped,
    Processed { added: usize },
}

impl SearchStrategy {
    pub fn targeted(opts: &CollectOptions) -> Self {
        Self::Targeted {
            subreddits: opts.subreddits.clone(),
            windows: opts.time_filters.clone(),
            query: opts.topic.clone(),
        }
    }

    pub fn global(opts: &CollectOptions) -> Self {
        Self::Global { windows: opts.time_filters.clone(), queries: opts.global_queries.clone() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Targeted { .. } => "targeted",
            Self::Global { .. } => "global",
        }
    }

    /// Run to exhaustion or until the continue-predicate stops it.
    pub fn run<P: SourceProvider + ?Sized>(
        &self,
        provider: &P,
        state: &mut CollectionState,
        opts: &CollectOptions,
    ) -> StrategyStats {
        let report_every = match self {
            Self::Targeted { .. } => opts.report_every_targeted,
            Self::Global { .. } => opts.report_every_global,
        };
        let mut run = Run {
            provider,
            opts,
            pacer: Pacer::new(opts.pacing),
            report_every: report_every.max(1),
            stats: StrategyStats::new(self.name()),
        };

        tracing::info!(strategy = self.name(), records = state.len(), "strategy started");
        let flow = match self {
            Self::Targeted { subreddits, windows, query } => run.targeted(state, subreddits, windows, query),
            Self::Global { windows, queries } => run.global(state, windows, queries),
        };
        if flow.is_break() {
            run.stats.termination = Termination::Halted;
        }

        let s = &run.stats;
        tracing::info!(
            strategy = s.strategy,
            posts_seen = s.posts_seen,
            posts_processed = s.posts_processed,
            added = s.records_added,
            faults = s.faults,
            termination = ?s.termination,
            records = state.len(),
            "strategy finished"
        );
        run.stats
    }
}

#[inline]
fn gate(state: &CollectionState) -> ControlFlow<()> {
    if state.should_continue() { ControlFlow::Continue(()) } else { ControlFlow::Break(()) }
}

struct Run<'a, P: ?Sized> {
    provider: &'a P,
    opts: &'a CollectOptions,
    pacer: Pacer,
    report_every: usize,
    stats: StrategyStats,
}

impl<'a, P: SourceProvider + ?Sized> Run<'a, P> {
    fn targeted(
        &mut self,
        state: &mut CollectionState,
        subreddits: &[String],
        windows: &[TimeFilter],
        query: &str,
    ) -> ControlFlow<()> {
        for sub in subreddits {
            gate(state)?;
            let scope = SearchScope::subreddit(sub);
            tracing::info!(scope = %scope, "searching");
            let before = self.stats.posts_processed;
            for &window in windows {
                gate(state)?;
                tracing::debug!(scope = %scope, window = %window, "time filter");
                self.query(state, &scope, query, window)?;
            }
            tracing::info!(scope = %scope, processed = self.stats.posts_processed - before, "source done");
        }
        ControlFlow::Continue(())
    }

    fn global(&mut self, state: &mut CollectionState, windows: &[TimeFilter], queries: &[String]) -> ControlFlow<()> {
        let scope = SearchScope::All;
        for &window in windows {
            gate(state)?;
            tracing::info!(scope = %scope, window = %window, "time filter");
            for query in queries {
                gate(state)?;
                tracing::debug!(query = %query, "query");
                self.query(state, &scope, query, window)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// One search unit. A fault opening the search, or mid-stream, ends only this unit.
    fn query(
        &mut self,
        state: &mut CollectionState,
        scope: &SearchScope,
        query: &str,
        window: TimeFilter,
    ) -> ControlFlow<()> {
        let provider = self.provider;
        let mut stream = match provider.search(scope, query, window, self.opts.page_limit) {
            Ok(s) => s,
            Err(fault) => {
                self.fault(&fault);
                return ControlFlow::Continue(());
            }
        };
        loop {
            // Checked before pulling, so a halted run never triggers another page fetch.
            gate(state)?;
            let post = match stream.next() {
                None => break,
                Some(Ok(p)) => p,
                Some(Err(fault)) => {
                    self.fault(&fault);
                    break;
                }
            };
            self.item(state, &post);
        }
        ControlFlow::Continue(())
    }

    fn item(&mut self, state: &mut CollectionState, post: &Post) {
        if post.created_utc < state.cutoff() {
            return;
        }
        self.stats.posts_seen += 1;

        match process_post(self.provider, state, post, self.opts) {
            Ok(PostOutcome::Processed { added }) => {
                self.stats.posts_processed += 1;
                self.stats.records_added += added;
                tracing::debug!(post = %post.id, added, "post processed");
                if self.stats.posts_processed % self.report_every == 0 {
                    tracing::info!(
                        strategy = self.stats.strategy,
                        processed = self.stats.posts_processed,
                        records = state.len(),
                        "progress"
                    );
                    state.balance().log();
                }
            }
            Ok(PostOutcome::Skipped) => {}
            Err(fault) => self.fault(&fault),
        }
        self.pacer.pause();
    }

    fn fault(&mut self, fault: &ProviderFault) {
        self.stats.faults += 1;
        tracing::warn!(strategy = self.stats.strategy, error = %fault, "provider fault; skipping unit");
    }
}

/// Expand one post's comments, select the best, and offer each to the admission step.
pub fn process_post<P: SourceProvider + ?Sized>(
    provider: &P,
    state: &mut CollectionState,
    post: &Post,
    opts: &CollectOptions,
) -> Result<PostOutcome, ProviderFault> {
    let context = build_context(post);
    if context == NO_TITLE_CONTEXT {
        return Ok(PostOutcome::Skipped);
    }

    let comments = provider.expand_comments(post, opts.expansion_limit)?;
    let selected = select_best(comments, opts.min_words, opts.max_comments_per_post);

    let mut added = 0;
    for sel in &selected {
        if !state.should_continue() {
            break;
        }
        if state.admit(&context, post, sel) {
            added += 1;
        }
    }
    Ok(PostOutcome::Processed { added })
}
