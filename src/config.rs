use crate::source::TimeFilter;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Hand-curated subreddits searched first by the targeted strategy.
pub const DEFAULT_TARGET_SUBREDDITS: [&str; 16] = [
    "politics",
    "Conservative",
    "PoliticalDiscussion",
    "news",
    "Republican",
    "democrats",
    "PoliticalHumor",
    "moderatepolitics",
    "Libertarian",
    "centrist",
    "neoliberal",
    "AskThe_Donald",
    "walkaway",
    "louderwithcrowder",
    "trump",
    "BidenBuzz",
];

/// Suffixes appended to the topic to build the global strategy's query variants.
const QUERY_SUFFIXES: [&str; 8] = [
    "interview",
    "controversy",
    "debate",
    "speech",
    "podcast",
    "campus",
    "protest",
    "twitter",
];

/// Longest accepted window, in 30-day months. Keeps the cutoff well inside the
/// range the date helpers can bucket.
pub const MAX_WINDOW_MONTHS: u32 = 240;

/// Collection settings. The six quota fields are required (see `new`); the rest
/// carry defaults and can be tuned with the `with_*` builders.
#[derive(Clone, Debug)]
pub struct CollectOptions {
    pub topic: String,
    pub months: u32,             // window length, 30-day months back from now
    pub target_total: usize,     // stop once this many records are held
    pub min_per_month: u64,
    pub max_per_month: u64,
    pub min_words: usize,        // quality filter threshold for comment bodies

    pub subreddits: Vec<String>,        // targeted strategy sources
    pub time_filters: Vec<TimeFilter>,  // broad-to-narrow recency windows
    pub global_queries: Vec<String>,    // global strategy query variants
    pub page_limit: usize,              // posts per search
    pub expansion_limit: usize,         // "load more" placeholders resolved per post
    pub max_comments_per_post: usize,
    pub pacing: Duration,               // fixed delay after each processed post
    pub report_every_targeted: usize,   // balance report cadence, in processed posts
    pub report_every_global: usize,
    pub progress: bool,
}

impl CollectOptions {
    pub fn new(
        topic: impl Into<String>,
        months: u32,
        target_total: usize,
        min_per_month: u64,
        max_per_month: u64,
        min_words: usize,
    ) -> Self {
        let topic = topic.into().trim().to_string();
        let global_queries = topic_variants(&topic);
        Self {
            topic,
            months,
            target_total,
            min_per_month,
            max_per_month,
            min_words,
            subreddits: DEFAULT_TARGET_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
            time_filters: TimeFilter::ALL.to_vec(),
            global_queries,
            page_limit: 100,
            expansion_limit: 1,
            max_comments_per_post: 50,
            pacing: Duration::from_millis(100),
            report_every_targeted: 10,
            report_every_global: 20,
            progress: true,
        }
    }

    /// Load options from a JSON file; see `FileOptions` for the accepted keys.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let raw: FileOptions = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse {}", path.display()))?;
        raw.into_options()
    }

    pub fn with_subreddits<I, S>(mut self, subs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.subreddits = subs
            .into_iter()
            .map(|s| {
                let s = s.as_ref().trim();
                s.strip_prefix("r/").unwrap_or(s).to_string()
            })
            .filter(|s| !s.is_empty())
            .collect();
        self
    }
    pub fn with_time_filters<I: IntoIterator<Item = TimeFilter>>(mut self, filters: I) -> Self {
        self.time_filters = filters.into_iter().collect();
        self
    }
    pub fn with_global_queries<I, S>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_queries = queries.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_page_limit(mut self, n: usize) -> Self {
        self.page_limit = n;
        self
    }
    pub fn with_expansion_limit(mut self, n: usize) -> Self {
        self.expansion_limit = n;
        self
    }
    pub fn with_max_comments_per_post(mut self, n: usize) -> Self {
        self.max_comments_per_post = n;
        self
    }
    pub fn with_pacing(mut self, delay: Duration) -> Self {
        self.pacing = delay;
        self
    }
    pub fn with_report_every(mut self, targeted: usize, global: usize) -> Self {
        self.report_every_targeted = targeted.max(1);
        self.report_every_global = global.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    /// Reject configurations the controller cannot run with. Called before collection starts.
    pub fn validate(&self) -> Result<()> {
        if self.topic.is_empty() {
            bail!("topic is required");
        }
        if self.months == 0 {
            bail!("window length must be at least one month");
        }
        if self.months > MAX_WINDOW_MONTHS {
            bail!("window length of {} months exceeds the {} month limit", self.months, MAX_WINDOW_MONTHS);
        }
        if self.target_total == 0 {
            bail!("target_total must be positive");
        }
        if self.max_per_month == 0 {
            bail!("max_per_month must be positive");
        }
        if self.min_per_month > self.max_per_month {
            bail!(
                "min_per_month ({}) exceeds max_per_month ({})",
                self.min_per_month,
                self.max_per_month
            );
        }
        if self.time_filters.is_empty() {
            bail!("at least one time filter is required");
        }
        if self.page_limit == 0 {
            bail!("page_limit must be positive");
        }
        if self.max_comments_per_post == 0 {
            bail!("max_comments_per_post must be positive");
        }
        Ok(())
    }
}

/// Query variants for the global strategy: plain, quoted, common suffixes, and the
/// concatenated single-token form.
pub fn topic_variants(topic: &str) -> Vec<String> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Vec::new();
    }
    let mut v = vec![topic.to_string(), format!("\"{}\"", topic)];
    v.extend(QUERY_SUFFIXES.iter().map(|s| format!("{} {}", topic, s)));
    let joined: String = topic.split_whitespace().collect();
    if joined != topic {
        v.push(joined.to_lowercase());
    }
    v.dedup();
    v
}

/// On-disk shape of the options file. The quota keys are required.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOptions {
    topic: String,
    months: u32,
    target_total: usize,
    min_per_month: u64,
    max_per_month: u64,
    min_words: usize,

    #[serde(default)]
    subreddits: Option<Vec<String>>,
    #[serde(default)]
    time_filters: Option<Vec<String>>,
    #[serde(default)]
    global_queries: Option<Vec<String>>,
    #[serde(default)]
    page_limit: Option<usize>,
    #[serde(default)]
    expansion_limit: Option<usize>,
    #[serde(default)]
    max_comments_per_post: Option<usize>,
    #[serde(default)]
    pacing_ms: Option<u64>,
    #[serde(default)]
    progress: Option<bool>,
}

impl FileOptions {
    fn into_options(self) -> Result<CollectOptions> {
        let mut o = CollectOptions::new(
            self.topic,
            self.months,
            self.target_total,
            self.min_per_month,
            self.max_per_month,
            self.min_words,
        );
        if let Some(subs) = self.subreddits {
            o = o.with_subreddits(subs);
        }
        if let Some(raw) = self.time_filters {
            let mut filters = Vec::with_capacity(raw.len());
            for s in &raw {
                match TimeFilter::parse(s) {
                    Some(f) => filters.push(f),
                    None => bail!("unknown time filter {:?} (expected year, month or week)", s),
                }
            }
            o = o.with_time_filters(filters);
        }
        if let Some(q) = self.global_queries {
            o = o.with_global_queries(q);
        }
        if let Some(n) = self.page_limit {
            o = o.with_page_limit(n);
        }
        if let Some(n) = self.expansion_limit {
            o = o.with_expansion_limit(n);
        }
        if let Some(n) = self.max_comments_per_post {
            o = o.with_max_comments_per_post(n);
        }
        if let Some(ms) = self.pacing_ms {
            o = o.with_pacing(Duration::from_millis(ms));
        }
        if let Some(p) = self.progress {
            o = o.with_progress(p);
        }
        Ok(o)
    }
}
