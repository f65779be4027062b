//! The source-provider seam: what the collector needs from a paging search backend.

use crate::record::{Comment, Post};
use std::fmt;
use thiserror::Error;

/// Where a search runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchScope {
    /// A single subreddit, normalized lowercase without the `r/` prefix.
    Subreddit(String),
    /// The unrestricted `r/all` listing.
    All,
}

impl SearchScope {
    pub fn subreddit(name: impl AsRef<str>) -> Self {
        let s = name.as_ref().trim().to_lowercase();
        let s = s.strip_prefix("r/").map(str::to_string).unwrap_or(s);
        if s == "all" { Self::All } else { Self::Subreddit(s) }
    }

    /// Whether a post from `subreddit` falls inside this scope.
    pub fn matches(&self, subreddit: &str) -> bool {
        match self {
            Self::All => true,
            Self::Subreddit(name) => name.eq_ignore_ascii_case(subreddit),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subreddit(name) => write!(f, "r/{}", name),
            Self::All => f.write_str("r/all"),
        }
    }
}

/// Reddit search recency filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeFilter {
    Year,
    Month,
    Week,
}

impl TimeFilter {
    /// Broad-to-narrow order used by both strategies.
    pub const ALL: [TimeFilter; 3] = [TimeFilter::Year, TimeFilter::Month, TimeFilter::Week];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
        }
    }

    /// Width of the recency window in seconds.
    pub fn span_secs(self) -> i64 {
        let days = match self {
            Self::Year => 365,
            Self::Month => 30,
            Self::Week => 7,
        };
        days * 86_400
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "week" => Some(Self::Week),
            _ => None,
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure talking to the provider. The collector never propagates these: the unit
/// of work that raised one is treated as having produced nothing.
#[derive(Debug, Error)]
pub enum ProviderFault {
    #[error("search {scope} for {query:?} ({window}) failed: {reason}")]
    Search { scope: SearchScope, query: String, window: TimeFilter, reason: String },
    #[error("fetching the next result page failed: {0}")]
    Page(String),
    #[error("expanding comments of post {post_id} failed: {reason}")]
    Comments { post_id: String, reason: String },
}

/// Lazily paged search results. Finite, and not rewindable once partially consumed;
/// a fresh `search` call pages from the start again.
pub type PostStream<'a> = Box<dyn Iterator<Item = Result<Post, ProviderFault>> + 'a>;

pub trait SourceProvider {
    /// Search `scope` for `query` within the recency `window`, yielding at most
    /// `page_limit` posts.
    fn search(
        &self,
        scope: &SearchScope,
        query: &str,
        window: TimeFilter,
        page_limit: usize,
    ) -> Result<PostStream<'_>, ProviderFault>;

    /// Flattened comment tree of `post`, resolving at most `expansion_limit`
    /// "load more" placeholders.
    fn expand_comments(&self, post: &Post, expansion_limit: usize) -> Result<Vec<Comment>, ProviderFault>;
}

impl<P: SourceProvider + ?Sized> SourceProvider for &P {
    fn search(
        &self,
        scope: &SearchScope,
        query: &str,
        window: TimeFilter,
        page_limit: usize,
    ) -> Result<PostStream<'_>, ProviderFault> {
        (**self).search(scope, query, window, page_limit)
    }

    fn expand_comments(&self, post: &Post, expansion_limit: usize) -> Result<Vec<Comment>, ProviderFault> {
        (**self).expand_comments(post, expansion_limit)
    }
}
