//! Source items (posts, comments), the accepted record shape, and the helpers that
//! turn a post plus one of its comments into a record.

use crate::date::{ymd_from_epoch, YearMonth};
use crate::quality::{clean_text, is_deletion_sentinel, is_valid, word_count};
use serde::{Deserialize, Serialize};

/// Joins post title and selftext inside the context.
pub const CONTEXT_SEPARATOR: &str = " | ";
/// Joins the post context and the comment body in `CandidateRecord::text`.
pub const COMMENT_SEPARATOR: &str = " || COMMENT: ";
/// Context produced for posts without a usable title.
pub const NO_TITLE_CONTEXT: &str = "POST: [No title]";

/// Selftext must have more words than this (after cleaning) to join the context.
const MIN_SELFTEXT_WORDS: usize = 5;

/// A search hit as seen by the collector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    pub created_utc: i64,
    pub subreddit: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub body: Option<String>,
    pub created_utc: i64,
    #[serde(default)]
    pub ups: i64,
    /// Not every listing exposes downvotes; `score` is used instead when absent.
    #[serde(default)]
    pub downs: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Comment {
    /// Net score: `ups - downs` when downvotes are known, else the native score.
    pub fn net_score(&self) -> i64 {
        match (self.downs, self.score) {
            (Some(d), _) => self.ups - d,
            (None, Some(s)) => s,
            (None, None) => self.ups,
        }
    }
}

/// An accepted (post, comment) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: u64,
    pub text: String,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub score: i64,
    pub subreddit: String,
}

impl CandidateRecord {
    pub fn month_key(&self) -> YearMonth {
        YearMonth { year: self.year, month: self.month }
    }

    /// Split `text` back into (post context, comment body).
    pub fn split_text(&self) -> (&str, &str) {
        self.text
            .split_once(COMMENT_SEPARATOR)
            .unwrap_or((self.text.as_str(), ""))
    }
}

/// A comment that passed selection, with its cleaned body and net score.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedComment {
    pub comment: Comment,
    pub text: String,
    pub score: i64,
}

/// `"POST: <title>"`, optionally followed by `" | <selftext>"`.
pub fn build_context(post: &Post) -> String {
    let title = post.title.as_deref().map(clean_text).unwrap_or_default();
    if title.is_empty() {
        return NO_TITLE_CONTEXT.to_string();
    }
    let mut ctx = format!("POST: {}", title);

    if let Some(raw) = post.selftext.as_deref() {
        let body = clean_text(raw);
        if !body.is_empty() && !is_deletion_sentinel(&body) && word_count(&body) > MIN_SELFTEXT_WORDS {
            ctx.push_str(CONTEXT_SEPARATOR);
            ctx.push_str(&body);
        }
    }
    ctx
}

pub fn build_record(id: u64, context: &str, post: &Post, selected: &SelectedComment) -> CandidateRecord {
    let (ym, day) = ymd_from_epoch(selected.comment.created_utc);
    CandidateRecord {
        id,
        text: format!("{}{}{}", context, COMMENT_SEPARATOR, selected.text),
        year: ym.year,
        month: ym.month,
        day,
        score: selected.score,
        subreddit: post.subreddit.clone(),
    }
}

/// Keep the `max_count` best comments: valid text, net score >= 1, highest score first.
/// Equal scores keep their encounter order.
pub fn select_best(comments: Vec<Comment>, min_words: usize, max_count: usize) -> Vec<SelectedComment> {
    let mut picked: Vec<SelectedComment> = comments
        .into_iter()
        .filter_map(|c| {
            let text = clean_text(c.body.as_deref()?);
            if text.is_empty() || !is_valid(&text, min_words) {
                return None;
            }
            let score = c.net_score();
            if score < 1 {
                return None;
            }
            Some(SelectedComment { comment: c, text, score })
        })
        .collect();

    // `sort_by` is stable.
    picked.sort_by(|a, b| b.score.cmp(&a.score));
    picked.truncate(max_count);
    picked
}
