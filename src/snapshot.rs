//! Offline source provider over captured search results.
//!
//! A snapshot is a directory of `.jsonl` / `.ndjson` / `.zst` files, one post per line:
//!
//! ```text
//! {"id":"p1","title":"...","selftext":"...","created_utc":1706000000,"subreddit":"politics",
//!  "comments":[{"id":"c1","body":"...","created_utc":1706000100,"ups":4,"downs":0}],
//!  "more":[[{"id":"c9","body":"...","created_utc":1706000200,"ups":2,"score":2}]]}
//! ```
//!
//! `comments` is the initially loaded tree (flattened); each entry of `more` is one
//! "load more" batch, resolved in order up to the expansion limit.

use crate::jsonl::{for_each_line, is_jsonl, is_zst};
use crate::record::{Comment, Post};
use crate::source::{PostStream, ProviderFault, SearchScope, SourceProvider, TimeFilter};
use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const READ_BUF_BYTES: usize = 256 * 1024;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPost {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub more: Vec<Vec<Comment>>,
}

pub struct SnapshotSource {
    posts: Vec<SnapshotPost>,
    by_id: AHashMap<String, usize>,
    now: i64,
}

impl SnapshotSource {
    /// Snapshot over in-memory posts. Recency windows are measured back from `now`.
    pub fn from_posts(posts: Vec<SnapshotPost>, now: i64) -> Self {
        let mut by_id = AHashMap::with_capacity(posts.len());
        for (i, p) in posts.iter().enumerate() {
            // First capture of a post wins.
            by_id.entry(p.post.id.clone()).or_insert(i);
        }
        Self { posts, by_id, now }
    }

    /// Load every snapshot file under `dir` (sorted by path). Unparseable lines are
    /// logged and skipped.
    pub fn open(dir: &Path, now: i64) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("snapshot directory {} does not exist", dir.display());
        }
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_jsonl(p) || is_zst(p))
            .collect();
        files.sort();

        let mut posts = Vec::new();
        for path in &files {
            let mut bad = 0usize;
            for_each_line(path, READ_BUF_BYTES, |line| {
                match serde_json::from_str::<SnapshotPost>(line) {
                    Ok(p) => posts.push(p),
                    Err(_) => bad += 1,
                }
                Ok(())
            })
            .with_context(|| format!("reading {}", path.display()))?;
            if bad > 0 {
                tracing::warn!(path = %path.display(), skipped = bad, "unparseable snapshot lines");
            }
        }
        tracing::info!(files = files.len(), posts = posts.len(), "snapshot loaded");
        Ok(Self::from_posts(posts, now))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Case-insensitive match of `query` against title + selftext. A fully quoted query
/// is matched as a phrase; otherwise every term must appear.
pub fn query_matches(query: &str, post: &Post) -> bool {
    let mut hay = String::new();
    if let Some(t) = post.title.as_deref() {
        hay.push_str(&t.to_lowercase());
        hay.push(' ');
    }
    if let Some(s) = post.selftext.as_deref() {
        hay.push_str(&s.to_lowercase());
    }

    let q = query.trim().to_lowercase();
    if let Some(phrase) = q.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return !phrase.trim().is_empty() && hay.contains(phrase.trim());
    }
    let mut terms = q.split_whitespace().peekable();
    terms.peek().is_some() && terms.all(|t| hay.contains(t))
}

impl SourceProvider for SnapshotSource {
    fn search(
        &self,
        scope: &SearchScope,
        query: &str,
        window: TimeFilter,
        page_limit: usize,
    ) -> Result<PostStream<'_>, ProviderFault> {
        let since = self.now - window.span_secs();
        let mut hits: Vec<&SnapshotPost> = self
            .posts
            .iter()
            .filter(|p| scope.matches(&p.post.subreddit))
            .filter(|p| p.post.created_utc >= since && p.post.created_utc <= self.now)
            .filter(|p| query_matches(query, &p.post))
            .collect();
        // Newest first; stable for equal timestamps.
        hits.sort_by(|a, b| b.post.created_utc.cmp(&a.post.created_utc));
        hits.truncate(page_limit);
        Ok(Box::new(hits.into_iter().map(|p| Ok(p.post.clone()))))
    }

    fn expand_comments(&self, post: &Post, expansion_limit: usize) -> Result<Vec<Comment>, ProviderFault> {
        let idx = self.by_id.get(&post.id).copied().ok_or_else(|| ProviderFault::Comments {
            post_id: post.id.clone(),
            reason: "post not present in snapshot".to_string(),
        })?;
        let snap = &self.posts[idx];
        let mut out = snap.comments.clone();
        for batch in snap.more.iter().take(expansion_limit) {
            out.extend(batch.iter().cloned());
        }
        Ok(out)
    }
}
