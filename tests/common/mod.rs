#![allow(dead_code)]

use redbal::{CollectOptions, Comment, Post, PostStream, ProviderFault, SearchScope, SourceProvider, TimeFilter};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use time::{Date, Month};

/// Unix timestamp of `y-m-d 00:00:00 UTC`.
pub fn ts(y: i32, m: u8, d: u8) -> i64 {
    let month = Month::try_from(m).unwrap();
    Date::from_calendar_date(y, month, d).unwrap().midnight().assume_utc().unix_timestamp()
}

/// Fixed "now" for all collection tests: 2024-03-15.
/// With a 2-month window the cutoff is 2024-01-15 and the tracked months are
/// 2024-01, 2024-02 and 2024-03.
pub fn now() -> i64 {
    ts(2024, 3, 15)
}

pub fn post(id: &str, subreddit: &str, title: &str, created: i64) -> Post {
    Post {
        id: id.to_string(),
        title: Some(title.to_string()),
        selftext: None,
        created_utc: created,
        subreddit: subreddit.to_string(),
    }
}

/// A comment body that passes the quality filter (9 words) and is unique per id.
pub fn body(id: &str) -> String {
    format!("Comment {} says something thoughtful about the debate tonight", id)
}

pub fn comment(id: &str, created: i64, ups: i64) -> Comment {
    Comment {
        id: id.to_string(),
        body: Some(body(id)),
        created_utc: created,
        ups,
        downs: Some(0),
        score: None,
        parent_id: None,
    }
}

/// Options tuned for tests: one subreddit, one window, one global query, no pacing,
/// no progress bar.
pub fn test_opts(target_total: usize, min: u64, max: u64) -> CollectOptions {
    CollectOptions::new("charlie kirk", 2, target_total, min, max, 5)
        .with_subreddits(["politics"])
        .with_time_filters([TimeFilter::Year])
        .with_global_queries(["charlie kirk"])
        .with_pacing(Duration::ZERO)
        .with_progress(false)
}

pub fn search_key(scope: &SearchScope, query: &str, window: TimeFilter) -> String {
    format!("{}|{}|{}", scope, window, query)
}

/// In-memory provider with scripted results and fault injection. Records every
/// search, every stream pull and every comment expansion.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<String, Vec<Result<Post, String>>>,
    comments: HashMap<String, Result<Vec<Comment>, String>>,
    failing_searches: HashSet<String>,
    pub searches: RefCell<Vec<String>>,
    pub pulled: Cell<usize>,
    pub expansions: RefCell<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(self, scope: SearchScope, query: &str, window: TimeFilter, posts: Vec<Post>) -> Self {
        self.on_search_items(scope, query, window, posts.into_iter().map(Ok).collect())
    }

    /// `Err(reason)` entries become `ProviderFault::Page` when pulled.
    pub fn on_search_items(
        mut self,
        scope: SearchScope,
        query: &str,
        window: TimeFilter,
        items: Vec<Result<Post, String>>,
    ) -> Self {
        self.pages.insert(search_key(&scope, query, window), items);
        self
    }

    pub fn failing_search(mut self, scope: SearchScope, query: &str, window: TimeFilter) -> Self {
        self.failing_searches.insert(search_key(&scope, query, window));
        self
    }

    pub fn with_comments(mut self, post_id: &str, comments: Vec<Comment>) -> Self {
        self.comments.insert(post_id.to_string(), Ok(comments));
        self
    }

    pub fn failing_comments(mut self, post_id: &str) -> Self {
        self.comments.insert(post_id.to_string(), Err("connection reset".to_string()));
        self
    }
}

impl SourceProvider for ScriptedSource {
    fn search(
        &self,
        scope: &SearchScope,
        query: &str,
        window: TimeFilter,
        page_limit: usize,
    ) -> Result<PostStream<'_>, ProviderFault> {
        let key = search_key(scope, query, window);
        self.searches.borrow_mut().push(key.clone());
        if self.failing_searches.contains(&key) {
            return Err(ProviderFault::Search {
                scope: scope.clone(),
                query: query.to_string(),
                window,
                reason: "503 service unavailable".to_string(),
            });
        }
        let items = self.pages.get(&key).cloned().unwrap_or_default();
        let pulled = &self.pulled;
        Ok(Box::new(items.into_iter().take(page_limit).map(move |item| {
            pulled.set(pulled.get() + 1);
            item.map_err(ProviderFault::Page)
        })))
    }

    fn expand_comments(&self, post: &Post, _expansion_limit: usize) -> Result<Vec<Comment>, ProviderFault> {
        self.expansions.borrow_mut().push(post.id.clone());
        match self.comments.get(&post.id) {
            Some(Ok(c)) => Ok(c.clone()),
            Some(Err(reason)) => Err(ProviderFault::Comments { post_id: post.id.clone(), reason: reason.clone() }),
            None => Ok(Vec::new()),
        }
    }
}

/// Write a `.zst` file containing the provided JSONL lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Write a plain JSONL file.
pub fn write_jsonl_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Read a text file line-by-line into strings (skips empty lines).
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
