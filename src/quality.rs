//! Text quality predicate applied to comment bodies before they can become records,
//! plus the whitespace cleaner shared with the record builder.

use regex::Regex;
use std::sync::OnceLock;

/// Bodies Reddit substitutes for deleted or moderated content.
pub const DELETION_SENTINELS: [&str; 4] = ["[deleted]", "[removed]", "deleted", "removed"];

/// Case-insensitive substrings that mark a comment as promotional noise.
pub const SPAM_PHRASES: [&str; 8] = [
    "click here",
    "buy now",
    "limited offer",
    "subscribe",
    "check out my",
    "follow me",
    "dm me",
    "upvote if",
];

/// More links than this and the text is treated as link spam.
pub const MAX_LINKS: usize = 3;

/// Minimum share of alphanumeric characters among non-space characters.
pub const MIN_ALNUM_RATIO: f64 = 0.5;

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://").unwrap())
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[inline]
pub fn is_deletion_sentinel(text: &str) -> bool {
    let t = text.trim();
    DELETION_SENTINELS.iter().any(|s| t.eq_ignore_ascii_case(s))
}

#[inline]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Accept `text` only if it looks like a real, human-written comment.
pub fn is_valid(text: &str, min_words: usize) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if is_deletion_sentinel(text) {
        return false;
    }
    if word_count(text) < min_words {
        return false;
    }
    if link_re().find_iter(text).count() > MAX_LINKS {
        return false;
    }

    let lower = text.to_lowercase();
    if SPAM_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }

    let (mut visible, mut alnum) = (0usize, 0usize);
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if c.is_alphanumeric() {
            alnum += 1;
        }
    }
    if visible > 0 && (alnum as f64) / (visible as f64) < MIN_ALNUM_RATIO {
        return false;
    }

    true
}
