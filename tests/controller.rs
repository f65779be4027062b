#[path = "common/mod.rs"]
mod common;

use common::*;
use redbal::{
    CollectionController, MonthBucketTracker, Quotas, SearchScope, Termination, TimeFilter, YearMonth,
};

fn quotas(min: u64, max: u64, target_total: usize) -> Quotas {
    Quotas { min_per_month: min, max_per_month: max, target_total }
}

/// min=1, max=1, a single empty month and an empty dataset: keep going.
#[test]
fn predicate_continues_while_month_below_minimum() {
    let t = MonthBucketTracker::from_months([YearMonth::new(2024, 1)]);
    assert!(quotas(1, 1, 10).should_continue(&t, 0));
}

/// Every month at max and the target reached: stop.
#[test]
fn predicate_stops_when_full_and_target_reached() {
    let ym = YearMonth::new(2024, 1);
    let mut t = MonthBucketTracker::from_months([ym]);
    t.admit(ym, 2);
    t.admit(ym, 2);
    assert!(!quotas(1, 2, 2).should_continue(&t, 2));
}

/// The target total wins even over months still under their minimum.
#[test]
fn predicate_target_total_overrides_minimum() {
    let t = MonthBucketTracker::from_months([YearMonth::new(2024, 1)]);
    assert!(!quotas(5, 10, 3).should_continue(&t, 3));
}

/// Minimums met, maximums not: continue only while under the target.
#[test]
fn predicate_fills_toward_maximum() {
    let ym = YearMonth::new(2024, 1);
    let mut t = MonthBucketTracker::from_months([ym]);
    t.admit(ym, 5);
    assert!(quotas(1, 5, 10).should_continue(&t, 1));
    for _ in 0..4 { t.admit(ym, 5); }
    assert!(!quotas(1, 5, 10).should_continue(&t, 5), "all months at max");
}

/// Full run across both strategies:
/// - targeted r/politics fills 2024-02 to its max (third Feb comment rejected), and a
///   pre-cutoff comment is dropped even though its month is tracked
/// - targeted r/news adds one January and one March record
/// - global fills March and January to max, then the predicate halts the run
/// Final dataset is date-sorted with ids reflecting admission order.
#[test]
fn collects_balanced_across_strategies() {
    let year = TimeFilter::Year;
    let politics = SearchScope::subreddit("politics");
    let news = SearchScope::subreddit("news");

    let source = ScriptedSource::new()
        .on_search(politics.clone(), "charlie kirk", year, vec![post("p1", "politics", "Debate recap", ts(2024, 2, 1))])
        .with_comments("p1", vec![
            comment("feb2", ts(2024, 2, 2), 5),
            comment("feb3", ts(2024, 2, 3), 9),
            comment("feb4", ts(2024, 2, 4), 1),
            comment("jan10", ts(2024, 1, 10), 20),
            comment("flat", ts(2024, 2, 5), 0),
        ])
        .on_search(news.clone(), "charlie kirk", year, vec![post("p2", "news", "Campus tour", ts(2024, 3, 1))])
        .with_comments("p2", vec![comment("jan20", ts(2024, 1, 20), 3), comment("mar2", ts(2024, 3, 2), 4)])
        .on_search(SearchScope::All, "charlie kirk", year, vec![
            post("p3", "AskReddit", "Thoughts on the speech", ts(2024, 3, 5)),
            post("p4", "AskReddit", "Never reached", ts(2024, 3, 6)),
        ])
        .with_comments("p3", vec![
            comment("mar6", ts(2024, 3, 6), 2),
            comment("mar7", ts(2024, 3, 7), 2),
            comment("jan16", ts(2024, 1, 16), 1),
        ]);

    let opts = test_opts(100, 1, 2).with_subreddits(["politics", "r/news"]);
    let out = CollectionController::new(opts, &source).collect_at(now()).unwrap();

    let got: Vec<(u64, u8, u8)> = out.dataset.iter().map(|r| (r.id, r.month, r.day)).collect();
    assert_eq!(got, vec![(6, 1, 16), (4, 1, 20), (2, 2, 2), (1, 2, 3), (3, 3, 2), (5, 3, 6)]);

    for ym in out.tracker.months() {
        assert_eq!(out.tracker.count(ym), Some(2), "{ym}");
    }
    assert_eq!(out.report.strategies.len(), 2);
    assert_eq!(out.report.strategies[0].termination, Termination::Exhausted);
    assert_eq!(out.report.strategies[1].termination, Termination::Halted);
    assert!(out.report.is_satisfied());
    assert!(!source.expansions.borrow().contains(&"p4".to_string()), "halted before p4");

    let first = &out.dataset.records()[0];
    assert_eq!(first.subreddit, "AskReddit");
    assert!(first.text.starts_with("POST: Thoughts on the speech || COMMENT: "));
}

/// Once the target total is reached nothing else is fetched: no further stream pulls,
/// no further searches, no global strategy, and admission stops inside the post.
#[test]
fn reaching_target_stops_all_fetching() {
    let year = TimeFilter::Year;
    let source = ScriptedSource::new()
        .on_search(SearchScope::subreddit("politics"), "charlie kirk", year, vec![
            post("p1", "politics", "First", ts(2024, 2, 1)),
            post("p2", "politics", "Second", ts(2024, 2, 2)),
        ])
        .with_comments("p1", vec![
            comment("a", ts(2024, 2, 3), 3),
            comment("b", ts(2024, 2, 4), 2),
            comment("c", ts(2024, 2, 5), 1),
        ]);

    let opts = test_opts(2, 0, 10).with_subreddits(["politics", "news"]);
    let out = CollectionController::new(opts, &source).collect_at(now()).unwrap();

    assert_eq!(out.dataset.len(), 2);
    assert_eq!(source.pulled.get(), 1, "p2 must not be pulled");
    assert_eq!(source.searches.borrow().len(), 1, "r/news must not be searched");
    assert_eq!(out.report.strategies.len(), 1, "global strategy skipped");
    assert_eq!(out.report.strategies[0].termination, Termination::Halted);
}

/// A failing search, a failing comment expansion and a mid-stream page fault each
/// cost only their own unit; collection carries on with the next sibling.
#[test]
fn provider_faults_are_contained() {
    let year = TimeFilter::Year;
    let source = ScriptedSource::new()
        .failing_search(SearchScope::subreddit("politics"), "charlie kirk", year)
        .on_search_items(SearchScope::subreddit("news"), "charlie kirk", year, vec![
            Ok(post("bad", "news", "Comments fail", ts(2024, 2, 1))),
            Ok(post("good", "news", "Comments work", ts(2024, 2, 2))),
            Err("page 2 timed out".to_string()),
            Ok(post("unreached", "news", "After the fault", ts(2024, 2, 3))),
        ])
        .failing_comments("bad")
        .with_comments("good", vec![comment("g1", ts(2024, 2, 3), 4)])
        .with_comments("unreached", vec![comment("u1", ts(2024, 2, 4), 4)])
        .on_search(SearchScope::All, "charlie kirk", year, vec![post("glob", "AskReddit", "Global hit", ts(2024, 3, 1))])
        .with_comments("glob", vec![comment("x1", ts(2024, 3, 2), 4)]);

    let opts = test_opts(100, 1, 5).with_subreddits(["politics", "news"]);
    let out = CollectionController::new(opts, &source).collect_at(now()).unwrap();

    let texts: Vec<&str> = out.dataset.iter().map(|r| r.split_text().1).collect();
    assert_eq!(texts, vec![body("g1"), body("x1")]);
    assert_eq!(out.report.strategies[0].faults, 3);
    assert_eq!(out.report.strategies[0].termination, Termination::Exhausted);
    assert!(!source.expansions.borrow().contains(&"unreached".to_string()));
}

/// Posts older than the window, and posts without a title, never get their comments
/// expanded.
#[test]
fn stale_and_untitled_posts_are_skipped() {
    let year = TimeFilter::Year;
    let mut untitled = post("untitled", "politics", "", ts(2024, 2, 1));
    untitled.title = None;
    let source = ScriptedSource::new()
        .on_search(SearchScope::subreddit("politics"), "charlie kirk", year, vec![
            post("old", "politics", "Old news", ts(2023, 12, 1)),
            untitled,
            post("ok", "politics", "Fresh", ts(2024, 2, 10)),
        ])
        .with_comments("ok", vec![comment("k1", ts(2024, 2, 11), 2)]);

    let out = CollectionController::new(test_opts(100, 1, 5), &source).collect_at(now()).unwrap();

    assert_eq!(*source.expansions.borrow(), vec!["ok".to_string()]);
    assert_eq!(out.dataset.len(), 1);
    let s = &out.report.strategies[0];
    assert_eq!((s.posts_seen, s.posts_processed), (2, 1));
}

/// Comments dated after the window end land in untracked months and are rejected.
#[test]
fn comments_outside_tracked_months_rejected() {
    let year = TimeFilter::Year;
    let source = ScriptedSource::new()
        .on_search(SearchScope::subreddit("politics"), "charlie kirk", year, vec![post("p", "politics", "Hot", ts(2024, 3, 10))])
        .with_comments("p", vec![comment("future", ts(2024, 4, 2), 9), comment("now", ts(2024, 3, 11), 1)]);

    let out = CollectionController::new(test_opts(100, 1, 5), &source).collect_at(now()).unwrap();
    assert_eq!(out.dataset.len(), 1);
    assert_eq!(out.dataset.records()[0].month_key(), YearMonth::new(2024, 3));
    assert!(!out.tracker.contains(YearMonth::new(2024, 4)));
}

/// The same post surfacing under two time windows yields duplicate texts; the final
/// pass keeps the first and the result stays date-sorted.
#[test]
fn duplicates_removed_and_sorted() {
    let p = post("p", "politics", "Repeated", ts(2024, 2, 1));
    let source = ScriptedSource::new()
        .on_search(SearchScope::subreddit("politics"), "charlie kirk", TimeFilter::Year, vec![p.clone()])
        .on_search(SearchScope::subreddit("politics"), "charlie kirk", TimeFilter::Month, vec![p])
        .with_comments("p", vec![comment("late", ts(2024, 3, 1), 5), comment("early", ts(2024, 1, 20), 3)]);

    let opts = test_opts(100, 1, 5).with_time_filters([TimeFilter::Year, TimeFilter::Month]);
    let out = CollectionController::new(opts, &source).collect_at(now()).unwrap();

    assert_eq!(out.report.collected, 4);
    assert_eq!(out.report.duplicates_removed, 2);
    assert_eq!(out.dataset.len(), 2);
    let ids: Vec<u64> = out.dataset.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
    // Tallies count admissions, before dedupe.
    assert_eq!(out.tracker.count(YearMonth::new(2024, 3)), Some(2));
    assert_eq!(out.report.distribution.get(&YearMonth::new(2024, 3)), Some(&1));
}

/// Malformed configuration is rejected before any provider call.
#[test]
fn invalid_options_rejected_before_start() {
    let source = ScriptedSource::new();
    let err = CollectionController::new(test_opts(10, 5, 2), &source).collect_at(now()).unwrap_err();
    assert!(err.to_string().contains("min_per_month"), "{err}");
    assert!(source.searches.borrow().is_empty());

    assert!(CollectionController::new(test_opts(0, 1, 2), &source).collect_at(now()).is_err());
    assert!(source.searches.borrow().is_empty());
}

/// Targeted searches go subreddit, then window (broad to narrow); global searches go
/// window, then query.
#[test]
fn searches_follow_fixed_order() {
    let source = ScriptedSource::new();
    let opts = test_opts(100, 1, 5)
        .with_subreddits(["politics", "news"])
        .with_time_filters(TimeFilter::ALL)
        .with_global_queries(["a", "b"]);
    let out = CollectionController::new(opts, &source).collect_at(now()).unwrap();

    assert!(out.dataset.is_empty());
    let expected = vec![
        "r/politics|year|charlie kirk",
        "r/politics|month|charlie kirk",
        "r/politics|week|charlie kirk",
        "r/news|year|charlie kirk",
        "r/news|month|charlie kirk",
        "r/news|week|charlie kirk",
        "r/all|year|a",
        "r/all|year|b",
        "r/all|month|a",
        "r/all|month|b",
        "r/all|week|a",
        "r/all|week|b",
    ];
    assert_eq!(*source.searches.borrow(), expected);
}
