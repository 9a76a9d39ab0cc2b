//! The dedup-and-publish pipeline.
//!
//! A run is: fetch → filter against history → reverse to oldest-first →
//! publish each entry → commit URLs to history. This module owns the last
//! three stages plus the failure posture around publishing: on a failed
//! publish the run alerts the webhook (when configured) and then aborts.
//! What gets committed on abort depends on the [`CommitPolicy`].

use crate::error::BotError;
use crate::history::HistoryStore;
use crate::models::Entry;
use crate::notify::Notify;
use crate::post::{self, Publish};
use clap::ValueEnum;
use std::collections::HashSet;
use tracing::{error, info, instrument};

/// When published URLs are appended to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommitPolicy {
    /// Append the whole batch only after every entry has been handled.
    /// A mid-batch publish failure skips the commit entirely, so earlier
    /// successes in the same run will be re-sent by the next run. This
    /// reproduces the strict historical behavior.
    Batch,
    /// Append each URL immediately after its successful publish, closing
    /// the mid-batch re-send gap at the cost of one append per entry.
    Eager,
}

/// Knobs the orchestrator injects into a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Print messages but never call the publish API. Commits still happen
    /// as if every publish succeeded.
    pub dry_run: bool,
    pub commit_policy: CommitPolicy,
    /// Decorative label prepended to every message.
    pub prefix: String,
    /// Decorative tag appended to every title.
    pub suffix: String,
}

/// Counts reported after a completed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries published (or passed through under dry-run).
    pub published: usize,
    /// URLs appended to the history file.
    pub committed: usize,
}

/// Entries from `fetched` whose URL is not in `seen`, in the same relative
/// order. Exact string match on URL; no normalization.
pub fn not_yet_posted(fetched: Vec<Entry>, seen: &HashSet<String>) -> Vec<Entry> {
    fetched
        .into_iter()
        .filter(|entry| !seen.contains(&entry.url))
        .collect()
}

/// Reverse in place: the page lists newest first, the feed should read in
/// chronological order.
pub fn oldest_first(entries: &mut [Entry]) {
    entries.reverse();
}

/// Publish `entries` in order and commit their URLs per policy.
///
/// Each composed message is printed to stdout before transmission so the
/// run leaves an audit trail even under dry-run. On publish failure the
/// notifier (when present) is told about the message and the error; a
/// notify failure replaces the publish error as the run's outcome, since
/// failing to alert compounds the original failure. Either way the run
/// aborts and remaining entries are never attempted.
#[instrument(level = "info", skip_all, fields(count = entries.len()))]
pub async fn run<P: Publish, N: Notify>(
    publisher: &P,
    notifier: Option<&N>,
    store: &HistoryStore,
    entries: Vec<Entry>,
    opts: &RunOptions,
) -> Result<RunSummary, BotError> {
    let mut summary = RunSummary::default();
    let mut batch: Vec<Entry> = Vec::new();

    for entry in entries {
        let message = post::compose(&opts.prefix, &opts.suffix, &entry.title, &entry.url);
        println!("{message}");

        if opts.dry_run {
            info!(url = %entry.url, "Dry run; publish skipped");
        } else if let Err(publish_err) = publisher.publish(&message).await {
            error!(url = %entry.url, error = %publish_err, "Publish failed; aborting run");
            if let Some(notifier) = notifier {
                notifier.notify(&message, &publish_err).await?;
            }
            return Err(publish_err);
        }

        summary.published += 1;
        match opts.commit_policy {
            CommitPolicy::Eager => {
                store.commit(std::slice::from_ref(&entry)).await?;
                summary.committed += 1;
            }
            CommitPolicy::Batch => batch.push(entry),
        }
    }

    if opts.commit_policy == CommitPolicy::Batch {
        store.commit(&batch).await?;
        summary.committed = batch.len();
    }

    info!(
        published = summary.published,
        committed = summary.committed,
        "Run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn entry(title: &str, url: &str) -> Entry {
        Entry::new(title, url)
    }

    fn seen(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_filter_is_set_subtraction() {
        let fetched = vec![entry("A", "u1"), entry("B", "u2"), entry("C", "u3")];
        let seen = seen(&["u1", "u3"]);

        let new = not_yet_posted(fetched, &seen);

        assert_eq!(new, vec![entry("B", "u2")]);
        assert!(new.iter().all(|e| !seen.contains(&e.url)));
    }

    #[test]
    fn test_filter_keeps_relative_order() {
        let fetched = vec![entry("A", "u1"), entry("B", "u2"), entry("C", "u3")];
        let new = not_yet_posted(fetched, &seen(&["u2"]));
        let urls: Vec<_> = new.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u3"]);
    }

    #[test]
    fn test_filter_no_normalization_of_urls() {
        let fetched = vec![entry("A", "https://e.edu/news/"), entry("B", "https://e.edu/news")];
        let new = not_yet_posted(fetched, &seen(&["https://e.edu/news/"]));
        assert_eq!(new, vec![entry("B", "https://e.edu/news")]);
    }

    #[test]
    fn test_reverse_is_its_own_inverse() {
        let original = vec![entry("A", "u1"), entry("B", "u2"), entry("C", "u3")];
        let mut entries = original.clone();
        oldest_first(&mut entries);
        assert_ne!(entries, original);
        oldest_first(&mut entries);
        assert_eq!(entries, original);
    }

    #[test]
    fn test_reverse_noop_on_short_sequences() {
        let mut empty: Vec<Entry> = vec![];
        oldest_first(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![entry("A", "u1")];
        oldest_first(&mut single);
        assert_eq!(single, vec![entry("A", "u1")]);
    }

    /// Publisher double that records every message and fails on messages
    /// containing a chosen marker.
    #[derive(Default)]
    struct FakePublisher {
        fail_on: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl Publish for FakePublisher {
        async fn publish(&self, text: &str) -> Result<(), BotError> {
            self.calls.lock().unwrap().push(text.to_string());
            match self.fail_on {
                Some(marker) if text.contains(marker) => Err(BotError::PublishStatus {
                    status: 500,
                    detail: "boom".to_string(),
                }),
                _ => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        fail: bool,
        alerts: Mutex<Vec<String>>,
    }

    impl Notify for FakeNotifier {
        async fn notify(&self, message: &str, _error: &BotError) -> Result<(), BotError> {
            self.alerts.lock().unwrap().push(message.to_string());
            if self.fail {
                Err(BotError::NotifyStatus { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    fn opts(policy: CommitPolicy, dry_run: bool) -> RunOptions {
        RunOptions {
            dry_run,
            commit_policy: policy,
            prefix: "[News] ".to_string(),
            suffix: " #campus".to_string(),
        }
    }

    async fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        let store = HistoryStore::new(dir.path().join(".feedpost.log"));
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_single_new_entry_is_published_with_composed_message() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher::default();

        let fetched = vec![entry("A", "u1"), entry("B", "u2")];
        let mut new = not_yet_posted(fetched, &seen(&["u1"]));
        oldest_first(&mut new);

        let summary = run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            new,
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap();

        assert_eq!(summary, RunSummary { published: 1, committed: 1 });
        let calls = publisher.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["[News] B #campus u2"]);
    }

    #[tokio::test]
    async fn test_publish_order_is_oldest_first() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher::default();

        let fetched = vec![entry("A", "u1"), entry("B", "u2")];
        let mut new = not_yet_posted(fetched, &HashSet::new());
        oldest_first(&mut new);

        run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            new,
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap();

        let calls = publisher.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            ["[News] B #campus u2", "[News] A #campus u1"]
        );
    }

    #[tokio::test]
    async fn test_batch_policy_commits_nothing_on_mid_batch_failure() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher {
            fail_on: Some("u2"),
            ..Default::default()
        };

        // Publish order B (u2) then A (u1): B fails, A must never be tried.
        let entries = vec![entry("B", "u2"), entry("A", "u1")];
        let err = run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            entries,
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BotError::PublishStatus { .. }));
        assert_eq!(publisher.calls.lock().unwrap().len(), 1);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_eager_policy_keeps_earlier_successes() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher {
            fail_on: Some("u2"),
            ..Default::default()
        };

        let entries = vec![entry("A", "u1"), entry("B", "u2"), entry("C", "u3")];
        let err = run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            entries,
            &opts(CommitPolicy::Eager, false),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BotError::PublishStatus { .. }));
        let seen_after = store.load().await.unwrap();
        assert!(seen_after.contains("u1"));
        assert!(!seen_after.contains("u2"));
        assert!(!seen_after.contains("u3"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_publish_but_still_commits() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher {
            // Any call at all would fail the test outcome.
            fail_on: Some("[News]"),
            ..Default::default()
        };

        let entries = vec![entry("A", "u1"), entry("B", "u2")];
        let summary = run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            entries,
            &opts(CommitPolicy::Batch, true),
        )
        .await
        .unwrap();

        assert!(publisher.calls.lock().unwrap().is_empty());
        assert_eq!(summary, RunSummary { published: 2, committed: 2 });
        let seen_after = store.load().await.unwrap();
        assert!(seen_after.contains("u1") && seen_after.contains("u2"));
    }

    #[tokio::test]
    async fn test_publish_failure_alerts_notifier_then_aborts() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher {
            fail_on: Some("u1"),
            ..Default::default()
        };
        let notifier = FakeNotifier::default();

        let err = run(
            &publisher,
            Some(&notifier),
            &store,
            vec![entry("A", "u1")],
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap_err();

        // The original publish error is the run's outcome when alerting works.
        assert!(matches!(err, BotError::PublishStatus { .. }));
        let alerts = notifier.alerts.lock().unwrap();
        assert_eq!(alerts.as_slice(), ["[News] A #campus u1"]);
    }

    #[tokio::test]
    async fn test_notify_failure_compounds_to_notify_error() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher {
            fail_on: Some("u1"),
            ..Default::default()
        };
        let notifier = FakeNotifier {
            fail: true,
            ..Default::default()
        };

        let err = run(
            &publisher,
            Some(&notifier),
            &store,
            vec![entry("A", "u1")],
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BotError::NotifyStatus { .. }));
    }

    #[tokio::test]
    async fn test_second_run_on_unchanged_page_publishes_nothing() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir).await;
        let publisher = FakePublisher::default();
        let page = vec![entry("B", "u2"), entry("A", "u1")];

        // First run: everything is new.
        let mut new = not_yet_posted(page.clone(), &store.load().await.unwrap());
        oldest_first(&mut new);
        run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            new,
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap();

        // Second run against the same page: fully deduplicated.
        let mut new = not_yet_posted(page, &store.load().await.unwrap());
        oldest_first(&mut new);
        let summary = run(
            &publisher,
            None::<&FakeNotifier>,
            &store,
            new,
            &opts(CommitPolicy::Batch, false),
        )
        .await
        .unwrap();

        assert_eq!(summary, RunSummary::default());
        assert_eq!(publisher.calls.lock().unwrap().len(), 2);
    }
}
