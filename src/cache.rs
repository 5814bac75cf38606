use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::error::Result;
use crate::models::AnalysisResult;

/// Final state of one analysis request, shared with every waiter.
#[derive(Debug, Clone)]
pub enum Outcome {
    Ready(Arc<AnalysisResult>),
    Failed(String),
}

/// Observable entry state, for display and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Absent,
    Pending,
    Ready,
    Failed,
}

enum Entry {
    Pending(watch::Receiver<Option<Outcome>>),
    Ready(Arc<AnalysisResult>),
    Failed(String),
}

enum Action {
    Done(Outcome),
    Attach(watch::Receiver<Option<Outcome>>),
    Fetch(watch::Sender<Option<Outcome>>, watch::Receiver<Option<Outcome>>),
}

/// Keyed store of per-job analysis outcomes. Invariant: at most one request
/// is in flight per job key; a call arriving while one is pending attaches
/// to it instead of issuing a duplicate. A failed entry is retried on the
/// next call, never automatically.
#[derive(Default)]
pub struct AnalysisCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `key`, or runs `fetch` exactly once and
    /// publishes its outcome to every concurrent caller.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AnalysisResult>>,
    {
        let action = {
            let mut entries = self.entries.lock().await;
            match entries.get(key) {
                Some(Entry::Ready(result)) => Action::Done(Outcome::Ready(result.clone())),
                // A pending entry whose sender is gone was abandoned (its
                // owning future was dropped mid-fetch); refetch instead of
                // attaching to a channel that will never resolve.
                Some(Entry::Pending(rx)) if rx.has_changed().is_ok() => {
                    Action::Attach(rx.clone())
                }
                _ => {
                    let (tx, rx) = watch::channel(None);
                    entries.insert(key.to_string(), Entry::Pending(rx.clone()));
                    Action::Fetch(tx, rx)
                }
            }
        };

        match action {
            Action::Done(outcome) => outcome,
            Action::Attach(rx) => {
                debug!(job = key, "attaching to in-flight analysis");
                Self::wait(rx).await
            }
            Action::Fetch(tx, marker) => {
                debug!(job = key, "entry pending, issuing analysis request");
                let outcome = match fetch().await {
                    Ok(result) => Outcome::Ready(Arc::new(result)),
                    Err(e) => Outcome::Failed(e.to_string()),
                };
                let mut entries = self.entries.lock().await;
                // Publish into the map only while this request still owns
                // the key. After a mid-flight invalidation a newer request
                // may have produced a fresher entry, which must not be
                // overwritten by this stale outcome.
                let owns_entry = matches!(
                    entries.get(key),
                    Some(Entry::Pending(stored)) if stored.same_channel(&marker)
                );
                if owns_entry {
                    let entry = match &outcome {
                        Outcome::Ready(result) => Entry::Ready(result.clone()),
                        Outcome::Failed(message) => Entry::Failed(message.clone()),
                    };
                    entries.insert(key.to_string(), entry);
                } else {
                    debug!(job = key, "entry superseded mid-flight, outcome not cached");
                }
                drop(entries);
                // Waiters may already be gone; that's fine.
                let _ = tx.send(Some(outcome.clone()));
                outcome
            }
        }
    }

    async fn wait(mut rx: watch::Receiver<Option<Outcome>>) -> Outcome {
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return Outcome::Failed("analysis request was abandoned".to_string());
            }
        }
    }

    /// Clears the entry back to absent so the job can be re-analyzed, e.g.
    /// after the profile changed. An in-flight request keeps its waiters and
    /// still delivers its outcome to them, but it no longer owns the map
    /// entry and cannot clobber whatever a later request produces.
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            debug!(job = key, "analysis entry invalidated");
        }
    }

    pub async fn status(&self, key: &str) -> Status {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            None => Status::Absent,
            Some(Entry::Pending(_)) => Status::Pending,
            Some(Entry::Ready(_)) => Status::Ready,
            Some(Entry::Failed(_)) => Status::Failed,
        }
    }

    /// Ready result for `key`, if any, without triggering a fetch.
    pub async fn get(&self, key: &str) -> Option<Arc<AnalysisResult>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(Entry::Ready(result)) => Some(result.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::Job;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            title: format!("job {id}"),
            url: format!("https://example.com/{id}"),
            snippet: String::new(),
            skills: vec![],
            date_created: String::new(),
            job_type: None,
            rate_display: String::new(),
            workload: None,
            duration: None,
            client: Default::default(),
        }
    }

    fn analysis(id: &str, score: u8) -> AnalysisResult {
        AnalysisResult {
            suitability_score: score,
            analysis_summary: "fine".to_string(),
            strengths: vec![],
            weaknesses: vec![],
            proposal_suggestions: vec![],
            job_data: job(id),
        }
    }

    #[tokio::test]
    async fn concurrent_calls_issue_one_request() {
        let cache = AnalysisCache::new();
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(analysis("J1", 77))
        };
        let attach = || async { Ok(analysis("J1", 0)) };

        let (first, second) = tokio::join!(
            cache.get_or_fetch("J1", fetch),
            cache.get_or_fetch("J1", attach),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (Outcome::Ready(a), Outcome::Ready(b)) = (first, second) else {
            panic!("expected both callers to observe the ready result");
        };
        assert_eq!(a.suitability_score, 77);
        assert_eq!(b.suitability_score, 77);
    }

    #[tokio::test]
    async fn ready_entry_is_served_without_refetch() {
        let cache = AnalysisCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let outcome = cache
                .get_or_fetch("J1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(analysis("J1", 55))
                })
                .await;
            assert!(matches!(outcome, Outcome::Ready(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status("J1").await, Status::Ready);
    }

    #[tokio::test]
    async fn failure_is_stored_and_retried_on_next_call() {
        let cache = AnalysisCache::new();
        let calls = AtomicUsize::new(0);

        let outcome = cache
            .get_or_fetch("J1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Backend {
                    status: 502,
                    message: "model overloaded".to_string(),
                })
            })
            .await;
        let Outcome::Failed(message) = outcome else {
            panic!("expected failure");
        };
        assert!(message.contains("model overloaded"));
        assert_eq!(cache.status("J1").await, Status::Failed);

        // No automatic retry; the next explicit call issues a new request.
        let outcome = cache
            .get_or_fetch("J1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(analysis("J1", 42))
            })
            .await;
        assert!(matches!(outcome, Outcome::Ready(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_waiter_observes_failure_without_second_call() {
        let cache = AnalysisCache::new();
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(Error::Backend {
                status: 500,
                message: "boom".to_string(),
            })
        };
        let attach = || async { Ok(analysis("J1", 0)) };

        let (first, second) = tokio::join!(
            cache.get_or_fetch("J1", fetch),
            cache.get_or_fetch("J1", attach),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(first, Outcome::Failed(_)));
        assert!(matches!(second, Outcome::Failed(_)));
    }

    #[tokio::test]
    async fn invalidate_returns_entry_to_absent() {
        let cache = AnalysisCache::new();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_fetch("J1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(analysis("J1", 60))
            })
            .await;
        cache.invalidate("J1").await;
        assert_eq!(cache.status("J1").await, Status::Absent);

        cache
            .get_or_fetch("J1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(analysis("J1", 61))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let result = cache.get("J1").await.unwrap();
        assert_eq!(result.suitability_score, 61);
    }

    #[tokio::test]
    async fn invalidated_request_cannot_overwrite_a_newer_result() {
        let cache = AnalysisCache::new();

        let slow = cache.get_or_fetch("J1", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(analysis("J1", 10))
        });
        // Mid-flight the user invalidates and re-analyzes; the fresh result
        // lands while the first request is still running.
        let refresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.invalidate("J1").await;
            cache
                .get_or_fetch("J1", || async { Ok(analysis("J1", 99)) })
                .await
        };
        let (stale, fresh) = tokio::join!(slow, refresh);

        // Each caller still observes its own outcome.
        let Outcome::Ready(stale) = stale else {
            panic!("expected the superseded caller to get its result");
        };
        assert_eq!(stale.suitability_score, 10);
        assert!(matches!(fresh, Outcome::Ready(_)));

        // But the cache keeps the newer result.
        let result = cache.get("J1").await.unwrap();
        assert_eq!(result.suitability_score, 99);
        assert_eq!(cache.status("J1").await, Status::Ready);
    }

    #[tokio::test]
    async fn abandoned_request_is_refetched() {
        let cache = AnalysisCache::new();

        let hung = cache.get_or_fetch("J1", || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(analysis("J1", 1))
        });
        // Dropping the owning future abandons the request mid-fetch.
        let timed_out = tokio::time::timeout(Duration::from_millis(10), hung).await;
        assert!(timed_out.is_err());

        // The dead pending entry is refetchable, not stuck until invalidate.
        let outcome = cache
            .get_or_fetch("J1", || async { Ok(analysis("J1", 88)) })
            .await;
        let Outcome::Ready(result) = outcome else {
            panic!("expected the follow-up call to fetch");
        };
        assert_eq!(result.suitability_score, 88);
        assert_eq!(cache.status("J1").await, Status::Ready);
    }

    #[tokio::test]
    async fn entries_are_scoped_per_job_key() {
        let cache = AnalysisCache::new();

        let failed = cache
            .get_or_fetch("J1", || async {
                Err(Error::Backend {
                    status: 500,
                    message: "boom".to_string(),
                })
            })
            .await;
        assert!(matches!(failed, Outcome::Failed(_)));

        // A failure on one job never bleeds into another.
        let ok = cache
            .get_or_fetch("J2", || async { Ok(analysis("J2", 90)) })
            .await;
        assert!(matches!(ok, Outcome::Ready(_)));
        assert_eq!(cache.status("J1").await, Status::Failed);
        assert_eq!(cache.status("J2").await, Status::Ready);
    }
}
