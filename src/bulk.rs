use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::models::{AnalysisResult, Job, UserProfile};
use crate::store::SnapshotStore;

/// Marker for one issued bulk run. Obtained from [`BulkAnalyzer::begin`] and
/// consumed by [`BulkAnalyzer::complete`]; only one can exist at a time.
#[derive(Debug)]
pub struct BulkRun {
    job_count: usize,
}

/// Runs the one-shot "analyze all visible jobs" operation and owns the
/// resulting snapshot, both the in-memory copy and the durable one.
///
/// The snapshot is deliberately independent of the per-job analysis cache:
/// a bulk run does not populate per-job entries and vice versa.
pub struct BulkAnalyzer {
    store: SnapshotStore,
    snapshot: Vec<AnalysisResult>,
    in_flight: bool,
}

impl BulkAnalyzer {
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            snapshot: Vec::new(),
            in_flight: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight
    }

    /// Validates the preconditions and marks a run as in flight. A second
    /// run while one is pending is refused, not queued; there is no
    /// cancellation once the request has gone out.
    pub fn begin(&mut self, jobs: &[Job], profile: Option<&UserProfile>) -> Result<BulkRun> {
        if self.in_flight {
            return Err(Error::BulkInFlight);
        }
        if profile.is_none() {
            return Err(Error::ProfileUnavailable);
        }
        if jobs.is_empty() {
            return Err(Error::NothingToAnalyze);
        }
        self.in_flight = true;
        Ok(BulkRun { job_count: jobs.len() })
    }

    /// Applies the outcome of a run. On success the snapshot replaces both
    /// the in-memory collection and the durable store in full; on failure
    /// both are left exactly as they were.
    pub fn complete(
        &mut self,
        run: BulkRun,
        outcome: Result<Vec<AnalysisResult>>,
    ) -> Result<usize> {
        self.in_flight = false;
        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                warn!(jobs = run.job_count, "bulk analysis failed: {e}");
                return Err(e);
            }
        };
        self.store.save(&results)?;
        info!(
            analyzed = results.len(),
            requested = run.job_count,
            "bulk analysis snapshot replaced"
        );
        self.snapshot = results;
        Ok(self.snapshot.len())
    }

    /// One full bulk cycle against the backend.
    pub async fn run(
        &mut self,
        api: &ApiClient,
        jobs: &[Job],
        profile: &UserProfile,
    ) -> Result<usize> {
        let run = self.begin(jobs, Some(profile))?;
        let outcome = api.analyze_all(jobs, profile).await;
        self.complete(run, outcome)
    }

    /// The analyzed-jobs view. When the in-memory snapshot is empty (fresh
    /// process, deep link) the durable store is read once to rehydrate it.
    pub fn results(&mut self) -> Result<&[AnalysisResult]> {
        self.rehydrate_if_empty()?;
        Ok(&self.snapshot)
    }

    /// Detail-view lookup by job identity: memory first, then one read from
    /// the durable store, then not-found.
    pub fn find(&mut self, job_key: &str) -> Result<&AnalysisResult> {
        if self.position(job_key).is_none() {
            self.rehydrate_if_empty()?;
        }
        let index = self
            .position(job_key)
            .ok_or_else(|| Error::AnalysisNotFound(job_key.to_string()))?;
        Ok(&self.snapshot[index])
    }

    fn position(&self, job_key: &str) -> Option<usize> {
        self.snapshot
            .iter()
            .position(|result| result.job_data.key() == job_key)
    }

    fn rehydrate_if_empty(&mut self) -> Result<()> {
        if !self.snapshot.is_empty() {
            return Ok(());
        }
        if let Some(stored) = self.store.load()? {
            debug!(count = stored.len(), "rehydrated snapshot from session store");
            self.snapshot = stored;
        }
        Ok(())
    }
}
