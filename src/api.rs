use std::env;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::SearchPayload;
use crate::models::{
    AnalysisResult, AuthStatus, Category, FeedPage, Job, LocalProfile, ProposalResponse,
    UserProfile,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Per-request timeout. Bulk analysis batches on the server side and can run
/// for several minutes, so it gets its own generous limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const BULK_TIMEOUT: Duration = Duration::from_secs(1800);

#[derive(Debug, serde::Serialize)]
struct AnalysisPayload<'a> {
    job: &'a Job,
    profile: &'a UserProfile,
}

#[derive(Debug, serde::Serialize)]
struct BulkAnalysisPayload<'a> {
    jobs: &'a [Job],
    profile: &'a UserProfile,
}

#[derive(Debug, serde::Serialize)]
struct ProposalPayload<'a> {
    job: &'a Job,
    profile: &'a UserProfile,
    analysis: &'a AnalysisResult,
}

/// HTTP client for the job-search backend. Routes and payload shapes follow
/// the backend contract; responses are parsed into typed models at this
/// boundary and rejected as malformed when they do not fit.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let base_url =
            env::var("PROSPECT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Login happens in the browser; the CLI only hands out the URL.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn auth_status(&self) -> Result<bool> {
        let response = self.client.get(self.url("/auth/status")).send().await?;
        let status: AuthStatus = check(response).await?.json().await?;
        Ok(status.authenticated)
    }

    pub async fn fetch_remote_profile(&self) -> Result<Value> {
        let response = self.client.get(self.url("/profile")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn fetch_local_profile(&self) -> Result<LocalProfile> {
        let response = self.client.get(self.url("/local-profile")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Saves the local addendum; the backend echoes the stored shape back.
    pub async fn save_local_profile(&self, profile: &LocalProfile) -> Result<LocalProfile> {
        let response = self
            .client
            .post(self.url("/local-profile"))
            .json(profile)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let response = self
            .client
            .get(self.url("/filters/categories"))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn fetch_jobs(&self, payload: &SearchPayload) -> Result<FeedPage> {
        debug!(after = payload.after.as_deref(), "fetching job page");
        let response = self
            .client
            .post(self.url("/jobs/fetch"))
            .json(payload)
            .send()
            .await?;
        let page: FeedPage = check(response).await?.json().await?;
        debug!(
            jobs = page.jobs.len(),
            total = page.paging.total,
            has_next = page.paging.has_next_page,
            "job page received"
        );
        Ok(page)
    }

    pub async fn analyze_job(&self, job: &Job, profile: &UserProfile) -> Result<AnalysisResult> {
        info!(job = job.key(), "requesting analysis");
        let response = self
            .client
            .post(self.url("/jobs/analyze"))
            .json(&AnalysisPayload { job, profile })
            .send()
            .await?;
        let value: Value = check(response).await?.json().await?;
        AnalysisResult::from_value(value)
    }

    /// One long-running call carrying the full job list. The backend returns
    /// the successful analyses ranked by descending suitability score.
    pub async fn analyze_all(
        &self,
        jobs: &[Job],
        profile: &UserProfile,
    ) -> Result<Vec<AnalysisResult>> {
        info!(jobs = jobs.len(), "requesting bulk analysis");
        let response = self
            .client
            .post(self.url("/jobs/analyze-all"))
            .timeout(BULK_TIMEOUT)
            .json(&BulkAnalysisPayload { jobs, profile })
            .send()
            .await?;
        let values: Vec<Value> = check(response).await?.json().await?;
        values.into_iter().map(AnalysisResult::from_value).collect()
    }

    pub async fn generate_proposal(
        &self,
        job: &Job,
        profile: &UserProfile,
        analysis: &AnalysisResult,
    ) -> Result<String> {
        info!(job = job.key(), "requesting proposal draft");
        let response = self
            .client
            .post(self.url("/proposals/generate"))
            .json(&ProposalPayload { job, profile, analysis })
            .send()
            .await?;
        let proposal: ProposalResponse = check(response).await?.json().await?;
        Ok(proposal.proposal_text)
    }
}

/// Maps a non-success status into a backend error carrying whatever detail
/// the server sent, with a generic fallback when the body is empty.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        "no error detail provided".to_string()
    } else {
        body
    };
    Err(Error::Backend { status, message })
}
