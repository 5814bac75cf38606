use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub country: Option<String>,
    pub total_feedback: Option<f64>,
    pub total_posted_jobs: Option<i64>,
    pub total_hires: Option<i64>,
    pub verification_status: Option<String>,
    pub total_reviews: Option<i64>,
}

/// One job posting as returned by the feed. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub rate_display: String,
    #[serde(default)]
    pub workload: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub client: ClientInfo,
}

impl Job {
    /// Identity key for caching and lookups: the backend id, falling back to
    /// the posting URL when the id is absent.
    pub fn key(&self) -> &str {
        if self.id.is_empty() { &self.url } else { &self.id }
    }
}

/// The locally editable half of the user profile. The remote half is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalProfile {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub additional_details: String,
    #[serde(default)]
    pub local_skills: Vec<String>,
    #[serde(default)]
    pub local_certificates: Vec<String>,
    #[serde(default)]
    pub local_education: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub upwork_profile: Value,
    pub local_additions: LocalProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub total: i64,
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    pub jobs: Vec<Job>,
    pub paging: Paging,
}

/// One AI suitability analysis. Carries its own job snapshot so the result
/// stays self-describing after the live feed has moved on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub suitability_score: u8,
    pub analysis_summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub proposal_suggestions: Vec<String>,
    pub job_data: Job,
}

impl AnalysisResult {
    /// Parses a free-form analysis payload into the typed schema. Malformed
    /// payloads and out-of-range scores are rejected here rather than carried
    /// inward untyped.
    pub fn from_value(value: Value) -> Result<Self> {
        let result: AnalysisResult = serde_json::from_value(value)
            .map_err(|e| Error::MalformedResponse(format!("analysis payload: {e}")))?;
        if result.suitability_score > 100 {
            return Err(Error::MalformedResponse(format!(
                "suitability score {} outside 0-100",
                result.suitability_score
            )));
        }
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProposalResponse {
    pub proposal_text: String,
}
