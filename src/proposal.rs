use tracing::info;

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::{AnalysisResult, Job, UserProfile};

/// Holds the single most recent proposal draft. Proposal generation is
/// deliberately uncached: every invocation is a fresh backend call and a
/// fresh artifact, even for identical inputs, and generating a new draft
/// discards the previous one without persistence.
#[derive(Debug, Default)]
pub struct ProposalPad {
    latest: Option<String>,
}

impl ProposalPad {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn generate(
        &mut self,
        api: &ApiClient,
        job: &Job,
        profile: &UserProfile,
        analysis: &AnalysisResult,
    ) -> Result<&str> {
        let text = api.generate_proposal(job, profile, analysis).await?;
        info!(job = job.key(), chars = text.len(), "proposal draft generated");
        Ok(self.remember(text))
    }

    fn remember(&mut self, text: String) -> &str {
        self.latest = Some(text);
        self.latest.as_deref().unwrap_or_default()
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }
}
