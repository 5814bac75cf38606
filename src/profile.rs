use serde_json::Value;
use tracing::debug;

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::models::{LocalProfile, UserProfile};

/// Composes the read-only remote profile with the locally editable addendum.
/// Analysis operations require the composed profile; until both halves are
/// loaded they are refused up front rather than failing mid-request.
#[derive(Default)]
pub struct ProfileManager {
    remote: Option<Value>,
    local: Option<LocalProfile>,
}

impl ProfileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.remote.is_some() && self.local.is_some()
    }

    /// Fetches whichever half is missing. Idempotent once loaded.
    pub async fn ensure_loaded(&mut self, api: &ApiClient) -> Result<()> {
        if self.remote.is_none() {
            self.remote = Some(api.fetch_remote_profile().await?);
            debug!("remote profile loaded");
        }
        if self.local.is_none() {
            self.local = Some(api.fetch_local_profile().await?);
            debug!("local profile loaded");
        }
        Ok(())
    }

    /// The composed profile, or a refusal when either half is missing.
    pub fn profile(&self) -> Result<UserProfile> {
        match (&self.remote, &self.local) {
            (Some(remote), Some(local)) => Ok(UserProfile {
                upwork_profile: remote.clone(),
                local_additions: local.clone(),
            }),
            _ => Err(Error::ProfileUnavailable),
        }
    }

}
