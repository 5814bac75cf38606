use thiserror::Error;

/// Errors surfaced by the client. Three families: the backend request failed
/// or answered with garbage, the client refused to issue a request at all,
/// or a lookup came up empty on both the in-memory and durable paths.
#[derive(Error, Debug)]
pub enum Error {
    #[error("request to backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("malformed response from backend: {0}")]
    MalformedResponse(String),

    #[error("filter has no keyword, category, or location; refusing to search")]
    EmptyFilter,

    #[error("user profile is not loaded; fetch or save your profile before analyzing")]
    ProfileUnavailable,

    #[error("a bulk analysis is already running; wait for it to finish")]
    BulkInFlight,

    #[error("no jobs available to analyze")]
    NothingToAnalyze,

    #[error("no analysis found for job '{0}'")]
    AnalysisNotFound(String),

    #[error("snapshot store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, Error>;
