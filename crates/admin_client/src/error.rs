use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single logical request against the admin API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The session could not be refreshed, or the retry was still unauthorized.
    #[error("session expired, please login again")]
    SessionExpired,
    #[error("server returned {status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),
    /// The backend answered with `success: false`.
    #[error("{message}")]
    Application { message: String },
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("refresh rejected with {0}")]
    Rejected(StatusCode),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid base_url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
