use async_trait::async_trait;
use reqwest::Client;

use crate::error::RefreshError;

/// Renews the session after the backend answered `401 Unauthorized`.
///
/// Implementations are called at most once per failed request.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<(), RefreshError>;
}

/// Refreshes the session cookie by posting to the backend's refresh endpoint.
///
/// It must share the cookie store of the client issuing the admin requests,
/// otherwise the renewed cookie is never sent.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(http: Client, url: String) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self) -> Result<(), RefreshError> {
        tracing::debug!(url = %self.url, "refreshing session");
        let res = self.http.post(&self.url).send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        Err(RefreshError::Rejected(status))
    }
}
