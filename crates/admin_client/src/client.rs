use std::{sync::Arc, time::Duration};

use api_types::{
    ListEnvelope, Page,
    user::{UserUpdate, UserUpdateResponse},
};
use reqwest::{Client, Method, StatusCode, Url, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    auth::{HttpTokenRefresher, TokenRefresher},
    error::{BuildError, FetchError},
    memory::QueryIntent,
    resource::Resource,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";

/// One HTTP request, kept as data so it can be sent again after a session
/// refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn params(mut self, params: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.query.extend(params);
        self
    }

    /// Appends the `page` and `size` query parameters.
    pub fn page(self, page: u32, size: u32) -> Self {
        self.params([("page", page.to_string()), ("size", size.to_string())])
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, FetchError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Client for the admin REST API.
///
/// Every request goes through a single refresh-and-retry step: a first
/// `401` triggers one session refresh and one retry, a second `401` ends
/// the request with [`FetchError::SessionExpired`].
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    refresher: Arc<dyn TokenRefresher>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Client with the default refresher and no request timeout.
    pub fn new(base_url: &str) -> Result<Self, BuildError> {
        Self::builder().base_url(base_url).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(&self, spec: &RequestSpec) -> Result<reqwest::Response, FetchError> {
        let mut req = self
            .http
            .request(spec.method.clone(), self.url(&spec.path))
            .header(header::CONTENT_TYPE, "application/json");
        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }
        if let Some(body) = &spec.body {
            req = req.json(body);
        }

        tracing::debug!(method = %spec.method, path = %spec.path, query = ?spec.query, "sending request");
        Ok(req.send().await?)
    }

    /// Sends `spec` and decodes a successful body as `T`.
    pub async fn send<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, FetchError> {
        let mut res = self.execute(spec).await?;

        if res.status() == StatusCode::UNAUTHORIZED {
            if let Err(err) = self.refresher.refresh().await {
                tracing::warn!("session refresh failed: {err}");
                return Err(FetchError::SessionExpired);
            }

            res = self.execute(spec).await?;
            if res.status() == StatusCode::UNAUTHORIZED {
                tracing::warn!(path = %spec.path, "still unauthorized after session refresh");
                return Err(FetchError::SessionExpired);
            }
        }

        let status = res.status();
        if !status.is_success() {
            let message = status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string();
            return Err(FetchError::Server { status, message });
        }

        Ok(res.json::<T>().await?)
    }

    /// Fetches one page of `R` for `intent`.
    ///
    /// The returned page carries the page number and count reported by the
    /// server, which may differ from the requested ones.
    pub async fn fetch_page<R: Resource>(
        &self,
        intent: &QueryIntent<R::Filters>,
        page: u32,
        size: u32,
    ) -> Result<Page<R::Record>, FetchError> {
        let spec = match intent {
            QueryIntent::FetchAll => R::list_request(page, size),
            QueryIntent::Search(filters) => R::search_request(filters, page, size)?,
        };

        let envelope: R::Envelope = self.send(&spec).await?;
        envelope
            .into_page()
            .map_err(|message| FetchError::Application {
                message: message
                    .unwrap_or_else(|| format!("Failed to {} {}", intent.verb(), R::LABEL)),
            })
    }

    /// Updates a user; `None` fields in `update` are left unchanged.
    ///
    /// Returns the successful response, which carries the updated user and
    /// the server's message when present.
    pub async fn update_user(
        &self,
        user_id: i64,
        update: &UserUpdate,
    ) -> Result<UserUpdateResponse, FetchError> {
        let spec = RequestSpec::put(format!("/api/admin/users/{user_id}")).json(update)?;
        let res: UserUpdateResponse = self.send(&spec).await?;
        if !res.success {
            return Err(FetchError::Application {
                message: res
                    .message
                    .unwrap_or_else(|| "Failed to update user".to_string()),
            });
        }
        Ok(res)
    }
}

#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    timeout: Option<Duration>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> ApiClientBuilder {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// Path of the session refresh endpoint used by the default refresher.
    pub fn refresh_path(mut self, path: &str) -> ApiClientBuilder {
        self.refresh_path = Some(path.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> ApiClientBuilder {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the default [`HttpTokenRefresher`].
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> ApiClientBuilder {
        self.refresher = Some(refresher);
        self
    }

    pub fn build(self) -> Result<ApiClient, BuildError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url =
            Url::parse(raw).map_err(|err| BuildError::InvalidBaseUrl(format!("{raw}: {err}")))?;

        let mut http = Client::builder().cookie_store(true);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        let refresher = match self.refresher {
            Some(refresher) => refresher,
            None => {
                let path = self.refresh_path.as_deref().unwrap_or(DEFAULT_REFRESH_PATH);
                let url = format!(
                    "{}/{}",
                    base_url.as_str().trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                Arc::new(HttpTokenRefresher::new(http.clone(), url))
            }
        };

        tracing::info!(base_url = %base_url, "admin api client ready");
        Ok(ApiClient {
            base_url,
            http,
            refresher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_follow_filters() {
        let spec = RequestSpec::get("/api/admin/transactions/search")
            .params([("symbol", "AAPL".to_string())])
            .page(2, 25);
        assert_eq!(
            spec.query,
            vec![
                ("symbol", "AAPL".to_string()),
                ("page", "2".to_string()),
                ("size", "25".to_string()),
            ]
        );
        assert_eq!(spec.method, Method::GET);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApiClient::new("not a url").err().unwrap();
        assert!(matches!(err, BuildError::InvalidBaseUrl(_)));
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.url("/api/admin/users"),
            "http://localhost:8080/api/admin/users"
        );
    }
}
