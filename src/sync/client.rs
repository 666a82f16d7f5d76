//! HTTP access to the remote paginated collections.
//!
//! [`PageSource`] is the seam between the page walker and the network so the
//! walker, snapshot builder and delta synchronizer can be driven by
//! in-memory pages in tests.

use chrono::SecondsFormat;
use serde_json::Value;

use super::pagination::PageRequest;
use crate::config::ApiConfig;

/// Why a single page could not be retrieved.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// The request never produced a response (DNS, connect, timeout, ...)
    Transport(String),
    /// The server answered with a non-2xx status
    Status(u16),
    /// The body was not valid JSON
    Decode(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Transport(e) => write!(f, "transport error: {}", e),
            FetchFailure::Status(code) => write!(f, "server returned status {}", code),
            FetchFailure::Decode(e) => write!(f, "invalid response body: {}", e),
        }
    }
}

impl std::error::Error for FetchFailure {}

/// A remote collection that can be read one page at a time.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetches the 1-based `page` of `request` and returns the raw JSON body.
    async fn fetch_page(&self, request: &PageRequest, page: u32) -> Result<Value, FetchFailure>;
}

/// Errors building a client from configuration.
#[derive(Debug)]
pub enum ClientError {
    /// No API key configured
    NotConfigured,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::NotConfigured => write!(
                f,
                "Hevy API not configured. Add api.api_key to config or set HEVY_API_KEY."
            ),
        }
    }
}

impl std::error::Error for ClientError {}

/// Client for the Hevy public API.
pub struct HevyClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HevyClient {
    /// Creates a client from config.
    ///
    /// Returns an error if no API key is configured.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let api_key = config.api_key.as_ref().ok_or(ClientError::NotConfigured)?;
        Ok(Self::new(config.base_url.value.clone(), api_key.value.clone()))
    }

    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for one page of a resource.
    ///
    /// The `since` cursor is percent-encoded, so `:` travels as `%3A`. It is
    /// truncated to whole seconds, so a sync may re-request up to one second
    /// of events already applied. Replaying them leaves the mirror unchanged.
    fn build_url(&self, request: &PageRequest, page: u32) -> String {
        let mut url = format!(
            "{}/{}?page={}&pageSize={}",
            self.base_url.trim_end_matches('/'),
            request.path,
            page,
            request.page_size
        );
        if let Some(since) = request.since {
            let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
            url.push_str("&since=");
            url.push_str(&urlencoding::encode(&since));
        }
        url
    }
}

impl PageSource for HevyClient {
    async fn fetch_page(&self, request: &PageRequest, page: u32) -> Result<Value, FetchFailure> {
        let url = self.build_url(request, page);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchFailure::Decode(e.to_string()))
    }
}
