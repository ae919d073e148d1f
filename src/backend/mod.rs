//! Fetch backends: the capability to turn a URL into a [`BackendResult`].
//!
//! Backends are modeled as a plain capability trait rather than a fixed
//! enum of fetch strategies, so new transports register without touching
//! the selection logic. Headless-browser rendering is out of scope; only
//! plain HTTP and local-file retrieval are implemented here.

mod file;
mod http;

pub use file::FileBackend;
pub use http::HttpBackend;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::url_info::URLInfo;

/// Case-insensitive header map.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(&key.to_ascii_lowercase()).map(String::as_str)
    }
}

/// The raw output of one fetch attempt.
#[derive(Debug, Clone)]
pub struct BackendResult {
    pub final_url: String,
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub error: Option<String>,
}

impl BackendResult {
    #[must_use]
    pub fn success(final_url: impl Into<String>, status: u16, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            final_url: final_url.into(),
            status,
            headers,
            body,
            error: None,
        }
    }

    /// Build a synthetic error result: 503 connection error, 504 timeout,
    /// 500 unexpected, 403 policy refusal, 400 malformed input.
    #[must_use]
    pub fn synthetic_error(final_url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            final_url: final_url.into(),
            status,
            headers: Headers::default(),
            body: Vec::new(),
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The capability set a fetch backend must implement. Never throws past
/// its boundary — every transport failure is translated to a synthetic
/// [`BackendResult`] status before it is returned.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable name, used for selector registration and metrics.
    fn name(&self) -> &str;

    async fn crawl(&self, url: &URLInfo) -> BackendResult;

    /// Whether `result` represents usable content worth handing to the
    /// content processor (distinct from `is_success`, which a caller may
    /// use for retry decisions before this check applies).
    fn validate(&self, result: &BackendResult) -> bool {
        result.is_success()
    }

    /// Extract backend-specific metadata (e.g. timing, transfer size) as a
    /// free-form map for diagnostics; default implementation contributes
    /// nothing.
    fn process(&self, _result: &BackendResult) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// An in-process backend over a fixed URL → result table, used for tests
/// that need a deterministic, networkless fetch path.
#[derive(Default)]
pub struct DirectBackend {
    responses: std::sync::Mutex<HashMap<String, BackendResult>>,
}

impl DirectBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, url: impl Into<String>, result: BackendResult) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(url.into(), result);
    }
}

#[async_trait]
impl Backend for DirectBackend {
    fn name(&self) -> &str {
        "direct"
    }

    async fn crawl(&self, url: &URLInfo) -> BackendResult {
        let responses = self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        responses.get(url.normalized()).cloned().unwrap_or_else(|| {
            BackendResult::synthetic_error(url.normalized(), 404, "no response registered")
        })
    }
}
