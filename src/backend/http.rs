//! HTTP fetch backend over `reqwest`: one shared, reusable `Client` with a
//! per-request timeout and an explicit `User-Agent`. Rate limiting and
//! retries are deliberately absent here — that's the Crawl Engine's job,
//! not the backend's.

use std::time::Duration;

use async_trait::async_trait;

use crate::url_info::URLInfo;

use super::{Backend, BackendResult, Headers};

pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a backend with a reusable connection pool, the configured
    /// timeout and user-agent, and redirects followed up to a sane default
    /// depth.
    pub fn new(user_agent: &str, timeout: Duration, follow_redirects: bool) -> Result<Self, reqwest::Error> {
        let redirect_policy = if follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(redirect_policy)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn crawl(&self, url: &URLInfo) -> BackendResult {
        let request_url = url.normalized().to_string();
        let response = match self.client.get(&request_url).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return BackendResult::synthetic_error(request_url, 504, format!("request timed out: {e}"));
            }
            Err(e) if e.is_connect() => {
                return BackendResult::synthetic_error(request_url, 503, format!("connection error: {e}"));
            }
            Err(e) => {
                return BackendResult::synthetic_error(request_url, 500, format!("unexpected error: {e}"));
            }
        };

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str(), v.to_string());
            }
        }

        match response.bytes().await {
            Ok(bytes) => BackendResult::success(final_url, status, headers, bytes.to_vec()),
            Err(e) => BackendResult::synthetic_error(final_url, 500, format!("failed to read response body: {e}")),
        }
    }
}
