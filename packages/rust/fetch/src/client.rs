//! HTTP client for lightweight fetches.
//!
//! Wraps a shared reqwest client with a rotating User-Agent pool and a
//! response-size cap, mapping transport failures onto [`FetchErrorKind`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use tracing::trace;

use pathweaver_shared::{FetchErrorKind, PathweaverError, Result};

/// Maximum response body size accepted (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Desktop browser identities, rotated per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// HTTP client with per-request User-Agent rotation.
pub struct HttpClient {
    inner: reqwest::Client,
    next_agent: AtomicUsize,
}

impl HttpClient {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .use_rustls_tls()
            .build()
            .map_err(|e| PathweaverError::config(format!("http client build failed: {e}")))?;

        Ok(Self {
            inner,
            next_agent: AtomicUsize::new(0),
        })
    }

    /// Access the underlying reqwest client (for provider API calls that
    /// manage their own headers).
    pub fn raw(&self) -> &reqwest::Client {
        &self.inner
    }

    fn user_agent(&self) -> &'static str {
        let i = self.next_agent.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[i % USER_AGENTS.len()]
    }

    /// GET a page body as text. 403/429 map to `Blocked`, timeouts to
    /// `Timeout`, other transport failures to `NetworkError`.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let agent = self.user_agent();
        trace!(url, agent, "http get");

        let response = self
            .inner
            .get(url)
            .header(reqwest::header::USER_AGENT, agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| PathweaverError::fetch(url, classify(&e)))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PathweaverError::fetch(url, FetchErrorKind::Blocked));
        }
        if !status.is_success() {
            return Err(PathweaverError::fetch(url, FetchErrorKind::NetworkError));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PathweaverError::fetch(url, classify(&e)))?;

        if body.len() > MAX_BODY_BYTES {
            return Err(PathweaverError::fetch(url, FetchErrorKind::ParseFailure));
        }
        Ok(body)
    }

    /// HEAD-style liveness check: true when the URL answers with a
    /// success status. GET is used because some doc hosts reject HEAD.
    pub async fn is_live(&self, url: &str) -> bool {
        match self
            .inner
            .get(url)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn classify(error: &reqwest::Error) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_decode() || error.is_body() {
        FetchErrorKind::ParseFailure
    } else {
        FetchErrorKind::NetworkError
    }
}
