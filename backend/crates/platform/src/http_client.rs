//! Resilient Outbound HTTP Client
//!
//! Every outbound call:
//! - is classified by the URL guard before any network activity
//! - resolves host names through [`GuardedResolver`], so the connection is
//!   made only to addresses that passed the block-list
//! - re-classifies and counts every redirect hop
//! - caps the response body while streaming
//! - retries transient failures (timeouts, connect errors, listed statuses)
//!   with exponential backoff, stopping early on cancellation

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, redirect};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::url_guard::{SchemePolicy, UnsafeUrl, classify, is_blocked_ip};

// ============================================================================
// Configuration
// ============================================================================

/// Outbound client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total time allowed for one attempt
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Maximum accepted response body size
    pub max_body_bytes: usize,
    pub max_redirects: usize,
    pub verify_tls: bool,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Response statuses treated as transient
    pub retryable_statuses: Vec<StatusCode>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_body_bytes: 10 * 1024 * 1024,
            max_redirects: 3,
            verify_tls: true,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            retryable_statuses: Vec::new(),
            user_agent: concat!("reading-list/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Backoff before retry number `retry` (1-based), with up to 10% jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);

        let jitter_range = delay.as_millis() as u64 / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };
        delay + Duration::from_millis(jitter)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Outbound request failures
#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("Refusing unsafe URL: {0}")]
    UnsafeUrl(#[from] UnsafeUrl),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Redirect limit of {0} exceeded")]
    TooManyRedirects(usize),

    #[error("Response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Upstream responded with retryable status {0}")]
    RetryableStatus(StatusCode),

    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<OutboundError>,
    },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP client could not be built: {0}")]
    Build(String),
}

impl OutboundError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OutboundError::Timeout | OutboundError::Connect(_) | OutboundError::RetryableStatus(_)
        )
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(unsafe_url) = find_in_chain::<UnsafeUrl>(&err) {
            return OutboundError::UnsafeUrl(unsafe_url.clone());
        }
        if let Some(limit) = find_in_chain::<RedirectLimit>(&err) {
            return OutboundError::TooManyRedirects(limit.0);
        }
        // The URL may carry credentials in its query string
        let err = err.without_url();
        if err.is_timeout() {
            OutboundError::Timeout
        } else if err.is_connect() {
            OutboundError::Connect(describe(&err))
        } else {
            OutboundError::Request(describe(&err))
        }
    }
}

#[derive(Debug, Error)]
#[error("redirect limit of {0} exceeded")]
struct RedirectLimit(usize);

fn find_in_chain<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        text.push_str(": ");
        text.push_str(&e.to_string());
        source = e.source();
    }
    text
}

// ============================================================================
// DNS resolution
// ============================================================================

/// Resolver that refuses host names resolving to blocked addresses
///
/// The addresses it returns are the only ones the connector will dial.
#[derive(Debug, Default, Clone, Copy)]
pub struct GuardedResolver;

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();
            let resolved: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await?
                .collect();
            let allowed = validate_resolved(&resolved)?;
            let addrs: Addrs = Box::new(allowed.into_iter());
            Ok::<_, Box<dyn StdError + Send + Sync>>(addrs)
        })
    }
}

/// Accept a resolution only if every address is outside the block-list
pub fn validate_resolved(addrs: &[SocketAddr]) -> Result<Vec<SocketAddr>, UnsafeUrl> {
    if addrs.is_empty() {
        return Err(UnsafeUrl::EmptyHost);
    }
    if let Some(blocked) = addrs.iter().find(|a| is_blocked_ip(a.ip())) {
        return Err(UnsafeUrl::BlockedAddress(blocked.ip()));
    }
    Ok(addrs.to_vec())
}

// ============================================================================
// Request / Response
// ============================================================================

/// Outbound request description
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Fully read response
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    pub body: Vec<u8>,
}

impl OutboundResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Client
// ============================================================================

/// SSRF-safe HTTP client with retries
#[derive(Debug, Clone)]
pub struct ResilientClient {
    inner: reqwest::Client,
    config: Arc<HttpClientConfig>,
}

impl ResilientClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, OutboundError> {
        Self::build(config, GuardedResolver)
    }

    /// `resolver` is the only source of addresses the connector dials
    fn build<R>(config: HttpClientConfig, resolver: R) -> Result<Self, OutboundError>
    where
        R: Resolve + 'static,
    {
        let max_redirects = config.max_redirects;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                return attempt.error(RedirectLimit(max_redirects));
            }
            match classify(attempt.url().as_str(), SchemePolicy::HttpOrHttps) {
                Ok(_) => attempt.follow(),
                Err(reason) => {
                    tracing::warn!(reason = reason.reason(), "Outbound redirect blocked by URL guard");
                    attempt.error(reason)
                }
            }
        });

        // A proxy would resolve names itself and bypass the resolver
        let inner = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(policy)
            .danger_accept_invalid_certs(!config.verify_tls)
            .dns_resolver(Arc::new(resolver))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OutboundError::Build(e.to_string()))?;

        if !config.verify_tls {
            tracing::warn!("Outbound TLS certificate verification is disabled");
        }

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Send a request with retries
    pub async fn request(&self, request: OutboundRequest) -> Result<OutboundResponse, OutboundError> {
        self.request_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Send a request, aborting as soon as `cancel` fires
    ///
    /// Cancellation during an attempt or a backoff delay yields
    /// [`OutboundError::Cancelled`] and no further attempts.
    pub async fn request_with_cancel(
        &self,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<OutboundResponse, OutboundError> {
        let url = classify(&request.url, SchemePolicy::HttpOrHttps).inspect_err(|reason| {
            tracing::warn!(reason = reason.reason(), "Outbound request blocked by URL guard");
        })?;

        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(OutboundError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OutboundError::Cancelled),
                outcome = self.attempt(&request, &url) => outcome,
            };

            let err = match outcome {
                Ok(response) => return Ok(response),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => err,
            };

            if attempt >= max_attempts {
                tracing::warn!(
                    method = %request.method,
                    host = url.host_str().unwrap_or_default(),
                    attempts = attempt,
                    error = %err,
                    "Outbound request retries exhausted"
                );
                return Err(OutboundError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.config.backoff(attempt);
            tracing::debug!(
                method = %request.method,
                host = url.host_str().unwrap_or_default(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying outbound request"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OutboundError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt(
        &self,
        request: &OutboundRequest,
        url: &Url,
    ) -> Result<OutboundResponse, OutboundError> {
        let mut builder = self
            .inner
            .request(request.method.clone(), url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let mut response = builder.send().await.map_err(OutboundError::from_reqwest)?;

        let status = response.status();
        if self.config.retryable_statuses.contains(&status) {
            return Err(OutboundError::RetryableStatus(status));
        }

        let headers = response.headers().clone();
        let final_url = response.url().clone();

        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(OutboundError::ResponseTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(OutboundError::from_reqwest)? {
            if body.len() + chunk.len() > limit {
                return Err(OutboundError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(OutboundResponse {
            status,
            headers,
            url: final_url,
            body,
        })
    }
}
