//! Remote rewrite call for the shortening pipeline.
//!
//! # Architecture
//!
//! - [`Rewriter`] - the capability the pipeline depends on: one request in,
//!   one rewritten text out, all-or-nothing
//! - [`openai`] - Chat Completions implementation of [`Rewriter`]
//! - [`retry`] - bounded exponential backoff returning a tagged outcome
//!
//! # Error Handling
//!
//! Failures come back as [`RewriteError`], tagged transient or fatal, never
//! as a process exit. Whether a failure ends one document or the whole run is
//! the caller's decision.

pub mod openai;
pub mod retry;

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

pub use openai::OpenAIRewriter;
pub use shorten_types;
use shorten_types::{ApiKey, ChatMessage, SamplingParams};

/// Canonical OpenAI API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default per-request timeout. Long chunks can take a while to generate.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT_SECS: u64 = 30;

// reqwest only exposes tcp_keepalive (idle time); interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

fn base_client_builder(https_only: bool) -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("shorten/", env!("CARGO_PKG_VERSION"))),
    );

    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(https_only)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// Build a client for `config`'s endpoint.
///
/// HTTPS is enforced unless the endpoint is a loopback host.
pub fn http_client(config: &ApiConfig) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(!config.is_loopback())
        .timeout(config.timeout)
        .build()
}

/// Read an error response body, keeping at most 32 KiB.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

fn host_is_loopback(url: &reqwest::Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

/// Credentials and endpoint for the completion service.
///
/// # Example
///
/// ```
/// use shorten_providers::{ApiConfig, shorten_types::ApiKey};
///
/// let key = ApiKey::new("sk-test").unwrap();
/// let config = ApiConfig::new(key, "https://api.openai.com/v1").unwrap();
/// assert_eq!(
///     config.chat_completions_url(),
///     "https://api.openai.com/v1/chat/completions"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    api_key: ApiKey,
    base_url: reqwest::Url,
    timeout: Duration,
    retry: retry::RetryConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiConfigError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("base URL {url:?} must use https (plain http is only allowed for loopback hosts)")]
    InsecureBaseUrl { url: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl ApiConfig {
    pub fn new(api_key: ApiKey, base_url: &str) -> Result<Self, ApiConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed).map_err(|e| ApiConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "https" => {}
            "http" if host_is_loopback(&url) => {}
            "http" => {
                return Err(ApiConfigError::InsecureBaseUrl {
                    url: base_url.to_string(),
                });
            }
            other => {
                return Err(ApiConfigError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    reason: format!("unsupported scheme {other:?}"),
                });
            }
        }

        Ok(Self {
            api_key,
            base_url: url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: retry::RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: retry::RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn retry(&self) -> &retry::RetryConfig {
        &self.retry
    }

    #[must_use]
    pub fn is_loopback(&self) -> bool {
        host_is_loopback(&self.base_url)
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// One remote rewrite call.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub sampling: SamplingParams,
}

/// Tagged failure of a remote rewrite call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Retries exhausted on a condition that may clear up later.
    #[error("completion endpoint still failing after {attempts} attempt(s): {message}")]
    Transient { attempts: u32, message: String },
    /// The service refused the request or returned something unusable.
    #[error("completion request failed: {message}")]
    Fatal { message: String },
}

impl RewriteError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// The remote rewrite capability.
///
/// Implementations own their retry policy. A returned `Ok` is the complete
/// rewritten text; there are no partial results.
pub trait Rewriter: Send + Sync {
    fn rewrite(
        &self,
        request: &RewriteRequest<'_>,
    ) -> impl Future<Output = Result<String, RewriteError>> + Send;
}

impl<R: Rewriter> Rewriter for &R {
    fn rewrite(
        &self,
        request: &RewriteRequest<'_>,
    ) -> impl Future<Output = Result<String, RewriteError>> + Send {
        (**self).rewrite(request)
    }
}
