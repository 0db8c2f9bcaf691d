//! HTTP page fetcher with rate limiting and charset detection
//!
//! This module provides the document loader used for event, listing and
//! organizer profile pages, with features including:
//! - User-Agent rotation
//! - Rate limiting with governor, shared by every request
//! - A concurrency bound on in-flight requests
//! - Automatic retry with exponential backoff for transient failures
//! - Charset detection and conversion with encoding_rs

use crate::config::CrawlerConfig;
use crate::utils::error::FetchError;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use regex::bytes::Regex as BytesRegex;
use reqwest::{
    header::{
        HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER,
        USER_AGENT,
    },
    Client, Response,
};
use std::num::NonZeroU32;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
];

/// Bytes scanned for a `<meta charset>` declaration
const META_SNIFF_BYTES: usize = 2048;

static META_CHARSET: LazyLock<BytesRegex> = LazyLock::new(|| {
    BytesRegex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_\-:.]+)"#).unwrap()
});

/// Rate-limited HTTP page fetcher
///
/// One fetcher is shared by every task of a crawl, so its rate limit and
/// concurrency bound cover event pages and profile pages alike.
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Bound on requests in flight
    in_flight: Semaphore,

    /// Maximum number of retry attempts for transient failures
    max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    base_delay_ms: u64,

    /// Fixed User-Agent; rotate through the pool when `None`
    user_agent: Option<String>,

    /// Referer sent with every request
    referer: Option<String>,
}

impl PageFetcher {
    /// Create a new fetcher from crawler configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .cookie_store(config.enable_cookies)
            .build()?;

        let user_agent = Some(config.user_agent.trim())
            .filter(|ua| !ua.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota_for(config.rate_limit)),
            in_flight: Semaphore::new(config.max_concurrent_requests.max(1)),
            max_retries: config.max_retries,
            base_delay_ms: 1000,
            user_agent,
            referer: Url::parse(&config.base_url).ok().map(|u| u.to_string()),
        })
    }

    /// Override the backoff base delay
    #[must_use]
    pub fn with_backoff(mut self, base_delay: Duration) -> Self {
        self.base_delay_ms = base_delay.as_millis() as u64;
        self
    }

    /// Fetch a page with rate limiting and retry logic
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for unparsable URLs, the status for
    /// non-retryable HTTP failures, and `FetchError::MaxRetriesExceeded`
    /// once transient failures exhaust the retry budget.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| FetchError::Decode("fetcher closed".to_string()))?;

        self.fetch_with_retry(url).await
    }

    /// Fetch with exponential backoff retry logic
    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                tracing::debug!(url, attempt, delay_ms = delay.as_millis() as u64, "Retrying fetch");
                tokio::time::sleep(delay).await;
            }

            self.rate_limiter.until_ready().await;

            let error = match self
                .client
                .get(url)
                .headers(self.build_headers())
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return self.decode_response(response).await;
                }
                Ok(response) => FetchError::HttpStatus(response.status().as_u16()),
                Err(e) if e.is_timeout() => FetchError::Timeout,
                Err(e) => FetchError::Http(e),
            };

            if !error.is_transient() {
                return Err(error);
            }

            tracing::debug!(url, attempt, error = %error, "Transient fetch failure");
            last_error = Some(error);
        }

        if let Some(error) = last_error {
            tracing::debug!(url, error = %error, "Retries exhausted");
        }
        Err(FetchError::MaxRetriesExceeded)
    }

    /// Delay before retry `attempt`, doubling from the base delay
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Decode the response body using its declared or sniffed charset
    async fn decode_response(&self, response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await?;

        self.decode_bytes(&bytes, &content_type)
    }

    /// Decode bytes to a string with charset detection
    ///
    /// Tries, in order:
    /// 1. The charset named by the Content-Type header
    /// 2. Strict UTF-8
    /// 3. A `<meta charset>` declaration near the top of the page
    /// 4. Windows-1252, which accepts any byte sequence
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` if the body does not match the charset
    /// the server declared
    pub fn decode_bytes(&self, bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
        if let Some(encoding) = header_charset(content_type) {
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                return Err(FetchError::Decode(format!(
                    "body is not valid {}",
                    encoding.name()
                )));
            }
            return Ok(text.into_owned());
        }

        if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
            return Ok(text.into_owned());
        }

        if let Some(encoding) = meta_charset(bytes) {
            let (text, _, _) = encoding.decode(bytes);
            return Ok(text.into_owned());
        }

        let (text, _, _) = WINDOWS_1252.decode(bytes);
        Ok(text.into_owned())
    }

    /// Build browser-like HTTP headers
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let user_agent = match &self.user_agent {
            Some(ua) => HeaderValue::from_str(ua).ok(),
            None => Some(HeaderValue::from_static(self.random_user_agent())),
        };
        if let Some(user_agent) = user_agent {
            headers.insert(USER_AGENT, user_agent);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));

        if let Some(referer) = self
            .referer
            .as_deref()
            .and_then(|r| HeaderValue::from_str(r).ok())
        {
            headers.insert(REFERER, referer);
        }

        headers
    }

    /// Get a random user agent from the pool
    fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
    }
}

/// Rate limiter quota for a possibly fractional requests-per-second value
fn quota_for(rate_limit: f64) -> Quota {
    if rate_limit >= 1.0 {
        let per_second = NonZeroU32::new(rate_limit.round() as u32).unwrap_or(NonZeroU32::MIN);
        return Quota::per_second(per_second);
    }

    let period = Duration::from_secs_f64(1.0 / rate_limit.max(0.001));
    Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
}

fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}
