//! Configuration management for the event harvester
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on fetch retries per page
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler configuration
    pub crawler: CrawlerConfig,

    /// Field extraction configuration
    pub extraction: ExtractionConfig,

    /// Export configuration
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Site root used for listing pages and relative links
    pub base_url: String,

    /// Maximum number of concurrent requests
    pub max_concurrent_requests: usize,

    /// Rate limit (requests per second)
    pub rate_limit: f64,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// User agent string; empty means rotate through browser agents
    pub user_agent: String,

    /// Enable cookie persistence
    pub enable_cookies: bool,

    /// Event links taken from an explore or calendar page
    pub max_events_per_listing: usize,

    /// Event links taken from a city page
    pub max_events_per_city: usize,

    /// Fetch the organizer profile page for more social links
    pub fetch_profiles: bool,
}

/// Field extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Social links kept per record
    pub max_social_links: usize,

    /// Social links taken from one organizer profile page
    pub max_profile_links: usize,

    /// Extra selectors tried after the built-in event name selectors
    pub extra_name_selectors: Vec<String>,

    /// Extra selectors tried after the built-in location selectors
    pub extra_location_selectors: Vec<String>,

    /// Extra selectors tried after the built-in description selectors
    pub extra_details_selectors: Vec<String>,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format (json, csv, both)
    pub format: String,

    /// File name prefix
    pub prefix: String,

    /// Directory the files are written to
    pub directory: PathBuf,

    /// Records echoed to stdout after export
    pub preview_count: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|v| {
        v.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = std::env::var("EVENTHARVEST_BASE_URL").unwrap_or(defaults.crawler.base_url);

        let max_concurrent_requests = env_parse("EVENTHARVEST_MAX_CONCURRENT_REQUESTS")
            .unwrap_or(defaults.crawler.max_concurrent_requests);

        let rate_limit =
            env_parse("EVENTHARVEST_RATE_LIMIT").unwrap_or(defaults.crawler.rate_limit);

        let request_timeout_secs = env_parse("EVENTHARVEST_REQUEST_TIMEOUT")
            .unwrap_or(defaults.crawler.request_timeout_secs);

        let max_retries =
            env_parse("EVENTHARVEST_MAX_RETRIES").unwrap_or(defaults.crawler.max_retries);

        let user_agent =
            std::env::var("EVENTHARVEST_USER_AGENT").unwrap_or(defaults.crawler.user_agent);

        let fetch_profiles =
            env_parse("EVENTHARVEST_FETCH_PROFILES").unwrap_or(defaults.crawler.fetch_profiles);

        let max_social_links = env_parse("EVENTHARVEST_MAX_SOCIAL_LINKS")
            .unwrap_or(defaults.extraction.max_social_links);

        let extra_name_selectors = env_list("EVENTHARVEST_NAME_SELECTORS")
            .unwrap_or(defaults.extraction.extra_name_selectors);

        let extra_location_selectors = env_list("EVENTHARVEST_LOCATION_SELECTORS")
            .unwrap_or(defaults.extraction.extra_location_selectors);

        let extra_details_selectors = env_list("EVENTHARVEST_DETAILS_SELECTORS")
            .unwrap_or(defaults.extraction.extra_details_selectors);

        let output_format =
            std::env::var("EVENTHARVEST_OUTPUT_FORMAT").unwrap_or(defaults.output.format);

        let output_prefix =
            std::env::var("EVENTHARVEST_OUTPUT_PREFIX").unwrap_or(defaults.output.prefix);

        let output_dir = std::env::var("EVENTHARVEST_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output.directory);

        let log_level =
            std::env::var("EVENTHARVEST_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("EVENTHARVEST_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            crawler: CrawlerConfig {
                base_url,
                max_concurrent_requests,
                rate_limit,
                request_timeout_secs,
                max_retries,
                user_agent,
                fetch_profiles,
                ..defaults.crawler
            },
            extraction: ExtractionConfig {
                max_social_links,
                extra_name_selectors,
                extra_location_selectors,
                extra_details_selectors,
                ..defaults.extraction
            },
            output: OutputConfig {
                format: output_format,
                prefix: output_prefix,
                directory: output_dir,
                ..defaults.output
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when given, else from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.max_concurrent_requests == 0 {
            anyhow::bail!("max_concurrent_requests must be greater than 0");
        }

        if self.crawler.max_retries > MAX_RETRIES_LIMIT {
            anyhow::bail!(
                "max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.crawler.max_retries
            );
        }

        if self.crawler.rate_limit <= 0.0 || !self.crawler.rate_limit.is_finite() {
            anyhow::bail!("rate_limit must be positive");
        }

        url::Url::parse(&self.crawler.base_url)
            .with_context(|| format!("base_url is not a valid URL: {}", self.crawler.base_url))?;

        if self.crawler.max_events_per_listing == 0 || self.crawler.max_events_per_city == 0 {
            anyhow::bail!("listing caps must be greater than 0");
        }

        if self.extraction.max_social_links == 0 {
            anyhow::bail!("max_social_links must be greater than 0");
        }

        if !matches!(self.output.format.as_str(), "json" | "csv" | "both") {
            anyhow::bail!(
                "output format must be json, csv or both, got {}",
                self.output.format
            );
        }

        if self.output.prefix.trim().is_empty() {
            anyhow::bail!("output prefix must not be empty");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://lu.ma"),
            max_concurrent_requests: 4,
            rate_limit: 1.0,
            request_timeout_secs: 30,
            max_retries: 2,
            user_agent: String::new(),
            enable_cookies: true,
            max_events_per_listing: 20,
            max_events_per_city: 30,
            fetch_profiles: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_social_links: 5,
            max_profile_links: 3,
            extra_name_selectors: Vec::new(),
            extra_location_selectors: Vec::new(),
            extra_details_selectors: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: String::from("both"),
            prefix: String::from("events"),
            directory: PathBuf::from("."),
            preview_count: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}
