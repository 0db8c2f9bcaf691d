//! Page acquisition and crawl orchestration
//!
//! The crawler owns all I/O: listing pages, event pages and organizer
//! profile pages go through one [`DocumentLoader`]. Extraction itself runs
//! synchronously between fetches, so parsed documents never cross an await.

pub mod fetcher;
pub mod list;
pub mod url;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::HarvestErrorTrait;
use crate::models::{CrawlState, CrawlStats, EventRecord};
use crate::parser::RecordAssembler;
use crate::utils::error::{CrawlerError, FetchError};

pub use fetcher::PageFetcher;
pub use list::{DiscoveredLink, ListingCrawler, ListingSource};
pub use url::UrlResolver;

/// Source of raw page markup
///
/// Retry policy belongs to the loader; callers treat any error as "no page".
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl DocumentLoader for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_page(url).await
    }
}

/// Shutdown flag that flips when the process receives Ctrl-C
pub fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            let _ = tx.send(true);
        }
    });
    rx
}

/// Records and counters from one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub records: Vec<EventRecord>,
    pub stats: CrawlStats,
}

/// Fetch, extract and filter event pages under a concurrency bound
pub struct CrawlController<L: DocumentLoader + 'static> {
    loader: Arc<L>,
    assembler: Arc<RecordAssembler>,
    listing: ListingCrawler,
    max_concurrent: usize,
    fetch_profiles: bool,
    shutdown: watch::Receiver<bool>,
}

impl<L: DocumentLoader + 'static> CrawlController<L> {
    /// Create a controller that never observes a shutdown request
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Parse` if the configured base URL is invalid
    pub fn new(loader: Arc<L>, config: &Config) -> Result<Self, CrawlerError> {
        let (_, shutdown) = watch::channel(false);
        Ok(Self {
            loader,
            assembler: Arc::new(RecordAssembler::new(&config.extraction)),
            listing: ListingCrawler::new(&config.crawler)?,
            max_concurrent: config.crawler.max_concurrent_requests.max(1),
            fetch_profiles: config.crawler.fetch_profiles,
            shutdown,
        })
    }

    /// Stop scheduling new pages once `shutdown` turns true
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Crawl every event linked from a listing page
    ///
    /// A listing page without event links yields an empty outcome and a
    /// warning rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Fetch` if the listing page itself cannot be
    /// loaded
    pub async fn crawl_listing<S: AsRef<str>>(
        &self,
        source: &ListingSource,
        keywords: &[S],
        mut state: Option<&mut CrawlState>,
    ) -> Result<CrawlOutcome, CrawlerError> {
        let links = match self
            .listing
            .collect(self.loader.as_ref(), source, keywords)
            .await
        {
            Ok(links) => links,
            Err(CrawlerError::NoEventsFound) => {
                tracing::warn!(source = %source, "Listing page has no event links");
                return Ok(CrawlOutcome::default());
            }
            Err(e) => return Err(e),
        };

        if let Some(state) = state.as_deref_mut() {
            state.last_source = Some(source.to_string());
        }

        let urls = links.into_iter().map(|link| link.url).collect();
        Ok(self.crawl_urls(urls, keywords, state).await)
    }

    /// Fetch and extract the given event pages
    ///
    /// Records come back in input order. Pages that fail to load are logged
    /// and skipped. Once shutdown is requested no new page is scheduled, but
    /// pages already in flight are still collected.
    pub async fn crawl_urls<S: AsRef<str>>(
        &self,
        urls: Vec<String>,
        keywords: &[S],
        mut state: Option<&mut CrawlState>,
    ) -> CrawlOutcome {
        let started = Instant::now();
        let mut stats = CrawlStats {
            discovered: urls.len() as u32,
            ..CrawlStats::default()
        };

        let mut tasks = JoinSet::new();
        let mut results: Vec<(usize, EventRecord)> = Vec::new();
        let mut pending = urls.into_iter().enumerate();

        loop {
            while tasks.len() < self.max_concurrent {
                if *self.shutdown.borrow() {
                    let remaining = pending
                        .by_ref()
                        .filter(|(_, url)| !state.as_deref().is_some_and(|s| s.is_completed(url)))
                        .count() as u32;
                    if remaining > 0 {
                        tracing::warn!(remaining, "Crawl cancelled, skipping unscheduled pages");
                    }
                    stats.cancelled += remaining;
                    break;
                }
                let Some((index, url)) = pending.next() else {
                    break;
                };
                if state.as_deref().is_some_and(|s| s.is_completed(&url)) {
                    tracing::debug!(url = %url, "Already extracted in a previous run");
                    continue;
                }

                let loader = Arc::clone(&self.loader);
                let assembler = Arc::clone(&self.assembler);
                let fetch_profiles = self.fetch_profiles;
                tasks.spawn(async move {
                    let result = harvest(loader.as_ref(), &assembler, &url, fetch_profiles).await;
                    (index, url, result)
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            match joined {
                Ok((index, url, Ok(record))) => {
                    stats.fetched += 1;
                    stats.extracted += 1;
                    if let Some(state) = state.as_deref_mut() {
                        state.mark_completed(&url);
                    }
                    if record.matches_keywords(keywords) {
                        results.push((index, record));
                    } else {
                        stats.filtered_out += 1;
                        tracing::debug!(url = %url, "Record dropped by keyword filter");
                    }
                }
                Ok((_, url, Err(e))) => {
                    if matches!(e, CrawlerError::Parse(_)) {
                        stats.fetched += 1;
                    }
                    stats.failed += 1;
                    if let Some(state) = state.as_deref_mut() {
                        state.record_error();
                    }
                    tracing::warn!(
                        url = %url,
                        category = %e.category(),
                        error = %e,
                        "Skipping event page"
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(error = %e, "Extraction task failed");
                }
            }
        }

        results.sort_by_key(|(index, _)| *index);
        let records: Vec<EventRecord> = results.into_iter().map(|(_, r)| r).collect();
        stats.duration_secs = started.elapsed().as_secs();

        if records.is_empty() {
            tracing::warn!(
                discovered = stats.discovered,
                failed = stats.failed,
                "No events extracted"
            );
        }

        tracing::info!(
            discovered = stats.discovered,
            fetched = stats.fetched,
            extracted = stats.extracted,
            filtered_out = stats.filtered_out,
            failed = stats.failed,
            cancelled = stats.cancelled,
            duration_secs = stats.duration_secs,
            "Crawl finished"
        );

        CrawlOutcome { records, stats }
    }

    /// Fetch and extract a single event page
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Fetch` if the page cannot be loaded and
    /// `CrawlerError::Parse` if it holds no markup
    pub async fn extract_one(&self, url: &str) -> Result<EventRecord, CrawlerError> {
        harvest(self.loader.as_ref(), &self.assembler, url, self.fetch_profiles).await
    }
}

/// Fetch one event page, extract it, then enrich it from the organizer profile
async fn harvest<L: DocumentLoader + ?Sized>(
    loader: &L,
    assembler: &RecordAssembler,
    url: &str,
    fetch_profiles: bool,
) -> Result<EventRecord, CrawlerError> {
    tracing::debug!(url = %url, "Fetching event page");
    let markup = loader.fetch(url).await?;
    let mut record = assembler.extract(url, &markup)?;

    if fetch_profiles {
        if let Some(profile_url) = record.profile_url().map(str::to_string) {
            match loader.fetch(&profile_url).await {
                Ok(profile) => assembler.merge_profile(&mut record, &profile_url, &profile),
                Err(e) => {
                    tracing::debug!(url = %profile_url, error = %e, "Profile page unavailable");
                }
            }
        }
    }

    Ok(record.finalize())
}
