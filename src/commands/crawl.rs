use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use eventharvest::config::Config;
use eventharvest::crawler::{
    shutdown_on_ctrl_c, CrawlController, CrawlOutcome, ListingSource, PageFetcher,
};
use eventharvest::models::CrawlState;
use eventharvest::storage::{preview, EventExporter};

/// Command-line arguments of the `crawl` subcommand
#[derive(Debug, Clone, Default)]
pub struct CrawlArgs {
    pub source: String,
    pub slug: Option<String>,
    pub city: Option<String>,
    pub keywords: Vec<String>,
    pub url: Option<String>,
    pub output_format: Option<String>,
    pub output_prefix: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub no_profiles: bool,
}

impl CrawlArgs {
    /// Fold command-line overrides into the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(format) = &self.output_format {
            config.output.format = format.clone();
        }
        if let Some(prefix) = &self.output_prefix {
            config.output.prefix = prefix.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.no_profiles {
            config.crawler.fetch_profiles = false;
        }
    }
}

pub async fn crawl(mut config: Config, args: CrawlArgs) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let exporter = EventExporter::new(&config.output)?;
    let fetcher = PageFetcher::new(&config.crawler).context("Failed to create fetcher")?;
    let controller = CrawlController::new(Arc::new(fetcher), &config)?
        .with_shutdown(shutdown_on_ctrl_c());

    let mut state = args.state.as_deref().map(CrawlState::load);

    println!("Starting Luma Event Harvest");
    println!("===========================");

    let outcome = if let Some(url) = &args.url {
        println!("Extracting single event: {url}");
        match controller.extract_one(url).await {
            Ok(record) => {
                if let Some(state) = state.as_mut() {
                    state.mark_completed(url);
                }
                let mut outcome = CrawlOutcome::default();
                outcome.stats.discovered = 1;
                outcome.stats.fetched = 1;
                outcome.stats.extracted = 1;
                outcome.records.push(record);
                outcome
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Could not extract event");
                CrawlOutcome::default()
            }
        }
    } else {
        let source = ListingSource::from_args(
            &args.source,
            args.slug.as_deref(),
            args.city.as_deref(),
        )?;
        println!("Source: {source}");
        if !args.keywords.is_empty() {
            println!("Keywords: {}", args.keywords.join(", "));
        }

        controller
            .crawl_listing(&source, &args.keywords, state.as_mut())
            .await
            .with_context(|| format!("Failed to crawl listing page for {source}"))?
    };

    if let (Some(path), Some(state)) = (&args.state, &state) {
        state
            .save(path)
            .with_context(|| format!("Failed to save crawl state: {}", path.display()))?;
    }

    print_summary(&outcome);

    if outcome.records.is_empty() {
        tracing::warn!("No events found matching the criteria");
        return Ok(());
    }

    let paths = exporter.export(&outcome.records)?;
    for path in &paths {
        println!("Wrote {}", path.display());
    }

    println!();
    print!("{}", preview(&outcome.records, config.output.preview_count)?);

    Ok(())
}

fn print_summary(outcome: &CrawlOutcome) {
    let stats = &outcome.stats;
    println!("\nHarvest Summary");
    println!("===============");
    println!("Event links: {}", stats.discovered);
    println!("Pages fetched: {}", stats.fetched);
    println!("Records extracted: {}", stats.extracted);
    println!("Filtered out: {}", stats.filtered_out);
    println!("Failed: {} ({:.1}%)", stats.failed, stats.error_rate());
    if stats.cancelled > 0 {
        println!("Cancelled: {}", stats.cancelled);
    }
    println!("Kept: {}", stats.kept());
    println!("Duration: {}s", stats.duration_secs);
}
