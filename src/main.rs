use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventharvest::config::Config;

mod commands;

use commands::{crawl, extract, CrawlArgs};

#[derive(Parser)]
#[command(
    name = "eventharvest",
    version,
    about = "Harvest structured event records from Luma listing and event pages",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// TOML configuration file (defaults to EVENTHARVEST_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a listing page (or one event) and export the records
    Crawl {
        /// Listing source; auto-detected when --city or --slug is given
        #[arg(long, default_value = "explore", value_parser = ["explore", "custom", "city"])]
        source: String,

        /// Calendar or community slug for the custom source
        #[arg(long)]
        slug: Option<String>,

        /// City name for the city source (e.g. new-delhi, mumbai)
        #[arg(long)]
        city: Option<String>,

        /// Keep only events mentioning one of these keywords
        #[arg(short, long, num_args = 1..)]
        keywords: Vec<String>,

        /// Extract a single event page instead of a listing
        #[arg(short, long)]
        url: Option<String>,

        /// Output format
        #[arg(long, value_parser = ["json", "csv", "both"])]
        output_format: Option<String>,

        /// Output file name prefix
        #[arg(long)]
        output_prefix: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crawl state file; already extracted pages are skipped
        #[arg(long)]
        state: Option<PathBuf>,

        /// Do not fetch organizer profile pages
        #[arg(long)]
        no_profiles: bool,
    },

    /// Extract one saved event page without network access
    Extract {
        /// HTML file to read
        input: PathBuf,

        /// URL the page was fetched from, used to resolve relative links
        #[arg(short, long, default_value = "https://lu.ma/")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl {
            source,
            slug,
            city,
            keywords,
            url,
            output_format,
            output_prefix,
            output,
            state,
            no_profiles,
        } => {
            tracing::info!(
                source = %source,
                slug = ?slug,
                city = ?city,
                keywords = ?keywords,
                url = ?url,
                "Starting crawl command"
            );
            let args = CrawlArgs {
                source,
                slug,
                city,
                keywords,
                url,
                output_format,
                output_prefix,
                output_dir: output,
                state,
                no_profiles,
            };
            crawl(config, args).await?;
        }

        Commands::Extract { input, url } => {
            tracing::info!(input = %input.display(), url = %url, "Starting extract command");
            extract(&config, input, url)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("eventharvest=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("eventharvest=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
