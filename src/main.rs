//! Forum-Scribe main entry point
//!
//! This is the command-line interface for the Forum-Scribe thread harvester.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use forum_scribe::config::{load_config, validate, Config};
use forum_scribe::crawler::crawl;
use forum_scribe::output::{
    compute_statistics, deduplicate_file, load_documents, print_statistics, DedupKey,
    JsonFileSink,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Forum-Scribe: a polite forum thread harvester
///
/// Forum-Scribe walks a subforum's paginated topic listing, collects every
/// post of every topic, and writes the result as one JSON document.
#[derive(Parser, Debug)]
#[command(name = "forum-scribe")]
#[command(version)]
#[command(about = "A polite forum thread harvester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a subforum and write its topics to a JSON document
    Crawl(CrawlArgs),

    /// Remove topics with duplicate keys from a JSON document, in place
    Dedup {
        /// Document to deduplicate
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Field(s) identifying a topic [default: from config, else title]
        #[arg(long, value_enum)]
        key: Option<DedupKey>,

        /// Path to TOML configuration file
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show topic, post and duplicate counts for a JSON document
    Stats {
        /// Document to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First listing page of the subforum
    #[arg(long)]
    start_url: Option<String>,

    /// Origin relative links are resolved against [default: origin of start URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum number of listing pages to visit
    #[arg(long)]
    max_listing_pages: Option<u32>,

    /// Maximum number of pages to visit per topic
    #[arg(long)]
    max_topic_pages: Option<u32>,

    /// Minimum delay between requests, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Number of topics crawled concurrently
    #[arg(long)]
    concurrency: Option<u32>,

    /// Extra attempts for a page after a transient failure
    #[arg(long)]
    max_retries: Option<u32>,

    /// Output document path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Replace the output document instead of appending to it
    #[arg(long)]
    overwrite: bool,

    /// Validate configuration and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl(args) => handle_crawl(args).await,
        Command::Dedup { file, key, config } => handle_dedup(&file, key, config.as_deref()),
        Command::Stats { file } => handle_stats(&file),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_scribe=info,warn"),
            1 => EnvFilter::new("forum_scribe=debug,info"),
            2 => EnvFilter::new("forum_scribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if given, otherwise the defaults
fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, args: &CrawlArgs) -> anyhow::Result<()> {
    if let Some(start_url) = &args.start_url {
        config.forum.start_url = start_url.clone();

        if args.base_url.is_none() {
            let start = Url::parse(start_url)
                .with_context(|| format!("Invalid start URL '{}'", start_url))?;
            config.forum.base_url = start.origin().ascii_serialization();
        }
    }
    if let Some(base_url) = &args.base_url {
        config.forum.base_url = base_url.clone();
    }
    if let Some(pages) = args.max_listing_pages {
        config.crawler.max_listing_pages = pages;
    }
    if let Some(pages) = args.max_topic_pages {
        config.crawler.max_topic_pages = pages;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.crawler.delay_ms = delay_ms;
    }
    if let Some(concurrency) = args.concurrency {
        config.crawler.max_concurrent_topics = concurrency;
    }
    if let Some(retries) = args.max_retries {
        config.crawler.max_retries = retries;
    }
    if let Some(output) = &args.output {
        config.output.path = output.display().to_string();
    }
    if args.overwrite {
        config.output.append = false;
    }

    validate(config).context("Invalid crawl settings")?;
    Ok(())
}

/// Handles the crawl command
async fn handle_crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let mut config = load_or_default(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;

    if args.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    tracing::info!(
        "Crawling {} (listing cap {}, topic cap {}, delay {}ms, {} worker(s))",
        config.forum.start_url,
        config.crawler.max_listing_pages,
        config.crawler.max_topic_pages,
        config.crawler.delay_ms,
        config.crawler.max_concurrent_topics
    );

    let output = &config.output;
    let mut sink = if output.append {
        JsonFileSink::append(&output.path, output.checkpoint_every)
    } else {
        JsonFileSink::create(&output.path, output.checkpoint_every)
    }
    .with_context(|| format!("Cannot open output {}", output.path))?;

    let report = match crawl(&config, &mut sink).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    println!(
        "✓ Collected {} posts from {} topics into {}",
        report.post_count(),
        report.topic_count(),
        sink.path().display()
    );
    if !report.truncated_topics.is_empty() {
        println!(
            "! {} topic(s) were truncated by fetch errors",
            report.truncated_topics.len()
        );
    }

    Ok(())
}

/// Handles the crawl --dry-run mode: shows the effective configuration
fn print_dry_run(config: &Config) {
    println!("=== Forum-Scribe Dry Run ===\n");

    println!("Forum:");
    println!("  Start URL: {}", config.forum.start_url);
    println!("  Base URL: {}", config.forum.base_url);

    println!("\nCrawler Configuration:");
    println!("  Max listing pages: {}", config.crawler.max_listing_pages);
    println!("  Max topic pages: {}", config.crawler.max_topic_pages);
    println!("  Delay between requests: {}ms", config.crawler.delay_ms);
    println!(
        "  Concurrent topics: {}",
        config.crawler.max_concurrent_topics
    );
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSelectors:");
    println!("  Topic title: {}", config.selectors.topic_title);
    println!("  Next page: {}", config.selectors.next_page);
    println!("  Post: {}", config.selectors.post);
    println!("  Author: {}", config.selectors.author);
    println!("  Date: {}", config.selectors.date);
    println!("  Content: {}", config.selectors.content);

    println!(
        "\nOutput: {} ({})",
        config.output.path,
        if config.output.append { "append" } else { "overwrite" }
    );
    println!("\n✓ Configuration is valid");
}

/// Handles the dedup command
fn handle_dedup(file: &Path, key: Option<DedupKey>, config: Option<&Path>) -> anyhow::Result<()> {
    let key = match key {
        Some(key) => key,
        None => load_or_default(config)?.output.dedup_key,
    };

    let summary = deduplicate_file(file, key)
        .with_context(|| format!("Failed to deduplicate {}", file.display()))?;

    println!(
        "✓ Removed {} duplicate topic(s) by {}; {} remain in {}",
        summary.removed(),
        key,
        summary.after,
        file.display()
    );

    Ok(())
}

/// Handles the stats command
fn handle_stats(file: &Path) -> anyhow::Result<()> {
    let documents =
        load_documents(file).with_context(|| format!("Failed to load {}", file.display()))?;

    println!("Document: {}\n", file.display());
    print_statistics(&compute_statistics(&documents));

    Ok(())
}
