//! # medscrape CLI Application
//!
//! This module implements the command-line interface for medscrape,
//! providing access to the crawler and the section extractor through a set
//! of subcommands.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `crawl`: Category crawl over a window of articles
//!   - `article`: Extraction for a single named article
//!   - `headings`: Heading inventory of an article, for tuning the catalog
//!   - `render`: Print a saved record file as markdown
//!
//! ## Features
//!
//! - TOML configuration with command-line overrides
//! - Progress tracking for long-running crawls
//! - Ctrl-C stops the crawl and still saves what was gathered
//! - Optional log file and OpenTelemetry export

mod telemetry;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use medscrape::config::AppConfig;
use medscrape::crawler::{
    ArticleOutcome, CancelToken, CrawlEvent, Crawler, HttpFetcher, PacingRange,
};
use medscrape::document::ArticleDocument;
use medscrape::storage::{Storage, WriteMode};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Extract canonical sections from medical wiki articles", long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Export traces and metrics over OTLP
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a category and extract sections from each article
    Crawl(CrawlArgs),

    /// Extract sections from a single article
    Article(ArticleArgs),

    /// List every heading of an article
    Headings(HeadingsArgs),

    /// Print a saved record file as markdown
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Category listing URL to start from
    #[arg(long)]
    category: Option<String>,

    /// Index of the first discovered article to scrape
    #[arg(long)]
    offset: Option<usize>,

    /// Number of articles to scrape
    #[arg(short, long)]
    limit: Option<usize>,

    /// Minimum populated sections for a record to be kept
    #[arg(short, long)]
    min_sections: Option<usize>,

    /// Concurrent article fetches
    #[arg(short, long)]
    workers: Option<usize>,

    /// Disable pacing between requests
    #[arg(long)]
    no_delay: bool,

    /// Output file
    #[arg(short, long, default_value = "rare_diseases.json")]
    output: PathBuf,

    /// Append to the output file instead of replacing it
    #[arg(short, long)]
    append: bool,
}

#[derive(Args, Debug)]
struct ArticleArgs {
    /// Article title, e.g. "Fabry disease"
    #[arg(required = true)]
    title: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum populated sections for a record to be kept
    #[arg(short, long)]
    min_sections: Option<usize>,

    /// Save the record to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append to the output file instead of replacing it
    #[arg(short, long)]
    append: bool,

    /// Print the record as JSON instead of markdown
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct HeadingsArgs {
    /// Article title
    #[arg(required = true)]
    title: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Record file written by `crawl` or `article`
    #[arg(required = true)]
    file: PathBuf,

    /// Print only the section bodies separated by blank lines
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing(cli.otel, cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Crawl(args)) => crawl_command(args).await?,
        Some(Commands::Article(args)) => article_command(args).await?,
        Some(Commands::Headings(args)) => headings_command(args).await?,
        Some(Commands::Render(args)) => render_command(args).await?,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["medscrape", "--help"]);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn write_mode(append: bool) -> WriteMode {
    if append {
        WriteMode::Append
    } else {
        WriteMode::Overwrite
    }
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(category) = args.category {
        config.crawler.category_url = category;
    }
    if let Some(offset) = args.offset {
        config.crawler.offset = offset;
    }
    if let Some(limit) = args.limit {
        config.crawler.limit = limit;
    }
    if let Some(workers) = args.workers {
        config.crawler.workers = workers;
    }
    if let Some(min_sections) = args.min_sections {
        config.extraction.min_sections = min_sections;
    }
    if args.no_delay {
        config.crawler.category_delay = PacingRange::none();
        config.crawler.article_delay = PacingRange::none();
    }
    config.validate()?;

    println!(
        "Crawling {} (articles {}..{})...",
        config.crawler.category_url,
        config.crawler.offset,
        config.crawler.window_end()
    );

    let cancel = CancelToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing up with the records gathered so far");
                cancel.cancel();
            }
        }
    });

    let (event_sender, mut event_receiver) = mpsc::channel(100);

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_message("Collecting article identifiers...");

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(event) = event_receiver.recv().await {
                match event {
                    CrawlEvent::CategoryPage { page, collected } => {
                        progress_bar.set_message(format!(
                            "Category page {page}: {collected} articles found"
                        ));
                    }
                    CrawlEvent::ListingComplete { window, .. } => {
                        progress_bar.set_length(window as u64);
                        progress_bar.set_position(0);
                        if let Ok(style) = ProgressStyle::default_bar()
                            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
                        {
                            progress_bar.set_style(style.progress_chars("##-"));
                        }
                    }
                    CrawlEvent::Article { title, outcome, .. } => {
                        progress_bar.inc(1);
                        let status = match outcome {
                            ArticleOutcome::Kept(n) => format!("{n} sections"),
                            ArticleOutcome::Dropped => "dropped".to_string(),
                            ArticleOutcome::FetchFailed(_) => "fetch failed".to_string(),
                            ArticleOutcome::Cancelled => "cancelled".to_string(),
                        };
                        progress_bar.set_message(format!("{title}: {status}"));
                    }
                }
            }
            progress_bar.finish_with_message("Crawl completed");
        }
    });

    let fetcher = HttpFetcher::new(&config.crawler)?;
    let crawler = Crawler::new(fetcher, config.crawler.clone(), config.aggregator())
        .with_events(event_sender)
        .with_cancel_token(cancel);

    let report = crawler.run().await?;

    // Dropping the crawler closes the event channel and ends the progress task
    drop(crawler);
    progress_handle.await?;

    let storage = Storage::new(&args.output);
    let total = storage
        .save(&report.records, write_mode(args.append))
        .await?;

    info!(
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "Run summary: {}",
        serde_json::to_string(&report)?
    );
    println!(
        "Kept {} of {} articles ({} dropped, {} failed){}",
        report.records.len(),
        report.attempted,
        report.dropped,
        report.fetch_failures,
        if report.cancelled { ", interrupted" } else { "" }
    );
    println!("Saved {} records to {}", total, storage.path().display());

    Ok(())
}

#[instrument]
async fn article_command(args: ArticleArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(min_sections) = args.min_sections {
        config.extraction.min_sections = min_sections;
    }
    config.validate()?;

    let fetcher = HttpFetcher::new(&config.crawler)?;
    let crawler = Crawler::new(fetcher, config.crawler.clone(), config.aggregator());

    let Some(record) = crawler.scrape_single(&args.title).await? else {
        println!(
            "'{}' has fewer than {} recognised sections, nothing saved",
            args.title,
            config.extraction.min_sections
        );
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", record.to_markdown());
    }

    if let Some(output) = args.output {
        let total = Storage::new(&output)
            .save(std::slice::from_ref(&record), write_mode(args.append))
            .await?;
        println!("Saved {} records to {}", total, output.display());
    }

    Ok(())
}

#[instrument]
async fn headings_command(args: HeadingsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let fetcher = HttpFetcher::new(&config.crawler)?;
    let crawler = Crawler::new(fetcher, config.crawler.clone(), config.aggregator());

    let html = crawler.fetch_article(&args.title).await?;
    let document = ArticleDocument::parse(&html);
    let headings = document.headings();

    println!("{} headings in '{}'", headings.len(), args.title);
    for heading in &headings {
        let level = heading
            .level()
            .map(|l| format!("h{l}"))
            .unwrap_or_else(|| "h?".to_string());
        let indent = "  ".repeat(usize::from(heading.effective_level().saturating_sub(1)));
        let (identifier, label, text) = heading.labels();
        let wrapped = if heading.is_wrapped() { " [wrapped]" } else { "" };
        println!(
            "{indent}{level}{wrapped} id={} label={} text={:?}",
            identifier.unwrap_or("-"),
            label.unwrap_or("-"),
            text
        );
    }

    Ok(())
}

#[instrument]
async fn render_command(args: RenderArgs) -> anyhow::Result<()> {
    let records = Storage::new(&args.file).load().await?;
    if records.is_empty() {
        println!("No records in {}", args.file.display());
        return Ok(());
    }

    for record in &records {
        if args.plain {
            println!("{}\n", record.reference_text());
        } else {
            println!("{}", record.to_markdown());
        }
    }

    Ok(())
}
