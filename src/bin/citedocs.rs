//! The `citedocs` CLI: a thin wrapper running one crawl and printing a
//! summary. Exits 0 when at least one page was crawled successfully, 1
//! otherwise.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use docscrawl::config::{CrawlTarget, CrawlerConfig, OrganizationConfig};
use docscrawl::crawl::CrawlEngine;

/// Crawl a documentation site and print a summary of what was found.
#[derive(Parser, Debug)]
#[command(name = "citedocs", version, about)]
struct Cli {
    /// The seed: a URL, or a package name to resolve via the project
    /// identifier (network access required for the latter).
    seed: String,

    /// Maximum link-following depth from the seed.
    #[arg(long, default_value_t = 2)]
    depth: u32,

    /// Maximum number of pages to crawl.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Follow links to other registered domains.
    #[arg(long)]
    follow_external: bool,

    /// Allowed response content types (repeatable).
    #[arg(long = "content-type", default_values_t = vec!["text/html".to_string()])]
    content_types: Vec<String>,

    /// Maximum concurrent in-flight requests.
    #[arg(long, default_value_t = 8)]
    concurrent_requests: usize,

    /// Requests per second, per domain.
    #[arg(long, default_value_t = 2.0)]
    requests_per_second: f64,

    /// Quiet: suppress the per-page progress log.
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(target) = CrawlTarget::builder(&cli.seed)
        .depth(cli.depth)
        .follow_external(cli.follow_external)
        .content_types(cli.content_types.clone())
        .max_pages(cli.max_pages.unwrap_or(usize::MAX))
        .build()
    else {
        eprintln!("invalid crawl target configuration");
        return ExitCode::FAILURE;
    };

    let config = CrawlerConfig::builder()
        .concurrent_requests(cli.concurrent_requests)
        .requests_per_second(cli.requests_per_second)
        .build();

    let engine = match CrawlEngine::new(config, OrganizationConfig::default()) {
        Ok(engine) => Arc::new(engine),
        Err(error) => {
            eprintln!("failed to initialize crawl engine: {error}");
            return ExitCode::FAILURE;
        }
    };

    if !cli.quiet {
        eprintln!("crawling {} (depth {})...", cli.seed, cli.depth);
    }

    let result = engine.crawl(target).await;

    println!("pages attempted:  {}", result.stats.pages_attempted);
    println!("pages succeeded:  {}", result.stats.pages_succeeded);
    println!("pages failed:     {}", result.stats.pages_failed);
    println!("documents found:  {}", result.documents.len());
    println!("quality issues:   {}", result.issues.len());
    if let Some(avg) = result.stats.average_per_page() {
        println!("avg time/page:    {}ms", avg.num_milliseconds());
    }
    for failed in &result.failed_urls {
        println!("  failed: {} ({})", failed.url, failed.error);
    }

    if result.stats.pages_succeeded > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
