//! Site-Sweep main entry point
//!
//! This is the command-line interface for the Site-Sweep site auditor.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use site_sweep::config::{load_config_with_hash, validate, Config, FrontierStrategy};
use site_sweep::crawler::{Coordinator, Fetcher};
use site_sweep::handlers::{BrokenLinkHandler, ImageHandler, ImageMode, SeoHandler, SeoRecord};
use site_sweep::output::{
    format_positions, print_domain_summary, print_statistics, report_timestamp,
    summarize_by_domain, write_broken_links, write_microdata_samples, write_seo_report,
    write_serp_results,
};
use site_sweep::serp::SerpChecker;
use tracing_subscriber::EnvFilter;

/// Site-Sweep: a polite, bounded site crawler
///
/// Site-Sweep visits the pages of a site reachable from a seed URL, once
/// each and at a fixed pace, and audits them: SEO metadata, broken links,
/// image harvesting. It can also check search engine positions.
#[derive(Parser, Debug)]
#[command(name = "site-sweep")]
#[command(version)]
#[command(about = "A polite, bounded site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze SEO metadata of one or more sites
    Seo {
        /// Site URLs, separated by spaces or commas
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Find pages that answer 404 or do not answer at all
    BrokenLinks {
        /// Site URL
        url: String,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Download the images of a site
    Images {
        /// Page or site URL
        url: String,

        /// Folder images are saved to
        #[arg(long, default_value = "images")]
        folder: PathBuf,

        /// Download full-size variants instead of the served thumbnails
        #[arg(long)]
        largest: bool,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Check search engine positions of a site for some keywords
    Serp {
        /// Site to look for in result links (e.g. example.com)
        site: String,

        /// Keywords to check
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Result pages checked per engine
        #[arg(long, default_value_t = site_sweep::serp::DEFAULT_PAGES)]
        pages: usize,
    },
}

/// Overrides for the crawl budget
#[derive(Args, Debug, Default)]
struct CrawlArgs {
    /// Maximum number of pages to visit
    #[arg(long)]
    max_pages: Option<usize>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Visit order: breadth-first or depth-first
    #[arg(long)]
    strategy: Option<FrontierStrategy>,
}

/// Budget a subcommand uses when neither a flag nor a config file sets one
#[derive(Debug, Clone, Copy, Default)]
struct CommandDefaults {
    max_pages: Option<usize>,
    delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let base_config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Some(config)
        }
        None => None,
    };

    match cli.command {
        Command::Seo { urls, crawl } => {
            let config = build_config(base_config, &crawl, CommandDefaults::default())?;
            handle_seo(config, split_seeds(&urls)).await
        }
        Command::BrokenLinks { url, crawl } => {
            let defaults = CommandDefaults {
                max_pages: Some(2000),
                delay_ms: Some(500),
            };
            let config = build_config(base_config, &crawl, defaults)?;
            handle_broken_links(config, &url).await
        }
        Command::Images {
            url,
            folder,
            largest,
            crawl,
        } => {
            let defaults = CommandDefaults {
                max_pages: Some(1),
                delay_ms: None,
            };
            let config = build_config(base_config, &crawl, defaults)?;
            let mode = if largest {
                ImageMode::Largest
            } else {
                ImageMode::Basic
            };
            handle_images(config, &url, folder, mode).await
        }
        Command::Serp {
            site,
            keywords,
            pages,
        } => handle_serp(base_config.unwrap_or_default(), site, keywords, pages).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_sweep=info,warn"),
            1 => EnvFilter::new("site_sweep=debug,info"),
            2 => EnvFilter::new("site_sweep=trace,debug"),
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

/// Layers command defaults and flags over the configuration, then re-validates
///
/// Precedence: command-line flag, then config file, then command default.
fn build_config(
    base: Option<Config>,
    args: &CrawlArgs,
    defaults: CommandDefaults,
) -> anyhow::Result<Config> {
    let mut config = match base {
        Some(config) => config,
        None => {
            let mut config = Config::default();
            if let Some(max_pages) = defaults.max_pages {
                config.crawler.max_pages = max_pages;
            }
            if let Some(delay_ms) = defaults.delay_ms {
                config.crawler.delay_ms = delay_ms;
            }
            config
        }
    };

    if let Some(max_pages) = args.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.crawler.delay_ms = delay_ms;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.crawler.timeout_secs = timeout_secs;
    }
    if let Some(strategy) = args.strategy {
        config.crawler.strategy = strategy;
    }

    validate(&config).context("Invalid crawl settings")?;
    Ok(config)
}

/// Splits seed arguments on commas, dropping empty entries
fn split_seeds(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|seed| !seed.is_empty())
        .map(str::to_string)
        .collect()
}

/// Creates the report directory if needed
fn output_directory(config: &Config) -> anyhow::Result<&Path> {
    let directory = Path::new(&config.output.directory);
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create output directory {}", directory.display()))?;
    Ok(directory)
}

/// Handles the `seo` command: crawls every site and writes the reports
async fn handle_seo(config: Config, seeds: Vec<String>) -> anyhow::Result<()> {
    tracing::info!("Analyzing {} site(s)", seeds.len());

    let coordinator = Coordinator::new(config.clone(), SeoHandler::new())?;
    let reports = coordinator.crawl_batch(seeds.as_slice()).await;

    let mut records: Vec<SeoRecord> = Vec::new();
    for report in reports {
        println!("\n--- {} ---", report.seed);
        print_statistics(&report.stats);
        records.extend(report.into_records());
    }

    if records.is_empty() {
        println!("\nNo pages could be analyzed");
        return Ok(());
    }

    let directory = output_directory(&config)?;
    let timestamp = report_timestamp();

    let report_path = write_seo_report(&records, directory, &timestamp)?;
    println!("\nReport saved to: {}", report_path.display());

    println!();
    print_domain_summary(&summarize_by_domain(&records));

    let samples_path = write_microdata_samples(&records, directory, &timestamp)?;
    println!("\nMicrodata samples saved to: {}", samples_path.display());

    Ok(())
}

/// Handles the `broken-links` command
async fn handle_broken_links(config: Config, url: &str) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config.clone(), BrokenLinkHandler::new())?;
    let report = coordinator
        .crawl(url)
        .await
        .with_context(|| format!("Cannot crawl '{}'", url))?;

    print_statistics(&report.stats);

    let origin = report.seed.origin();
    let checks = report.into_records();

    let directory = output_directory(&config)?;
    let (path, broken) = write_broken_links(&checks, directory, &origin)?;

    println!("\nReport saved to: {}", path.display());
    println!("Broken links found: {}", broken);

    Ok(())
}

/// Handles the `images` command
async fn handle_images(
    config: Config,
    url: &str,
    folder: PathBuf,
    mode: ImageMode,
) -> anyhow::Result<()> {
    println!("Downloading images from: {}", url);
    println!("Saving to: {}\n", folder.display());

    let fetcher = Fetcher::new(&config.client, &config.crawler.budget())?;
    let handler = ImageHandler::new(fetcher.clone(), folder, mode);
    let coordinator = Coordinator::with_fetcher(config, fetcher, handler);

    let report = coordinator
        .crawl(url)
        .await
        .with_context(|| format!("Cannot crawl '{}'", url))?;

    let harvests: Vec<_> = report.records().collect();
    let saved: usize = harvests.iter().map(|h| h.saved.len()).sum();
    let present: usize = harvests.iter().map(|h| h.already_present).sum();
    let failed: usize = harvests.iter().map(|h| h.failed).sum();

    print_statistics(&report.stats);
    println!(
        "\nImages: {} saved, {} already present, {} failed",
        saved, present, failed
    );

    Ok(())
}

/// Handles the `serp` command
async fn handle_serp(
    config: Config,
    site: String,
    keywords: Vec<String>,
    pages: usize,
) -> anyhow::Result<()> {
    let fetcher = Fetcher::new(&config.client, &config.crawler.budget())?;
    let checker = SerpChecker::new(fetcher, site).with_pages(pages);

    let results = checker.run(keywords.as_slice()).await;

    let directory = output_directory(&config)?;
    let path = write_serp_results(&results, directory)?;
    println!("Results saved to: {}", path.display());

    for result in &results {
        println!("\nKeyword: {}", result.keyword);
        for (engine, positions) in [("Google", &result.google), ("Yandex", &result.yandex)] {
            if positions.is_empty() {
                println!("  {}: not found", engine);
            } else {
                println!("  {}: {}", engine, format_positions(positions));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_seeds() {
        let args = vec![
            "site1.test, site2.test".to_string(),
            "site3.test".to_string(),
            ",".to_string(),
        ];
        assert_eq!(
            split_seeds(&args),
            vec!["site1.test", "site2.test", "site3.test"]
        );
    }

    #[test]
    fn test_command_defaults_without_config_file() {
        let defaults = CommandDefaults {
            max_pages: Some(2000),
            delay_ms: Some(500),
        };
        let config = build_config(None, &CrawlArgs::default(), defaults).unwrap();
        assert_eq!(config.crawler.max_pages, 2000);
        assert_eq!(config.crawler.delay_ms, 500);
    }

    #[test]
    fn test_config_file_beats_command_defaults() {
        let mut file_config = Config::default();
        file_config.crawler.max_pages = 25;

        let defaults = CommandDefaults {
            max_pages: Some(2000),
            delay_ms: None,
        };
        let config = build_config(Some(file_config), &CrawlArgs::default(), defaults).unwrap();
        assert_eq!(config.crawler.max_pages, 25);
    }

    #[test]
    fn test_flags_beat_everything_and_are_validated() {
        let args = CrawlArgs {
            max_pages: Some(7),
            strategy: Some(FrontierStrategy::DepthFirst),
            ..CrawlArgs::default()
        };
        let config = build_config(None, &args, CommandDefaults::default()).unwrap();
        assert_eq!(config.crawler.max_pages, 7);
        assert_eq!(config.crawler.strategy, FrontierStrategy::DepthFirst);

        let bad = CrawlArgs {
            max_pages: Some(0),
            ..CrawlArgs::default()
        };
        assert!(build_config(None, &bad, CommandDefaults::default()).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["site-sweep", "-v", "broken-links", "site.test", "--max-pages", "5"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::BrokenLinks { url, crawl } => {
                assert_eq!(url, "site.test");
                assert_eq!(crawl.max_pages, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from(["site-sweep", "images", "site.test", "--largest"]);
        match cli.command {
            Command::Images { folder, largest, .. } => {
                assert_eq!(folder, PathBuf::from("images"));
                assert!(largest);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
