use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use westie_crawler::config::Config;
use westie_crawler::crawler::{CrawlOutcome, Crawler};
use westie_crawler::dates::parse_date_range;
use westie_crawler::storage::FileSink;
use westie_crawler::{logging, metrics};

#[derive(Parser)]
#[command(name = "westie_crawler")]
#[command(about = "Westie.app event listing crawler")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, crawl the events listing and export events and banners
    Crawl {
        /// Configuration file (defaults to ./config.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Crawl without writing events.json or images
        #[arg(long)]
        no_export: bool,
    },
    /// Parse tile date captions, e.g. "12-14 Janvier 2024"
    ParseDates {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Load and validate the configuration, then print it
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

async fn crawl(config_path: Option<PathBuf>, no_export: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path.as_deref()).context("invalid configuration")?;

    if let Some(port) = config.metrics.port {
        metrics::init_metrics(port);
    }

    let mut crawler = Crawler::new(config.clone());
    if !no_export {
        let sink = FileSink::new(&config.output.dir, config.output.images_dir());
        crawler = crawler.with_sink(Arc::new(sink));
    }

    println!("🚀 Crawling {} with {:?}...", config.site.url, config.browser.profile);
    match crawler.run().await {
        Ok(report) => {
            info!("{}", report);
            match report.outcome {
                CrawlOutcome::Completed => println!(
                    "✅ {} events and {} images extracted in {} passes",
                    report.records, report.images, report.passes
                ),
                CrawlOutcome::NotImplemented(section) => {
                    println!("⚠️  Landed on {}, which is not supported yet", section)
                }
            }
            Ok(())
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            println!("❌ Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn parse_dates(texts: &[String]) {
    for text in texts {
        match parse_date_range(text) {
            Ok(range) => {
                let show = |d: Option<chrono::NaiveDate>| {
                    d.map(|d| d.to_string()).unwrap_or_else(|| "invalid".to_string())
                };
                println!(
                    "{:?}: '{}' -> {} .. {}",
                    range.pattern,
                    text,
                    show(range.start),
                    show(range.end)
                );
            }
            Err(e) => println!("❌ {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl { config, no_export } => crawl(config, no_export).await?,
        Commands::ParseDates { text } => parse_dates(&text),
        Commands::CheckConfig { config } => {
            let config = Config::load(config.as_deref()).context("invalid configuration")?;
            println!("✅ Configuration is valid");
            println!("{:#?}", config);
        }
    }
    Ok(())
}
