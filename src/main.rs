mod browser;
mod config;
mod crawler;
mod error;
mod extract;
mod logging;
mod models;
mod retry;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

use browser::ChromeSession;
use config::CrawlConfig;
use crawler::CrawlRun;

#[derive(Parser)]
#[command(name = "mchire-scrape")]
#[command(about = "Crawl McHire job listings and save them as JSON")]
struct Cli {
    /// Output JSON file
    #[arg(short, long, default_value = "mcdjobs.json")]
    output: PathBuf,

    /// Directory for the dated log file
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Show the browser window instead of running headless
    #[arg(long)]
    show_browser: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init(&cli.log_dir)?;
    info!("Logging to {}", log_path.display());

    if let Err(e) = run(&cli) {
        error!("Error during scraping execution: {:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = CrawlConfig::default();
    let attempts = config.attempts;

    let session = ChromeSession::launch_with_retry(!cli.show_browser, attempts)
        .context("Error setting up Chrome")?;

    let mut crawl = CrawlRun::new(session, config);
    crawl.run();
    let results = crawl.into_results();
    if results.is_empty() {
        warn!("No job listings were collected");
    }

    store::save_results(&results, &cli.output, attempts)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!("{}", results.len());
    Ok(())
}
