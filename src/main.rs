//! # Image-fetcher CLI
//!
//! Command-line interface for the image-fetcher library.
//! Fetches images by URL into a local folder, skipping duplicates and unsafe content.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use image_fetcher::{
    BatchReport, FetchConfig, FetchOptions, ImageFetcher, Outcome, DEFAULT_TARGET_DIR,
};
use log::error;

mod cli;

use cli::prompt::{self, MenuChoice};
use cli::report;

/// Command-line interface for image-fetcher
#[derive(Parser)]
#[command(name = "image-fetcher")]
#[command(about = "Fetch images from the web into a local folder, skipping duplicates and unsafe content")]
#[command(long_about = "Fetches images into a local folder (default ./Fetched_Images):
  image-fetcher https://example.com/cat.png          # Fetch one image
  image-fetcher URL1 URL2 URL3                        # Fetch a batch, in order
  image-fetcher --input urls.txt                      # One URL per line, # comments allowed
  image-fetcher                                       # Interactive menu

Safety:
  Only JPEG, PNG, GIF, WebP and BMP responses are stored, up to --max-size MiB.
  Content already present in the folder is never stored twice.
  Existing files are never overwritten; name clashes get a _1, _2, ... suffix.")]
#[command(version = env!("IMAGE_FETCHER_VERSION"))]
struct Cli {
    /// Image URLs to fetch. Without URLs or --input an interactive menu starts
    urls: Vec<String>,

    /// Folder images are stored in
    #[arg(short, long, default_value = DEFAULT_TARGET_DIR)]
    dir: PathBuf,

    /// Read URLs from a file, one per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout: u64,

    /// Maximum image size in MiB
    #[arg(long, default_value_t = 10)]
    max_size: u64,

    /// Print the batch report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,

    /// Show what would be fetched without fetching
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout),
            max_bytes: self.max_size.saturating_mul(1024 * 1024),
            ..FetchConfig::with_target_dir(&self.dir)
        }
    }

    fn show_progress(&self) -> bool {
        !self.no_progress && !self.json
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "image_fetcher=debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🖼️  Image-fetcher v{} starting...", env!("IMAGE_FETCHER_VERSION"));
    }

    if cli.timeout == 0 || cli.max_size == 0 {
        anyhow::bail!("--timeout and --max-size must be greater than zero");
    }

    let mut urls = cli.urls.clone();
    if let Some(input) = &cli.input {
        urls.extend(read_url_file(input)?);
    }

    if cli.dry_run {
        let dir = cli.dir.display();
        for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            eprintln!("🔍 [DRY RUN] Would fetch: {url} into {dir}");
        }
        return Ok(());
    }

    let mut fetcher = ImageFetcher::new(cli.config())
        .await
        .with_context(|| format!("cannot use target folder {}", cli.dir.display()))?;

    if urls.is_empty() && cli.input.is_none() {
        return interactive(&cli, &mut fetcher).await;
    }

    let report = run_batch(&cli, &mut fetcher, &urls).await;
    if cli.json {
        report::print_json(&report)?;
    } else {
        report::print_summary(&report);
    }

    Ok(())
}

/// URLs from a file: one per line, blank lines and `#` comments skipped
fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read URL list {}", path.display()))?;
    Ok(parse_url_lines(&content))
}

fn parse_url_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Fetch URLs in order, printing each outcome as it lands
async fn run_batch(cli: &Cli, fetcher: &mut ImageFetcher, urls: &[String]) -> BatchReport {
    let urls: Vec<&str> = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();
    let total = urls.len();
    let mut batch = BatchReport::default();

    for (i, url) in urls.into_iter().enumerate() {
        if !cli.json {
            eprintln!();
            eprintln!("--- Processing image {}/{total} ---", i + 1);
        }
        let outcome = fetch_with_feedback(cli, fetcher, url).await;
        batch.push(url, outcome);
    }

    batch
}

async fn fetch_with_feedback(cli: &Cli, fetcher: &mut ImageFetcher, url: &str) -> Outcome {
    if !cli.json {
        eprintln!("🌐 Connecting to: {url}");
    }

    let outcome = if cli.show_progress() {
        let progress = cli::ProgressManager::new();
        let options = FetchOptions {
            progress: Some(progress.callback()),
        };
        let outcome = fetcher.process(url, &options).await;
        progress.finish();
        outcome
    } else {
        fetcher.process(url, &FetchOptions::default()).await
    };

    if !cli.json {
        report::print_outcome(&outcome);
    }
    outcome
}

/// Menu loop: single image, several images, or exit
async fn interactive(cli: &Cli, fetcher: &mut ImageFetcher) -> anyhow::Result<()> {
    eprintln!("{}", "=".repeat(60));
    eprintln!("Image-fetcher: collect images from the web into {}", fetcher.store().dir().display());
    eprintln!("{}", "=".repeat(60));

    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    loop {
        prompt::print_menu();
        let Some(choice) = prompt::ask(&mut input, "\nEnter your choice (1-3): ")? else {
            break;
        };

        match prompt::parse_choice(&choice) {
            MenuChoice::Single => {
                match prompt::ask(&mut input, "\nPlease enter the image URL: ")? {
                    Some(url) if !url.is_empty() => {
                        fetch_with_feedback(cli, fetcher, &url).await;
                    }
                    _ => eprintln!("❌ No URL provided."),
                }
            }
            MenuChoice::Multiple => {
                eprintln!("\nEnter URLs, one per line. Press Enter on an empty line when done:");
                let urls = prompt::read_url_list(&mut input)?;
                if urls.is_empty() {
                    eprintln!("❌ No URLs provided.");
                    continue;
                }
                let report = run_batch(cli, fetcher, &urls).await;
                report::print_summary(&report);
            }
            MenuChoice::Exit => break,
            MenuChoice::Invalid => eprintln!("❌ Invalid choice. Please enter 1, 2, or 3."),
        }
    }

    eprintln!("\nThank you for using image-fetcher.");
    Ok(())
}
