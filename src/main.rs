//! Site-Archiver main entry point
//!
//! This is the command-line interface for capturing a page or site into a
//! single offline ZIP archive.

use clap::Parser;
use std::path::{Path, PathBuf};
use site_archiver::config::{load_config, validate, Config};
use site_archiver::output::{format_bytes, print_summary, suggested_archive_name};
use site_archiver::state::ProgressSnapshot;
use site_archiver::{CaptureError, CaptureEvent, CaptureMode, CaptureService};
use tracing_subscriber::EnvFilter;

/// Site-Archiver: offline copies of web pages and sites
///
/// Site-Archiver captures a page and every resource it references, optionally
/// following same-origin links, and packages the result into a ZIP archive
/// that opens without a network connection.
#[derive(Parser, Debug)]
#[command(name = "site-archiver")]
#[command(version)]
#[command(about = "Capture web pages and sites into offline archives", long_about = None)]
struct Cli {
    /// URL of the page to start from
    #[arg(value_name = "SEED")]
    seed: String,

    /// What to capture: full, page-only, or assets-only
    #[arg(short, long, default_value = "full")]
    mode: CaptureMode,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the archive (defaults to a name derived from the seed)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum link depth followed from the seed
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages captured
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum number of concurrent asset downloads
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Skip assets larger than this many MiB
    #[arg(long)]
    max_file_size_mb: Option<u64>,

    /// Drop resources that are not on the seed's origin
    #[arg(long)]
    ignore_external: bool,

    /// Keep tracking and analytics resources
    #[arg(long)]
    keep_analytics: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be captured without capturing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };
    let config = apply_overrides(config, &cli);
    validate(&config.capture)?;

    if cli.dry_run {
        handle_dry_run(&cli, &config);
        return Ok(());
    }

    handle_capture(&cli, config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_archiver=info,warn"),
            1 => EnvFilter::new("site_archiver=debug,info"),
            2 => EnvFilter::new("site_archiver=trace,debug"),
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

/// Applies command-line flags on top of file configuration
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    let capture = &mut config.capture;
    if let Some(depth) = cli.max_depth {
        capture.max_depth = depth;
    }
    if let Some(pages) = cli.max_pages {
        capture.max_pages = pages;
    }
    if let Some(concurrency) = cli.max_concurrency {
        capture.max_concurrency = concurrency;
    }
    if let Some(mb) = cli.max_file_size_mb {
        capture.max_file_size_bytes = mb.saturating_mul(1024 * 1024);
    }
    if cli.ignore_external {
        capture.ignore_external = true;
    }
    if cli.keep_analytics {
        capture.ignore_analytics = false;
    }
    config
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(cli: &Cli, config: &Config) {
    let capture = &config.capture;
    println!("=== Site-Archiver Dry Run ===\n");

    println!("Seed: {}", cli.seed);
    println!("Mode: {}", cli.mode);

    println!("\nCapture Settings:");
    println!("  Max depth: {}", capture.max_depth);
    println!("  Max pages: {}", capture.max_pages);
    println!("  Max concurrency: {}", capture.max_concurrency);
    println!(
        "  Max file size: {}",
        format_bytes(capture.max_file_size_bytes)
    );
    println!("  Ignore external: {}", capture.ignore_external);
    println!("  Ignore analytics: {}", capture.ignore_analytics);
    println!("  Request timeout: {}s", capture.request_timeout_secs);
    println!("  User agent: {}", capture.user_agent);

    if !capture.extra_ignore_patterns.is_empty() {
        println!(
            "\nExtra Ignore Patterns ({}):",
            capture.extra_ignore_patterns.len()
        );
        for pattern in &capture.extra_ignore_patterns {
            println!("  - {}", pattern);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Resolves where the archive is written
fn archive_path(cli: &Cli, config: &Config, seed: &url::Url) -> PathBuf {
    match &cli.output {
        Some(path) => path.clone(),
        None => {
            let today = chrono::Local::now().date_naive();
            Path::new(&config.output.archive_dir).join(suggested_archive_name(seed, cli.mode, today))
        }
    }
}

fn log_progress(progress: &ProgressSnapshot) {
    tracing::debug!(
        "Progress: {}/{} assets, {} failed, {} skipped, {} pages",
        progress.downloaded,
        progress.total,
        progress.failed,
        progress.skipped,
        progress.pages_crawled
    );
}

/// Handles the main capture operation
async fn handle_capture(cli: &Cli, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let service = CaptureService::new();
    let mut handle = service.start_capture(&cli.seed, cli.mode, config.capture.clone())?;
    let task_id = handle.id;

    // Ctrl-C cancels cooperatively; in-flight fetches are allowed to finish
    let interrupt = {
        let service = service.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling capture");
                service.cancel(task_id);
            }
        })
    };

    while let Some(event) = handle.events.recv().await {
        match event {
            CaptureEvent::Progress(progress) => log_progress(&progress),
            CaptureEvent::PageCaptured { url, local_path } => {
                tracing::info!("Captured page {} as {}", url, local_path);
            }
            CaptureEvent::Completed(_) | CaptureEvent::Cancelled(_) | CaptureEvent::Failed { .. } => {}
        }
    }

    let result = handle.wait().await;
    interrupt.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(CaptureError::Cancelled) => {
            tracing::warn!("Capture cancelled; no archive written");
            return Err(CaptureError::Cancelled.into());
        }
        Err(e) => {
            tracing::error!("Capture failed: {}", e);
            return Err(e.into());
        }
    };

    let seed = site_archiver::url::parse_seed_url(&cli.seed)?;
    let path = archive_path(cli, &config, &seed);
    std::fs::write(&path, &outcome.archive)?;
    tracing::info!("Archive written to {}", path.display());

    if !cli.quiet {
        print_summary(&outcome.progress, Some(outcome.archive.len()));
        println!("\n✓ Archive written to: {}", path.display());
    }

    Ok(())
}
