//! tilegrab CLI - Command-line interface
//!
//! Thin front-end over the `tilegrab` library: parses flags, merges them with
//! `~/.tilegrab/config.ini`, and runs the download and mosaic pipeline.

mod args;
mod error;
mod progress;
mod settings;

use std::sync::Arc;

use clap::Parser;
use tilegrab::app::{run_with_client, AppConfig, AppError, RunReport};
use tilegrab::download::{DownloadError, HttpClient, ReqwestClient};
use tilegrab::logging::{default_log_dir, default_log_file, init_logging_with};
use tracing::info;
use tracing::level_filters::LevelFilter;

use args::Args;
use error::CliError;
use progress::DownloadProgress;

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        e.exit();
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let console_level = if args.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let _logging = init_logging_with(&default_log_dir(), default_log_file(), console_level)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let file = settings::load_config_file(&args)?;
    let config = settings::build_app_config(&args, &file)?;

    info!(
        zoom = config.zoom,
        output = %config.output_dir().display(),
        "Starting tilegrab"
    );

    let client = ReqwestClient::from_config(&config.download)
        .map_err(|e| CliError::Run(AppError::Download(DownloadError::from(e))))?;
    let progress = DownloadProgress::new(!args.quiet && !args.no_progress);
    let report = execute(&config, Arc::new(client), &progress)?;

    print_report(&config, &report);
    Ok(())
}

/// Runs the pipeline, feeding `progress` from the engine's callback.
fn execute(
    config: &AppConfig,
    client: Arc<dyn HttpClient>,
    progress: &DownloadProgress,
) -> Result<RunReport, CliError> {
    let on_progress = |done: usize, total: usize| progress.update(done, total);
    let result = run_with_client(config, client, Some(&on_progress));
    progress.finish();
    Ok(result?)
}

fn print_report(config: &AppConfig, report: &RunReport) {
    let s = &report.summary;
    println!(
        "Tiles: {} total, {} downloaded, {} reused, {} skipped, {} empty, {} failed",
        s.total, s.succeeded, s.reused, s.skipped, s.empty, s.failed
    );
    if let Some((w, h)) = report.mosaic_size {
        println!("Mosaic: {}x{} px", w, h);
    }
    for path in &report.outputs {
        println!("  {}", path.display());
    }
    if config.download_only {
        println!("Tiles saved in {}", report.tile_dir.display());
    }
}
