//! CLI entry point for the fontgrab tool.

use anyhow::{Result, bail};
use clap::Parser;
use fontgrab_core::{AssetOutcome, FontDownloader, WriteOutcome};
use tracing::{debug, info};

mod app_config;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > default (info)
    let default_level = if args.quiet { "warn" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let base = app_config::load_base_config(args.config.as_deref())?;
    let config = args.apply(base);

    if args.print_options {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let Some(input) = args.font_input() else {
        bail!("No input given. Pass a stylesheet URL with -i or families with --family");
    };

    let verbose = config.verbose;
    let downloader = FontDownloader::new(config)?;
    let report = downloader.download(&input).await?;

    if verbose {
        let inlined = report
            .fonts
            .iter()
            .filter(|f| matches!(f.outcome, AssetOutcome::Inlined { .. }))
            .count();
        info!(
            fonts = report.fonts.len(),
            references = report.references(),
            written = report.files_written(),
            inlined,
            css = %report.css_path.display(),
            css_written = report.css_outcome == WriteOutcome::Written,
            elapsed_ms = report.elapsed.as_millis(),
            "Download complete"
        );
    }

    Ok(())
}
