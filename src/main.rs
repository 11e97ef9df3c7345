//! CLI entry point for tiled segmentation inference

use clap::Parser;
use gausstile::io::cli::{Cli, FileProcessor, print_reports};
use tracing_subscriber::EnvFilter;

fn main() -> gausstile::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let quiet = cli.quiet;
    let processor = FileProcessor::new(cli);
    let reports = processor.process()?;
    if !quiet {
        print_reports(&reports);
    }
    Ok(())
}
