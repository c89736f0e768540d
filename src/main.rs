//! Main entry point for the feed-mirror CLI application.

use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use feed_mirror::Cli;
use feed_mirror::logging::init_logging;

/// Parses arguments, runs the pipeline once and maps any fatal error to a
/// failure exit status after printing its full context chain to stderr.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level()) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match feed_mirror::run(&cli.config()).await {
        Ok(summary) => {
            info!(
                "{} feeds, {} mirrored, {} unavailable, {} failed downloads",
                summary.feeds, summary.mirrored, summary.unavailable, summary.failed_attempts
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
