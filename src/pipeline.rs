//! The end-to-end run: load the archive, scan its feeds, mirror each one.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::DirBuilder;
use tracing::{debug, info};

use crate::filter::FeedFilter;
use crate::io::{ArchiveSource, FetchConfig, HttpFetcher};
use crate::mirror::{Mirror, MirrorOutcome};
use crate::scanner::{Feed, FeedScanner};
use crate::zip::ZipArchive;

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct Config {
    pub source: ArchiveSource,
    pub output_dir: PathBuf,
    pub fetch: FetchConfig,
    pub filter: FeedFilter,
    /// Print feeds instead of mirroring them
    pub list_only: bool,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub feeds: usize,
    pub mirrored: usize,
    pub unavailable: usize,
    /// Body copies that failed and fell through to the next candidate
    pub failed_attempts: usize,
}

/// Run the whole pipeline once.
///
/// Stops at the first fatal error; per-URL copy failures only show up in
/// the returned [`Summary`].
pub async fn run(config: &Config) -> Result<Summary> {
    if !config.list_only {
        create_output_dir(&config.output_dir).await?;
    }

    let fetcher = HttpFetcher::new(&config.fetch)?;

    info!("Loading feeds from {}", config.source);
    let data = config.source.load(&fetcher).await?;
    debug!(bytes = data.len(), "feed archive loaded");

    let archive = ZipArchive::new(data).context("Can't create zip reader")?;
    let mirror = Mirror::new(&fetcher, config.output_dir.clone());
    let mut summary = Summary::default();

    for feed in FeedScanner::new(&archive, &config.filter) {
        let feed = feed?;
        summary.feeds += 1;

        if config.list_only {
            print_feed(&feed);
            continue;
        }

        match mirror.mirror(&feed.descriptor).await? {
            MirrorOutcome::Mirrored {
                url,
                path,
                bytes,
                failed_attempts,
            } => {
                debug!(feed = %feed.name, url = %url, path = %path.display(), bytes, "mirrored");
                summary.mirrored += 1;
                summary.failed_attempts += failed_attempts;
            }
            MirrorOutcome::Unavailable { failed_attempts } => {
                summary.unavailable += 1;
                summary.failed_attempts += failed_attempts;
            }
        }
    }

    Ok(summary)
}

/// Create the output directory and its parents, `rwxr-xr-x` on unix
async fn create_output_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);

    builder
        .create(path)
        .await
        .with_context(|| format!("Can't create {} dir", path.display()))
}

fn print_feed(feed: &Feed) {
    println!(
        "{}\t{}\t{}",
        feed.name,
        feed.descriptor.version,
        feed.descriptor.urls.join(" ")
    );
}
