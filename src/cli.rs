use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::filter::FeedFilter;
use crate::io::{ArchiveSource, FetchConfig};
use crate::pipeline::Config;

/// Zipped master branch of the Dash docset feeds repository
pub const DEFAULT_ARCHIVE: &str = "https://github.com/Kapeli/feeds/archive/refs/heads/master.zip";

#[derive(Parser, Debug)]
#[command(name = "feed-mirror")]
#[command(version)]
#[command(about = "Mirror the docsets listed in a zipped repository of XML feeds", long_about = None)]
#[command(after_help = "Examples:\n  \
  feed-mirror                       mirror every feed into ./feeds\n  \
  feed-mirror -d /srv/docsets Go 'Python_*'   mirror Go and all Python feeds\n  \
  feed-mirror -l -a feeds.zip       list feeds of a local archive")]
pub struct Cli {
    /// Feeds to mirror, by name or glob pattern (default: all)
    #[arg(value_name = "FEEDS")]
    pub feeds: Vec<String>,

    /// Feed archive URL or local ZIP path
    #[arg(short = 'a', long = "archive", value_name = "URL|FILE", env = "FEED_MIRROR_ARCHIVE", default_value = DEFAULT_ARCHIVE)]
    pub archive: String,

    /// Directory receiving the mirrored files
    #[arg(short = 'd', long = "output-dir", value_name = "DIR", env = "FEED_MIRROR_OUTPUT_DIR", default_value = "feeds")]
    pub output_dir: PathBuf,

    /// Exclude feeds that follow
    #[arg(short = 'x', value_name = "FEED", num_args = 1..)]
    pub exclude: Vec<String>,

    /// List feeds without downloading anything
    #[arg(short = 'l')]
    pub list: bool,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub connect_timeout: u64,

    /// Abort a transfer after SECS seconds without data
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<u64>,

    /// Abort any request taking longer than SECS seconds in total
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Idle connections kept per host
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub pool_idle: usize,

    /// More output (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        match (self.verbose, self.quiet) {
            (0, 0) => Level::INFO,
            (0, 1) => Level::WARN,
            (0, _) => Level::ERROR,
            (1, _) => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            read_timeout: self.read_timeout.map(Duration::from_secs),
            timeout: self.timeout.map(Duration::from_secs),
            pool_max_idle_per_host: self.pool_idle,
            ..FetchConfig::default()
        }
    }

    pub fn config(&self) -> Config {
        Config {
            source: ArchiveSource::parse(&self.archive),
            output_dir: self.output_dir.clone(),
            fetch: self.fetch_config(),
            filter: FeedFilter::new(self.feeds.clone(), self.exclude.clone()),
            list_only: self.list,
        }
    }
}
