//! # feed-mirror
//!
//! Mirror the docsets listed in a zipped repository of XML feeds.
//!
//! A feed repository (such as the one behind Dash's docset feeds) is a
//! collection of small XML documents, each naming a docset version and the
//! mirrors it can be downloaded from. This crate downloads the repository as
//! a single ZIP archive, reads every `.xml` entry, and copies the first
//! mirror that streams successfully into a local directory.
//!
//! ## Pipeline
//!
//! 1. [`ArchiveSource::load`] fetches the archive into memory
//! 2. [`ZipArchive`] parses its central directory
//! 3. [`FeedScanner`] walks `.xml` entries and decodes [`FeedDescriptor`]s
//! 4. [`Mirror`] tries each descriptor's URLs in order and writes the first complete body
//!
//! Everything runs sequentially. Any failure except a broken body copy ends
//! the run; a broken copy falls through to the next candidate URL.
//!
//! ## Example
//!
//! ```no_run
//! use feed_mirror::{ArchiveSource, Config, FeedFilter, FetchConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         source: ArchiveSource::parse("https://github.com/Kapeli/feeds/archive/refs/heads/master.zip"),
//!         output_dir: "feeds".into(),
//!         fetch: FetchConfig::default(),
//!         filter: FeedFilter::new(vec!["Go".into()], vec![]),
//!         list_only: false,
//!     };
//!
//!     let summary = feed_mirror::run(&config).await?;
//!     println!("{} of {} feeds mirrored", summary.mirrored, summary.feeds);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod feed;
pub mod filter;
pub mod io;
pub mod logging;
pub mod mirror;
pub mod pipeline;
pub mod scanner;
pub mod zip;

pub use cli::Cli;
pub use feed::FeedDescriptor;
pub use filter::FeedFilter;
pub use io::{ArchiveSource, FetchConfig, HttpFetcher};
pub use mirror::{Mirror, MirrorOutcome};
pub use pipeline::{Config, Summary, run};
pub use scanner::{Feed, FeedScanner};
pub use self::zip::{ZipArchive, ZipFileEntry};
