mod http;

pub use http::{FetchConfig, HttpFetcher};

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;

/// Where the feed archive is loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Url(String),
    File(PathBuf),
}

impl ArchiveSource {
    /// `http://` and `https://` locations are fetched, anything else is a local path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ArchiveSource::Url(location.to_string())
        } else {
            ArchiveSource::File(PathBuf::from(location))
        }
    }

    /// Load the complete archive into memory
    pub async fn load(&self, fetcher: &HttpFetcher) -> Result<Vec<u8>> {
        match self {
            ArchiveSource::Url(url) => fetcher.fetch_bytes(url).await,
            ArchiveSource::File(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Can't read {}", path.display())),
        }
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Url(url) => f.write_str(url),
            ArchiveSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
