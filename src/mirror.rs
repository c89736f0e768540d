//! Mirroring of feed artifacts to local disk.
//!
//! Candidate URLs are tried in order and the first one whose body streams
//! to disk without error wins. Only a failure while copying the body falls
//! through to the next candidate; failing to create the output file or to
//! send the request ends the whole run.

use anyhow::{Context, Result, bail};
use reqwest::Response;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::feed::FeedDescriptor;
use crate::io::HttpFetcher;

/// What happened to one feed descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// A candidate was copied completely
    Mirrored {
        url: String,
        path: PathBuf,
        bytes: u64,
        /// Candidates that failed mid-copy before this one
        failed_attempts: usize,
    },
    /// Every candidate failed mid-copy, or there were none
    Unavailable { failed_attempts: usize },
}

/// Output file name for a URL: everything after its last `/`.
///
/// A URL without any `/` is used as-is, like a bare file name.
pub fn output_file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Writes feed artifacts into one output directory
pub struct Mirror<'a> {
    fetcher: &'a HttpFetcher,
    output_dir: PathBuf,
}

impl<'a> Mirror<'a> {
    pub fn new(fetcher: &'a HttpFetcher, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    /// Mirror one descriptor, trying its URLs in priority order.
    ///
    /// # Errors
    ///
    /// Returns an error, ending the run, when a URL has no file name, the
    /// output file can't be created, or the request can't be built or sent.
    /// Body copy failures are logged and the next URL is tried; the partial
    /// file of a failed attempt is left on disk.
    pub async fn mirror(&self, descriptor: &FeedDescriptor) -> Result<MirrorOutcome> {
        let mut failed_attempts = 0;

        for url in &descriptor.urls {
            let file_name = output_file_name(url);
            if file_name.is_empty() {
                bail!("Can't create file for {}: url has no file name", url);
            }

            let path = self.output_dir.join(file_name);
            let mut file = File::create(&path)
                .await
                .with_context(|| format!("Can't create file {}", path.display()))?;

            info!("Fetching {} ...", url);
            let resp = self.fetcher.get(url).await?;
            if !resp.status().is_success() {
                debug!(url = %url, status = %resp.status(), "mirroring non-success response");
            }

            match copy_body(resp, &mut file).await {
                Ok(bytes) => {
                    return Ok(MirrorOutcome::Mirrored {
                        url: url.clone(),
                        path,
                        bytes,
                        failed_attempts,
                    });
                }
                Err(e) => {
                    warn!(
                        "Can't copy http body at {} to {}: {:#}",
                        url,
                        path.display(),
                        e
                    );
                    failed_attempts += 1;
                }
            }
        }

        Ok(MirrorOutcome::Unavailable { failed_attempts })
    }
}

/// Stream a response body into `file`.
///
/// Takes ownership of the response so its connection is released as soon
/// as the copy finishes, whether it succeeded or not.
async fn copy_body(mut resp: Response, file: &mut File) -> Result<u64> {
    let mut written = 0u64;

    let copied = async {
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    // Push out whatever arrived, a failed attempt keeps its partial content
    let flushed = file.flush().await;
    copied?;
    flushed?;

    Ok(written)
}
