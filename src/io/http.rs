use anyhow::{Context, Result};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Settings for the process-wide HTTP client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub connect_timeout: Duration,
    /// Maximum idle time between two reads of a response body
    pub read_timeout: Option<Duration>,
    /// Deadline for a whole request, body included
    pub timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
            timeout: None,
            pool_max_idle_per_host: 4,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP client shared by the archive fetch and every mirror download
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str());

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout {
            builder = builder.read_timeout(timeout);
        }

        let client = builder.build().context("Can't create http client")?;
        Ok(Self { client })
    }

    /// Send a GET request and return the response once its headers arrived.
    ///
    /// The status code is not checked: callers get whatever the server sent.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let request = self
            .client
            .get(url)
            .build()
            .with_context(|| format!("Can't create http request to {}", url))?;

        let resp = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("Can't do http request to {}", url))?;

        debug!(url, status = %resp.status(), "response received");
        Ok(resp)
    }

    /// GET a URL and read the whole body into memory
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.get(url).await?;
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("Can't read http body at {}", url))?;

        Ok(body.into())
    }
}
