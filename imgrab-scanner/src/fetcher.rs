use crate::error::{FetchError, Result, ScanError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// HTTP client shared by the page fetch and every image download of a run.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout_secs = timeout_secs.max(1);
        let client = Client::builder()
            .user_agent(concat!("imgrab/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(ScanError::ClientError)?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET a page and return its body as text.
    ///
    /// Redirects are followed. Any non-2xx final status is an error.
    ///
    /// The body is decoded with the charset from `Content-Type` (UTF-8 when
    /// absent), replacing invalid sequences with U+FFFD, so the lenient HTML
    /// parser always gets text. `Decode` is only returned when the body
    /// cannot be read to the end.
    pub async fn fetch_page(&self, url: &Url) -> std::result::Result<String, FetchError> {
        info!("Fetching page {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;
        debug!("Fetched {} bytes from {}", body.len(), url);

        Ok(body)
    }
}
