//! HTTP fetcher implementation
//!
//! This module handles all asset requests for a capture task, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Rejecting oversized responses from their Content-Length header
//! - Guarding the streamed body against servers that under-declare size
//! - Error classification into `FetchFailure`

use crate::config::CaptureSettings;
use crate::FetchFailure;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `settings` - The capture settings supplying user agent and timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_archiver::config::CaptureSettings;
/// use site_archiver::crawler::build_http_client;
///
/// let client = build_http_client(&CaptureSettings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &CaptureSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the bytes of one asset
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetches `url`, failing with `FetchFailure::Oversize` past `max_bytes`
    async fn fetch(&self, url: &Url, max_bytes: u64) -> Result<Vec<u8>, FetchFailure>;
}

/// Fetches assets over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    /// # Request Flow
    ///
    /// 1. Send GET request
    /// 2. Non-2xx status → `Status`
    /// 3. Content-Length above the cap → `Oversize` before the body is read
    /// 4. Stream the body, aborting with `Oversize` once the cap is passed
    async fn fetch(&self, url: &Url, max_bytes: u64) -> Result<Vec<u8>, FetchFailure> {
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        if let Some(declared) = response.content_length() {
            if declared > max_bytes {
                return Err(FetchFailure::Oversize {
                    size: declared,
                    limit: max_bytes,
                });
            }
        }

        let mut body = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        while let Some(chunk) = response.chunk().await? {
            let received = (body.len() + chunk.len()) as u64;
            if received > max_bytes {
                return Err(FetchFailure::Oversize {
                    size: received,
                    limit: max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&CaptureSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_with_custom_user_agent() {
        let mut settings = CaptureSettings::default();
        settings.user_agent = "TestArchiver/1.0".to_string();
        settings.request_timeout_secs = 5;
        let client = build_http_client(&settings).unwrap();
        assert!(format!("{:?}", client).contains("Client"));
    }

    #[test]
    fn test_oversize_is_skip() {
        let failure = FetchFailure::Oversize {
            size: 100,
            limit: 10,
        };
        assert!(failure.is_skip());
        assert!(!FetchFailure::Status(404).is_skip());
    }
}
