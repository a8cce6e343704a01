//! Page materialization
//!
//! A page must be materialized (navigated to and loaded) before it can be
//! scanned. The default `HttpMaterializer` fetches markup over HTTP; hosts
//! that drive a real browser implement `PageMaterializer` themselves and can
//! also report computed background images.

use crate::FetchFailure;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Content of one loaded page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedPage {
    /// Final URL after redirects; relative references resolve against it
    pub url: Url,

    /// Page markup
    pub html: String,

    /// Computed `background-image` values, one per element that has one
    pub computed_background_images: Vec<String>,
}

impl MaterializedPage {
    /// Creates a page with no computed styles
    pub fn from_html(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
            computed_background_images: Vec::new(),
        }
    }
}

/// Loads a page so it can be scanned
#[async_trait]
pub trait PageMaterializer: Send + Sync {
    /// Navigates to `url` and returns its content once loaded
    async fn materialize(&self, url: &Url) -> Result<MaterializedPage, FetchFailure>;
}

/// Materializes pages with a plain HTTP GET
///
/// A page counts as loaded when a 2xx response with an HTML content type
/// arrives. Scripts are not executed.
pub struct HttpMaterializer {
    client: Client,
    settle_delay: Duration,
}

impl HttpMaterializer {
    pub fn new(client: Client, settle_delay: Duration) -> Self {
        Self {
            client,
            settle_delay,
        }
    }
}

/// Returns true if a Content-Type header value denotes HTML
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[async_trait]
impl PageMaterializer for HttpMaterializer {
    async fn materialize(&self, url: &Url) -> Result<MaterializedPage, FetchFailure> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        // A missing header is tolerated; servers that omit it are usually serving HTML
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html_content_type(content_type) {
                return Err(FetchFailure::ContentMismatch(content_type.to_string()));
            }
        }

        let final_url = response.url().clone();
        let html = response.text().await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        tracing::debug!("Materialized {} ({} bytes)", final_url, html.len());
        Ok(MaterializedPage::from_html(final_url, html))
    }
}
