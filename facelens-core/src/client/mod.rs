//! Clients for the remote upload, analysis and analytics services
//!
//! Each service sits behind a trait so the orchestrator can be driven by
//! fakes in tests. The HTTP implementations share one [`HttpTransport`]
//! that carries the base URL, default headers and timeout.
//!
//! ## Usage
//!
//! ```toml
//! [service]
//! base_url = "https://facelens.example.com"
//! api_key = "fl_live_xxxxxxxxxxxx"
//! ```
//!
//! None of the clients retry; retry is a user action on the workflow.

mod analysis;
mod analytics;
mod upload;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::{AnalysisResult, AnalyticsSummary, UploadRequest, UploadedAsset};

pub use analysis::HttpAnalysisClient;
pub use analytics::HttpAnalyticsClient;
pub use upload::HttpUploadClient;

/// Uploads image bytes and returns a durable asset reference.
#[async_trait]
pub trait UploadClient: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset>;
}

/// Runs the remote facial-attribute analysis on an uploaded asset.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Fails with [`Error::Analysis`] on non-2xx status or an unparseable body.
    async fn analyze(&self, image_url: &str) -> Result<AnalysisResult>;
}

/// Fetches the aggregate usage summary.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    async fn fetch_summary(&self) -> Result<AnalyticsSummary>;
}

/// Shared HTTP plumbing for the service clients
#[derive(Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url()?;

        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http_client
    }
}

/// The three HTTP clients built from one configuration
pub struct HttpClients {
    pub upload: HttpUploadClient,
    pub analysis: HttpAnalysisClient,
    pub analytics: HttpAnalyticsClient,
}

impl HttpClients {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self {
            upload: HttpUploadClient::new(transport.clone(), &config.upload_path),
            analysis: HttpAnalysisClient::new(transport.clone(), &config.analyze_path),
            analytics: HttpAnalyticsClient::new(transport, &config.analytics_path),
        })
    }
}
