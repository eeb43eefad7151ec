//! HTTP client for GET /api/analytics

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{AnalyticsResponse, AnalyticsSummary};

use super::{AnalyticsClient, HttpTransport};

pub struct HttpAnalyticsClient {
    transport: HttpTransport,
    url: String,
}

impl HttpAnalyticsClient {
    pub fn new(transport: HttpTransport, path: &str) -> Self {
        let url = transport.url(path);
        Self { transport, url }
    }
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    async fn fetch_summary(&self) -> Result<AnalyticsSummary> {
        let response = self
            .transport
            .http()
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Analytics(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let result: AnalyticsResponse = response
                .json()
                .await
                .map_err(|e| Error::Analytics(format!("failed to parse response: {}", e)))?;
            Ok(result.summary)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Analytics(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}
