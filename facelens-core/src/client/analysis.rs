//! HTTP client for POST /api/analyze-photo

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, AnalyzeRequest};

use super::{AnalysisClient, HttpTransport};

pub struct HttpAnalysisClient {
    transport: HttpTransport,
    url: String,
}

impl HttpAnalysisClient {
    pub fn new(transport: HttpTransport, path: &str) -> Self {
        let url = transport.url(path);
        Self { transport, url }
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, image_url: &str) -> Result<AnalysisResult> {
        let response = self
            .transport
            .http()
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&AnalyzeRequest { image_url })
            .send()
            .await
            .map_err(|e| Error::Analysis {
                status: None,
                body: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        // Keep the raw text so failures carry the server's diagnostics
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Analysis API error");
            return Err(Error::Analysis {
                status: Some(status.as_u16()),
                body,
            });
        }

        parse_analysis_body(status.as_u16(), body)
    }
}

fn parse_analysis_body(status: u16, body: String) -> Result<AnalysisResult> {
    match serde_json::from_str::<AnalysisResult>(&body) {
        Ok(result) => Ok(result),
        Err(e) => {
            tracing::error!(error = %e, "Analysis response was not a valid result");
            Err(Error::Analysis {
                status: Some(status),
                body,
            })
        }
    }
}
