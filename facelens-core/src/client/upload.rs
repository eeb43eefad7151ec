//! HTTP client for the upload service
//!
//! Sends the image as a single `file` part of a multipart form and expects
//! `{ "url": ... }` or `{ "error": ... }` back.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{UploadRequest, UploadedAsset};

use super::{HttpTransport, UploadClient};

/// Response from the upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpUploadClient {
    transport: HttpTransport,
    url: String,
}

impl HttpUploadClient {
    pub fn new(transport: HttpTransport, path: &str) -> Self {
        let url = transport.url(path);
        Self { transport, url }
    }
}

#[async_trait]
impl UploadClient for HttpUploadClient {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset> {
        let bytes = tokio::fs::read(request.image.path()).await.map_err(|e| {
            Error::Upload(format!("failed to read {}: {}", request.image, e))
        })?;
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(request.filename.clone())
            .mime_str(&request.mime_type)
            .map_err(|e| Error::Upload(format!("invalid mime type {}: {}", request.mime_type, e)))?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            image = %request.image,
            mime_type = %request.mime_type,
            bytes = size,
            "Uploading image"
        );

        let response = self
            .transport
            .http()
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());

        if !status.is_success() {
            return Err(Error::Upload(format!("API error ({}): {}", status, body)));
        }

        parse_upload_body(&body)
    }
}

fn parse_upload_body(body: &str) -> Result<UploadedAsset> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| Error::Upload(format!("failed to parse response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(Error::Upload(error));
    }

    match response.url {
        Some(url) if !url.is_empty() => Ok(UploadedAsset { url }),
        _ => Err(Error::Upload("upload response missing url".to_string())),
    }
}
