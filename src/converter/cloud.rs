//! Cloud conversion API: multipart upload, PDF back.

use super::{extract_converted, ConversionInput, Converter, ConverterError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Endpoint and API key of an HWP → PDF conversion service.
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudConverterConfig {
    /// Full URL of the conversion endpoint.
    pub endpoint: String,
    /// Sent as `Authorization: Bearer <api_key>`.
    pub api_key: String,
}

impl fmt::Debug for CloudConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConverterConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CloudConverter {
    config: Option<CloudConverterConfig>,
    client: reqwest::Client,
}

impl CloudConverter {
    pub fn new(config: Option<CloudConverterConfig>, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Converter for CloudConverter {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn convert(&self, input: &ConversionInput<'_>) -> Result<String, ConverterError> {
        let config = self.config.as_ref().ok_or(ConverterError::NotConfigured)?;

        let part = Part::bytes(input.bytes.to_vec())
            .file_name(input.file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part).text("outputformat", "pdf");

        let response = self
            .client
            .post(&config.endpoint)
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConverterError::Http(format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "cloud conversion returned");
        extract_converted(bytes.to_vec(), input.file_name).await
    }
}
