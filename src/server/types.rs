//! API request and response types

use crate::output::{DocumentFormat, ExtractionFailure, ExtractionOutput, StrategyKind};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response of the general extraction endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTextResponse {
    pub success: bool,
    pub text: String,
    pub file_name: String,
    pub format: DocumentFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    /// Length of `text` in characters.
    pub text_length: usize,
    /// Present when HWP recovery was exhausted; `text` is then the explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExtractionFailure>,
}

impl From<ExtractionOutput> for ExtractTextResponse {
    fn from(output: ExtractionOutput) -> Self {
        Self {
            success: true,
            text_length: output.text.chars().count(),
            text: output.text,
            file_name: output.file_name,
            format: output.format,
            strategy: output.strategy,
            failure: output.failure,
        }
    }
}

/// Response of `POST /extract-hwpx-text`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HwpxTextResponse {
    pub text: String,
}

/// Body of `POST /extract-text/base64`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Base64Request {
    /// Base64 file content; a `data:…;base64,` prefix is tolerated.
    pub data: String,
    pub filename: String,
}

/// Body of `POST /extract-text/url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// Error body returned with every 4xx/5xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
