//! External-converter fallback chain for HWP documents.
//!
//! The last and most expensive recovery strategy: hand the file to something
//! that actually understands HWP and read back a format we can extract.
//!
//! ```text
//!            ┌──────────────┐  fail  ┌──────────────┐  fail  ┌──────────────┐  fail
//!  bytes ──▶ │ office suite │ ─────▶ │  cloud API   │ ─────▶ │  vendor API  │ ─────▶ EXHAUSTED_MESSAGE
//!            └──────┬───────┘        └──────┬───────┘        └──────┬───────┘
//!                   └───────────────────────┴───────────────────────┴──▶ DOCX / PDF / text ──▶ String
//! ```
//!
//! Attempts run strictly one after another. Each is bounded by the chain's
//! timeout; when it fires the attempt future is dropped, which removes its
//! temporary directory and kills any child process it spawned.

pub mod cloud;
pub mod office;
pub mod vendor;

pub use cloud::{CloudConverter, CloudConverterConfig};
pub use office::OfficeConverter;
pub use vendor::{VendorConverter, VendorConverterConfig};

use crate::config::ExtractionConfig;
use crate::error::{DocTextError, StrategyFailure};
use crate::formats::{docx, pdf, text};
use crate::messages::EXHAUSTED_MESSAGE;
use crate::output::StrategyKind;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why one converter attempt produced nothing.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Endpoint or credentials are missing; the chain skips this converter.
    #[error("not configured")]
    NotConfigured,

    #[error("'{program}' is not installed or not on PATH")]
    NotInstalled { program: String },

    #[error("conversion failed: {0}")]
    Failed(String),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    /// The converter reported success but left no output behind.
    #[error("converter produced no output")]
    NoOutput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The converted document could not be read back.
    #[error("converted output unreadable: {0}")]
    Extract(#[source] DocTextError),
}

impl From<reqwest::Error> for ConverterError {
    fn from(e: reqwest::Error) -> Self {
        ConverterError::Http(e.to_string())
    }
}

/// The document handed to a converter.
#[derive(Debug, Clone, Copy)]
pub struct ConversionInput<'a> {
    pub bytes: &'a [u8],
    /// Original file name; converters keep its stem for their output.
    pub file_name: &'a str,
    /// Parent directory for per-attempt scratch directories.
    pub work_dir: &'a Path,
}

/// One external conversion backend.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short identifier used in logs and failure reasons.
    fn name(&self) -> &str;

    /// Convert the document and return its plain text.
    async fn convert(&self, input: &ConversionInput<'_>) -> Result<String, ConverterError>;
}

/// The ordered converter chain.
pub struct ConverterChain {
    converters: Vec<Arc<dyn Converter>>,
    timeout: Duration,
    work_dir: PathBuf,
}

impl std::fmt::Debug for ConverterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterChain")
            .field(
                "converters",
                &self.converters.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("timeout", &self.timeout)
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl ConverterChain {
    pub fn new(converters: Vec<Arc<dyn Converter>>, timeout: Duration, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            converters,
            timeout,
            work_dir: work_dir.into(),
        }
    }

    /// Office suite, then cloud API, then vendor API, unless the config
    /// supplies its own converters.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let converters = match &config.converters {
            Some(converters) => converters.clone(),
            None => {
                let client = reqwest::Client::new();
                vec![
                    Arc::new(OfficeConverter::new(config.office_command.clone())) as Arc<dyn Converter>,
                    Arc::new(CloudConverter::new(config.cloud.clone(), client.clone())),
                    Arc::new(VendorConverter::new(config.vendor.clone(), client)),
                ]
            }
        };
        Self::new(
            converters,
            Duration::from_secs(config.converter_timeout_secs),
            config.work_dir.clone(),
        )
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Try every converter in order; the first non-empty text wins.
    ///
    /// On failure, returns one [`StrategyFailure`] per converter, each
    /// reason prefixed with the converter's name.
    pub async fn try_convert(&self, bytes: &[u8], file_name: &str) -> Result<String, Vec<StrategyFailure>> {
        let input = ConversionInput {
            bytes,
            file_name,
            work_dir: &self.work_dir,
        };
        let mut failures = Vec::with_capacity(self.converters.len());

        for converter in &self.converters {
            let start = Instant::now();
            let result = match tokio::time::timeout(self.timeout, converter.convert(&input)).await {
                Ok(result) => result,
                Err(_) => Err(ConverterError::Timeout {
                    secs: self.timeout.as_secs(),
                }),
            };

            match result {
                Ok(text) if !text.trim().is_empty() => {
                    info!(
                        converter = converter.name(),
                        chars = text.chars().count(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "converter produced text"
                    );
                    return Ok(text);
                }
                Ok(_) => {
                    warn!(converter = converter.name(), "converter returned empty text");
                    failures.push(failure(converter.name(), "returned empty text"));
                }
                Err(ConverterError::NotConfigured) => {
                    debug!(converter = converter.name(), "converter not configured, skipping");
                    failures.push(failure(converter.name(), ConverterError::NotConfigured));
                }
                Err(e) => {
                    warn!(converter = converter.name(), error = %e, "converter failed");
                    failures.push(failure(converter.name(), e));
                }
            }
        }
        Err(failures)
    }

    /// Converted text, or [`EXHAUSTED_MESSAGE`] when every converter failed.
    pub async fn convert_and_extract(&self, bytes: &[u8], file_name: &str) -> String {
        match self.try_convert(bytes, file_name).await {
            Ok(text) => text,
            Err(_) => EXHAUSTED_MESSAGE.to_string(),
        }
    }
}

fn failure(converter: &str, reason: impl std::fmt::Display) -> StrategyFailure {
    StrategyFailure::new(StrategyKind::ExternalConverter, format!("{converter}: {reason}"))
}

/// Read text out of converter output, routing by content: PDF, ZIP (DOCX)
/// or plain text.
pub(crate) async fn extract_converted(bytes: Vec<u8>, file_name: &str) -> Result<String, ConverterError> {
    if bytes.is_empty() {
        return Err(ConverterError::NoOutput);
    }
    let name = file_name.to_string();
    tokio::task::spawn_blocking(move || {
        if bytes.starts_with(b"%PDF") {
            pdf::extract_text(&bytes, &name)
        } else if bytes.starts_with(b"PK\x03\x04") {
            docx::extract_text(&bytes, &name)
        } else {
            Ok(text::decode(&bytes))
        }
    })
    .await
    .map_err(|e| ConverterError::Failed(format!("extraction task failed: {e}")))?
    .map_err(ConverterError::Extract)
}
