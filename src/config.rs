//! Configuration types for text extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Converter credentials are never
//! compiled in: they come from the caller, the environment
//! ([`ExtractionConfig::from_env`]) or CLI flags, and `Debug` output redacts
//! them.

use crate::converter::{CloudConverterConfig, Converter, VendorConverterConfig};
use crate::error::DocTextError;
use crate::hwp::LegacyParser;
use crate::pipeline::quality::QualityGate;
use crate::pipeline::scan::ScanRanges;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

// ── Environment variables ────────────────────────────────────────────────

pub const ENV_CLOUD_URL: &str = "DOCTEXT_CLOUD_URL";
pub const ENV_CLOUD_API_KEY: &str = "DOCTEXT_CLOUD_API_KEY";
pub const ENV_VENDOR_TOKEN_URL: &str = "DOCTEXT_VENDOR_TOKEN_URL";
pub const ENV_VENDOR_CONVERT_URL: &str = "DOCTEXT_VENDOR_CONVERT_URL";
pub const ENV_VENDOR_CLIENT_ID: &str = "DOCTEXT_VENDOR_CLIENT_ID";
pub const ENV_VENDOR_CLIENT_SECRET: &str = "DOCTEXT_VENDOR_CLIENT_SECRET";
pub const ENV_OFFICE_BIN: &str = "DOCTEXT_OFFICE_BIN";
pub const ENV_WORK_DIR: &str = "DOCTEXT_WORK_DIR";

/// Configuration for one or many extractions.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use doctext::{ExtractionConfig, QualityGate};
///
/// let config = ExtractionConfig::builder()
///     .quality_gate(QualityGate::strict())
///     .converter_timeout_secs(30)
///     .enable_converters(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Acceptance thresholds applied to every HWP strategy. Default: (20, 5).
    pub quality_gate: QualityGate,

    /// Lead/trail byte ranges for the legacy byte-pair scanner.
    pub scan_ranges: ScanRanges,

    /// Parent directory for downloads and converter scratch directories.
    /// Default: the system temp dir.
    pub work_dir: PathBuf,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-attempt timeout for each external converter in seconds. Default: 60.
    pub converter_timeout_secs: u64,

    /// Office-suite program and leading arguments. Default: `["soffice"]`.
    pub office_command: Vec<String>,

    /// Cloud conversion API; skipped when `None`.
    pub cloud: Option<CloudConverterConfig>,

    /// Vendor OAuth2 conversion API; skipped when `None`.
    pub vendor: Option<VendorConverterConfig>,

    /// Run the external-converter strategy for HWP. Default: true.
    pub enable_converters: bool,

    /// Pre-constructed legacy HWP parser. Default: the built-in compound-file parser.
    pub parser: Option<Arc<dyn LegacyParser>>,

    /// Pre-constructed converters. Takes precedence over `office_command`,
    /// `cloud` and `vendor`.
    pub converters: Option<Vec<Arc<dyn Converter>>>,

    /// Optional progress callback for strategy-level events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            quality_gate: QualityGate::default(),
            scan_ranges: ScanRanges::default(),
            work_dir: std::env::temp_dir(),
            download_timeout_secs: 120,
            converter_timeout_secs: 60,
            office_command: vec!["soffice".to_string()],
            cloud: None,
            vendor: None,
            enable_converters: true,
            parser: None,
            converters: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("quality_gate", &self.quality_gate)
            .field("scan_ranges", &self.scan_ranges)
            .field("work_dir", &self.work_dir)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("converter_timeout_secs", &self.converter_timeout_secs)
            .field("office_command", &self.office_command)
            .field("cloud", &self.cloud)
            .field("vendor", &self.vendor)
            .field("enable_converters", &self.enable_converters)
            .field("parser", &self.parser.as_ref().map(|p| p.name().to_string()))
            .field(
                "converters",
                &self
                    .converters
                    .as_ref()
                    .map(|cs| cs.iter().map(|c| c.name().to_string()).collect::<Vec<_>>()),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with the `DOCTEXT_*` environment variables.
    pub fn from_env() -> Result<Self, DocTextError> {
        Self::builder().env_overrides().build()
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn quality_gate(mut self, gate: QualityGate) -> Self {
        self.config.quality_gate = gate;
        self
    }

    pub fn scan_ranges(mut self, ranges: ScanRanges) -> Self {
        self.config.scan_ranges = ranges;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn converter_timeout_secs(mut self, secs: u64) -> Self {
        self.config.converter_timeout_secs = secs;
        self
    }

    /// Office-suite program followed by any leading arguments.
    pub fn office_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.office_command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn cloud(mut self, cloud: CloudConverterConfig) -> Self {
        self.config.cloud = Some(cloud);
        self
    }

    pub fn vendor(mut self, vendor: VendorConverterConfig) -> Self {
        self.config.vendor = Some(vendor);
        self
    }

    pub fn enable_converters(mut self, v: bool) -> Self {
        self.config.enable_converters = v;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn LegacyParser>) -> Self {
        self.config.parser = Some(parser);
        self
    }

    pub fn converters(mut self, converters: Vec<Arc<dyn Converter>>) -> Self {
        self.config.converters = Some(converters);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Overlay the `DOCTEXT_*` environment variables.
    ///
    /// The cloud converter is configured only when both its URL and key are
    /// set; the vendor converter only when all four of its variables are.
    pub fn env_overrides(self) -> Self {
        self.overrides_from(|key| std::env::var(key).ok())
    }

    fn overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = var(ENV_WORK_DIR) {
            self.config.work_dir = PathBuf::from(dir);
        }
        if let Some(bin) = var(ENV_OFFICE_BIN) {
            self.config.office_command = vec![bin];
        }
        if let (Some(endpoint), Some(api_key)) = (var(ENV_CLOUD_URL), var(ENV_CLOUD_API_KEY)) {
            self.config.cloud = Some(CloudConverterConfig { endpoint, api_key });
        }
        if let (Some(token_url), Some(convert_url), Some(client_id), Some(client_secret)) = (
            var(ENV_VENDOR_TOKEN_URL),
            var(ENV_VENDOR_CONVERT_URL),
            var(ENV_VENDOR_CLIENT_ID),
            var(ENV_VENDOR_CLIENT_SECRET),
        ) {
            self.config.vendor = Some(VendorConverterConfig::new(
                token_url,
                convert_url,
                client_id,
                client_secret,
            ));
        }
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, DocTextError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(DocTextError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.converter_timeout_secs == 0 {
            return Err(DocTextError::InvalidConfig(
                "Converter timeout must be ≥ 1 second".into(),
            ));
        }
        if c.quality_gate.min_length == 0 {
            return Err(DocTextError::InvalidConfig(
                "Quality gate min_length must be ≥ 1".into(),
            ));
        }
        if c.scan_ranges.lead.is_empty() || c.scan_ranges.trail.is_empty() {
            return Err(DocTextError::InvalidConfig(format!(
                "Scan ranges must not be empty, got lead {:?} trail {:?}",
                c.scan_ranges.lead, c.scan_ranges.trail
            )));
        }
        if c.office_command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(DocTextError::InvalidConfig(
                "Office command must name a program".into(),
            ));
        }
        if let Some(cloud) = &c.cloud {
            require_http_url("cloud endpoint", &cloud.endpoint)?;
        }
        if let Some(vendor) = &c.vendor {
            require_http_url("vendor token URL", &vendor.token_url)?;
            require_http_url("vendor convert URL", &vendor.convert_url)?;
            if vendor.max_polls == 0 {
                return Err(DocTextError::InvalidConfig(
                    "Vendor max_polls must be ≥ 1".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

fn require_http_url(what: &str, url: &str) -> Result<(), DocTextError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(DocTextError::InvalidConfig(format!(
            "{what} must be an http(s) URL, got '{url}'"
        )))
    }
}
