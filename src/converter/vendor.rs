//! Vendor conversion API with OAuth2 client-credentials auth.
//!
//! Flow:
//!
//! 1. `POST token_url` (form: `grant_type=client_credentials`, id, secret)
//!    returns `{ "access_token": … }`.
//! 2. `POST convert_url` with the raw file body and the bearer token.
//! 3. The response is either the converted document (PDF or text, by
//!    `Content-Type`) or a JSON job handle:
//!    `{ "jobId", "statusUrl", "downloadUrl", "text", "status" }`.
//! 4. A pending job is polled every `poll_interval_ms`, at most `max_polls`
//!    times, until it carries `text` or a `downloadUrl`.

use super::{extract_converted, ConversionInput, Converter, ConverterError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Serialize, Deserialize)]
pub struct VendorConverterConfig {
    pub token_url: String,
    pub convert_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Delay between job status polls. Default: 1000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum number of job status polls. Default: 30.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_polls() -> u32 {
    30
}

impl VendorConverterConfig {
    /// Config with default polling.
    pub fn new(
        token_url: impl Into<String>,
        convert_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            convert_url: convert_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

impl fmt::Debug for VendorConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorConverterConfig")
            .field("token_url", &self.token_url)
            .field("convert_url", &self.convert_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Asynchronous job handle returned instead of the converted bytes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobHandle {
    job_id: Option<String>,
    status_url: Option<String>,
    download_url: Option<String>,
    text: Option<String>,
    status: Option<String>,
}

impl JobHandle {
    fn has_failed(&self) -> bool {
        matches!(
            self.status.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("failed" | "error" | "cancelled")
        )
    }
}

#[derive(Debug, Clone)]
pub struct VendorConverter {
    config: Option<VendorConverterConfig>,
    client: reqwest::Client,
}

impl VendorConverter {
    pub fn new(config: Option<VendorConverterConfig>, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    async fn access_token(&self, config: &VendorConverterConfig) -> Result<String, ConverterError> {
        let response = self
            .client
            .post(&config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ConverterError::Http(format!(
                "token request rejected: HTTP {}",
                response.status()
            )));
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Turn a response into text: converted bytes or a job to follow.
    async fn read_response(
        &self,
        config: &VendorConverterConfig,
        token: &str,
        response: reqwest::Response,
        file_name: &str,
    ) -> Result<String, ConverterError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ConverterError::Http(format!("conversion rejected: HTTP {status}")));
        }
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let job: JobHandle = response.json().await?;
            self.follow_job(config, token, job, file_name).await
        } else {
            let bytes = response.bytes().await?;
            extract_converted(bytes.to_vec(), file_name).await
        }
    }

    async fn follow_job(
        &self,
        config: &VendorConverterConfig,
        token: &str,
        job: JobHandle,
        file_name: &str,
    ) -> Result<String, ConverterError> {
        if let Some(text) = self.finished(token, &job, file_name).await? {
            return Ok(text);
        }
        let status_url = match (&job.status_url, &job.job_id) {
            (Some(url), _) => url.clone(),
            (None, Some(id)) => format!("{}/{id}", config.convert_url.trim_end_matches('/')),
            (None, None) => {
                return Err(ConverterError::Failed(
                    "job handle has neither jobId nor statusUrl".into(),
                ))
            }
        };

        for poll in 1..=config.max_polls {
            tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            let response = self.client.get(&status_url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(ConverterError::Http(format!(
                    "job status: HTTP {}",
                    response.status()
                )));
            }
            let job: JobHandle = response.json().await?;
            debug!(poll, status = ?job.status, "polled conversion job");
            if let Some(text) = self.finished(token, &job, file_name).await? {
                return Ok(text);
            }
        }
        Err(ConverterError::Failed(format!(
            "job not finished after {} polls",
            config.max_polls
        )))
    }

    /// `Some(text)` once the job carries a result, an error once it failed.
    async fn finished(&self, token: &str, job: &JobHandle, file_name: &str) -> Result<Option<String>, ConverterError> {
        if job.has_failed() {
            return Err(ConverterError::Failed(format!(
                "job reported status '{}'",
                job.status.as_deref().unwrap_or_default()
            )));
        }
        if let Some(text) = job.text.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(Some(text.to_string()));
        }
        if let Some(url) = &job.download_url {
            let response = self.client.get(url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(ConverterError::Http(format!("download: HTTP {}", response.status())));
            }
            let bytes = response.bytes().await?;
            return extract_converted(bytes.to_vec(), file_name).await.map(Some);
        }
        Ok(None)
    }
}

#[async_trait]
impl Converter for VendorConverter {
    fn name(&self) -> &str {
        "vendor"
    }

    async fn convert(&self, input: &ConversionInput<'_>) -> Result<String, ConverterError> {
        let config = self.config.as_ref().ok_or(ConverterError::NotConfigured)?;
        let token = self.access_token(config).await?;

        let response = self
            .client
            .post(&config.convert_url)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .query(&[("filename", input.file_name)])
            .body(input.bytes.to_vec())
            .send()
            .await?;
        self.read_response(config, &token, response, input.file_name).await
    }
}
