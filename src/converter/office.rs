//! Headless office-suite conversion (`soffice --convert-to`).
//!
//! Every attempt gets its own scratch directory under the work dir:
//!
//! ```text
//! doctext-office-XXXXXX/
//!   ├── <input file>     copy of the uploaded bytes
//!   ├── profile/         private user profile, so parallel instances don't fight over a lock
//!   └── out/             --outdir; the converted file lands here
//! ```
//!
//! The converted file's presence is the only success signal. The suite's
//! exit status is logged but not trusted, because it exits 0 on many
//! conversion failures and non-zero on some successes.

use super::{extract_converted, ConversionInput, Converter, ConverterError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Output formats tried in order.
const ROUTES: [&str; 2] = ["docx", "pdf"];

/// Runs an office suite in headless mode.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    /// Program followed by any leading arguments, e.g. `["soffice"]`.
    command: Vec<String>,
}

impl OfficeConverter {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Run one `--convert-to <ext>` pass; `Ok(None)` when no output appeared.
    async fn run_route(
        &self,
        program: &str,
        ext: &str,
        input_path: &Path,
        scratch: &Path,
    ) -> Result<Option<Vec<u8>>, ConverterError> {
        let out_dir = scratch.join("out");
        tokio::fs::create_dir_all(&out_dir).await?;

        let output = Command::new(program)
            .args(&self.command[1..])
            .arg(format!("-env:UserInstallation=file://{}", scratch.join("profile").display()))
            .arg("--headless")
            .arg("--convert-to")
            .arg(ext)
            .arg("--outdir")
            .arg(&out_dir)
            .arg(input_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ConverterError::NotInstalled {
                    program: program.to_string(),
                },
                _ => ConverterError::Io(e),
            })?;

        debug!(
            route = ext,
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "office suite exited"
        );

        let expected = out_dir.join(output_name(input_path, ext));
        match tokio::fs::read(&expected).await {
            Ok(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConverterError::Io(e)),
        }
    }
}

#[async_trait]
impl Converter for OfficeConverter {
    fn name(&self) -> &str {
        "office"
    }

    async fn convert(&self, input: &ConversionInput<'_>) -> Result<String, ConverterError> {
        let program = self.program().ok_or(ConverterError::NotConfigured)?;

        let scratch = tempfile::Builder::new()
            .prefix("doctext-office-")
            .tempdir_in(input.work_dir)?;
        let input_path = scratch.path().join(input_file_name(input.file_name));
        tokio::fs::write(&input_path, input.bytes).await?;

        let mut last_error = ConverterError::NoOutput;
        for ext in ROUTES {
            match self.run_route(program, ext, &input_path, scratch.path()).await {
                Ok(Some(bytes)) => match extract_converted(bytes, &output_name(&input_path, ext)).await {
                    Ok(text) if !text.trim().is_empty() => return Ok(text),
                    Ok(_) => last_error = ConverterError::NoOutput,
                    Err(e) => {
                        warn!(route = ext, error = %e, "could not read converted output");
                        last_error = e;
                    }
                },
                Ok(None) => {
                    debug!(route = ext, "no output file produced");
                    last_error = ConverterError::NoOutput;
                }
                // Not installed: the next route would fail the same way.
                Err(e @ ConverterError::NotInstalled { .. }) => return Err(e),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

/// A file-system-safe name for the input copy, keeping the extension.
fn input_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let safe: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if safe.trim_matches(['.', '_']).is_empty() {
        "document.hwp".to_string()
    } else {
        safe
    }
}

/// `<stem>.<ext>`, the name the suite gives its output.
fn output_name(input_path: &Path, ext: &str) -> String {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}.{ext}")
}
