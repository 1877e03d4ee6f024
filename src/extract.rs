//! Extraction entry points.
//!
//! Every public function funnels into [`extract_document`]: sniff the
//! format, run a direct extractor or the HWP recovery chain, and wrap the
//! text in an [`ExtractionOutput`]. HWP exhaustion is an `Ok` output
//! carrying the explanation and per-strategy reasons; `Err` is reserved for
//! requests that cannot be served at all.

use crate::config::ExtractionConfig;
use crate::error::DocTextError;
use crate::formats;
use crate::output::{
    DocumentFormat, ExtractionOutcome, ExtractionOutput, ExtractionStats, RawDocument,
};
use crate::pipeline::{input, sniff, strategy};
use crate::progress::{ExtractionProgressCallback, NoopProgressCallback};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract text from a local file or an HTTP(S) URL.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(DocTextError)` only for fatal errors:
/// - File not found / permission denied / download failure
/// - Unsupported or corrupt document
///
/// A legacy HWP file that no strategy could recover is **not** an error:
/// the output's `text` holds the explanation and `failure` the reasons.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocTextError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved =
        input::resolve_input(input_str, config.download_timeout_secs, &config.work_dir).await?;

    // ── Step 2: Read bytes ───────────────────────────────────────────────
    let bytes = resolved.read().await?;
    let file_name = resolved.file_name();
    debug!("Read {} bytes from {}", bytes.len(), resolved.path().display());

    // ── Step 3: Sniff + extract ──────────────────────────────────────────
    let doc = sniffed(bytes, &file_name);
    let output = run(doc, config, start).await;
    // The download directory (if any) lives until here.
    drop(resolved);
    output
}

/// Extract text from a file on disk, reporting it under `file_name`.
///
/// Used for uploads spooled to temporary files whose on-disk names carry no
/// meaning.
pub async fn extract_file(
    path: impl AsRef<Path>,
    file_name: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocTextError> {
    let start = Instant::now();
    let resolved = input::ResolvedInput::Local(path.as_ref().to_path_buf());
    let bytes = resolved.read().await?;
    run(sniffed(bytes, file_name), config, start).await
}

/// Extract text from an in-memory document.
///
/// `file_name` is only used for the extension fallback when content
/// sniffing is inconclusive, and for converter inputs.
pub async fn extract_from_bytes(
    bytes: impl Into<Arc<[u8]>>,
    file_name: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocTextError> {
    let start = Instant::now();
    let bytes: Arc<[u8]> = bytes.into();
    if bytes.is_empty() {
        return Err(DocTextError::InvalidPayload {
            reason: format!("'{file_name}' is empty"),
        });
    }
    run(sniffed(bytes, file_name), config, start).await
}

/// Extract text from an already-sniffed document.
pub async fn extract_document(
    doc: RawDocument,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocTextError> {
    run(doc, config, Instant::now()).await
}

/// Extract and return just the text.
pub async fn extract_text(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<String, DocTextError> {
    extract(input_str, config).await.map(|output| output.text)
}

/// Extract text from bytes that must be an HWPX document.
///
/// # Errors
/// [`DocTextError::UnexpectedFormat`] when the content is anything else.
pub async fn extract_hwpx(
    bytes: impl Into<Arc<[u8]>>,
    file_name: &str,
    config: &ExtractionConfig,
) -> Result<String, DocTextError> {
    let doc = sniffed(bytes, file_name);
    if doc.format != DocumentFormat::Hwpx {
        return Err(DocTextError::UnexpectedFormat {
            file_name: file_name.to_string(),
            expected: DocumentFormat::Hwpx,
            actual: doc.format,
        });
    }
    extract_document(doc, config).await.map(|output| output.text)
}

/// Extract text and write it directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocTextError> {
    let output = extract(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.text).await?;
    Ok(output)
}

/// Write `text` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, text: &str) -> Result<(), DocTextError> {
    let write_err = |e| DocTextError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, text).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocTextError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocTextError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

fn sniffed(bytes: impl Into<Arc<[u8]>>, file_name: &str) -> RawDocument {
    let bytes: Arc<[u8]> = bytes.into();
    let format = sniff::sniff(&bytes, file_name);
    RawDocument::new(bytes, format, file_name)
}

async fn run(
    doc: RawDocument,
    config: &ExtractionConfig,
    start: Instant,
) -> Result<ExtractionOutput, DocTextError> {
    let progress: &dyn ExtractionProgressCallback = config
        .progress_callback
        .as_deref()
        .unwrap_or(&NoopProgressCallback);

    info!(file_name = %doc.file_name, format = %doc.format, bytes = doc.bytes.len(), "Extracting");
    progress.on_extraction_start(&doc.file_name, doc.format);

    let (text, strategy, failure, attempts) = if doc.format.is_legacy_hwp() {
        // ── HWP: strategy chain ──────────────────────────────────────────
        let strategies = strategy::default_strategies(config);
        let outcome =
            strategy::run_strategies(&strategies, &doc, &config.quality_gate, progress).await;
        match outcome {
            ExtractionOutcome::Accepted(candidate) => {
                let attempts = strategies
                    .iter()
                    .position(|s| s.kind() == candidate.strategy)
                    .map_or(strategies.len(), |p| p + 1);
                (candidate.text, Some(candidate.strategy), None, attempts)
            }
            ExtractionOutcome::Exhausted(failure) => {
                let attempts = failure.reasons.len();
                (failure.message.clone(), None, Some(failure), attempts)
            }
        }
    } else if doc.format == DocumentFormat::Unknown {
        return Err(DocTextError::UnsupportedFormat {
            file_name: doc.file_name.clone(),
        });
    } else {
        // ── Everything else: single pass ─────────────────────────────────
        let direct = doc.clone();
        let text = tokio::task::spawn_blocking(move || formats::extract_direct(&direct))
            .await
            .map_err(|e| DocTextError::Internal(format!("Extraction task failed: {}", e)))??;
        (text.trim().to_string(), None, None, 0)
    };

    let stats = ExtractionStats {
        total_duration_ms: start.elapsed().as_millis() as u64,
        strategies_attempted: attempts,
    };
    let recovered = failure.is_none();
    info!(
        "Extraction complete: {} chars from {} ({}), {}ms",
        text.chars().count(),
        doc.file_name,
        doc.format,
        stats.total_duration_ms
    );
    progress.on_extraction_complete(text.chars().count(), recovered);

    Ok(ExtractionOutput {
        text,
        format: doc.format,
        file_name: doc.file_name,
        strategy,
        failure,
        stats,
    })
}
