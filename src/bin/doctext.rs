//! CLI binary for doctext.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doctext::{
    extract, extract_to_file, CloudConverterConfig, DocumentFormat, ExtractionConfig,
    ExtractionOutput, ExtractionProgressCallback, ProgressCallback, QualityGate, StrategyKind,
    VendorConverterConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while reading, one log line per HWP strategy.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.set_message("resolving input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, file_name: &str, format: DocumentFormat) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("{file_name} ({format})"));
        if format.is_legacy_hwp() {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Legacy HWP detected: {file_name}, trying recovery strategies…"))
            ));
        }
    }

    fn on_strategy_start(&self, strategy: StrategyKind, attempt: usize, total: usize) {
        self.bar.set_message(format!("[{attempt}/{total}] {strategy}"));
    }

    fn on_strategy_rejected(&self, strategy: StrategyKind, reason: &str) {
        // Truncate very long reasons to keep output tidy.
        let msg = if reason.chars().count() > 80 {
            format!("{}\u{2026}", reason.chars().take(79).collect::<String>())
        } else {
            reason.to_string()
        };
        self.bar.println(format!("  {} {:<20} {}", red("✗"), strategy.as_str(), dim(&msg)));
    }

    fn on_strategy_accepted(&self, strategy: StrategyKind, text_len: usize) {
        self.bar.println(format!(
            "  {} {:<20} {}",
            green("✓"),
            strategy.as_str(),
            dim(&format!("{text_len} chars"))
        ));
    }

    fn on_extraction_complete(&self, text_len: usize, recovered: bool) {
        self.bar.finish_and_clear();
        if recovered {
            eprintln!("{} {} characters extracted", green("✔"), bold(&text_len.to_string()));
        } else {
            eprintln!("{} no strategy recovered text; printing the explanation", red("✘"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to stdout
  doctext extract report.hwp

  # Extract to a file
  doctext extract report.pdf -o report.txt

  # Strict acceptance for HWP recovery, JSON output
  doctext extract --gate strict --json old.hwp > old.json

  # Extract from a URL
  doctext extract https://example.com/notice.hwpx

  # Run the HTTP service
  doctext serve --addr 0.0.0.0:8080

SUPPORTED FORMATS:
  HWP (3.x, 5.x)   multi-strategy recovery, may return an explanation instead
  HWPX             Contents.xml or Contents/section*.xml
  PDF              text layer via pdfium
  DOCX, XLSX       word/document.xml; sheets as CSV
  TXT, CSV         UTF-8 / UTF-16 by BOM, EUC-KR fallback

ENVIRONMENT VARIABLES:
  DOCTEXT_OFFICE_BIN            Office-suite binary for HWP conversion (default: soffice)
  DOCTEXT_CLOUD_URL             Cloud conversion endpoint (HWP → PDF)
  DOCTEXT_CLOUD_API_KEY         Bearer key for the cloud endpoint
  DOCTEXT_VENDOR_TOKEN_URL      OAuth2 token URL of the vendor API
  DOCTEXT_VENDOR_CONVERT_URL    Conversion URL of the vendor API
  DOCTEXT_VENDOR_CLIENT_ID      OAuth2 client id
  DOCTEXT_VENDOR_CLIENT_SECRET  OAuth2 client secret
  DOCTEXT_WORK_DIR              Directory for downloads and converter scratch files
  PDFIUM_LIB_PATH               Path to libpdfium (otherwise the system library)
  RUST_LOG                      Overrides the log filter
"#;

/// Extract plain text from HWP, HWPX, PDF, DOCX, XLSX, TXT and CSV documents.
#[derive(Parser, Debug)]
#[command(
    name = "doctext",
    version,
    about = "Extract plain text from HWP, HWPX, PDF, DOCX, XLSX, TXT and CSV documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCTEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCTEXT_QUIET")]
    quiet: bool,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from a file path or HTTP/HTTPS URL.
    Extract {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        /// Write text to this file instead of stdout.
        #[arg(short, long, env = "DOCTEXT_OUTPUT")]
        output: Option<PathBuf>,

        /// Output structured JSON (ExtractionOutput) instead of text.
        #[arg(long)]
        json: bool,

        /// Disable progress output.
        #[arg(long, env = "DOCTEXT_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Serve the HTTP extraction API.
    Serve {
        /// Bind address.
        #[arg(long, env = "DOCTEXT_ADDR", default_value = "127.0.0.1:3000")]
        addr: String,

        /// Maximum request body size in MiB.
        #[arg(long, env = "DOCTEXT_BODY_LIMIT_MB", default_value_t = 50)]
        body_limit_mb: usize,

        /// Include internal error messages in responses (never in production).
        #[arg(long, env = "DOCTEXT_EXPOSE_ERRORS")]
        expose_errors: bool,
    },
}

/// Flags shared by both subcommands.
#[derive(clap::Args, Debug)]
struct ExtractionArgs {
    /// Quality gate for HWP recovery: lenient, default, strict.
    #[arg(long, global = true, env = "DOCTEXT_GATE", value_enum, default_value = "default")]
    gate: GateArg,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "DOCTEXT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-converter timeout in seconds.
    #[arg(long, global = true, env = "DOCTEXT_CONVERTER_TIMEOUT", default_value_t = 60)]
    converter_timeout: u64,

    /// Skip external converters for HWP.
    #[arg(long, global = true, env = "DOCTEXT_NO_CONVERTERS")]
    no_converters: bool,

    /// Directory for downloads and converter scratch files.
    #[arg(long, global = true, env = "DOCTEXT_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Office-suite binary used for HWP conversion.
    #[arg(long, global = true, env = "DOCTEXT_OFFICE_BIN", default_value = "soffice")]
    office_bin: String,

    /// Cloud conversion endpoint (HWP → PDF).
    #[arg(long, global = true, env = "DOCTEXT_CLOUD_URL")]
    cloud_url: Option<String>,

    /// Bearer key for the cloud endpoint.
    #[arg(long, global = true, env = "DOCTEXT_CLOUD_API_KEY", hide_env_values = true)]
    cloud_api_key: Option<String>,

    /// OAuth2 token URL of the vendor API.
    #[arg(long, global = true, env = "DOCTEXT_VENDOR_TOKEN_URL")]
    vendor_token_url: Option<String>,

    /// Conversion URL of the vendor API.
    #[arg(long, global = true, env = "DOCTEXT_VENDOR_CONVERT_URL")]
    vendor_convert_url: Option<String>,

    /// OAuth2 client id of the vendor API.
    #[arg(long, global = true, env = "DOCTEXT_VENDOR_CLIENT_ID")]
    vendor_client_id: Option<String>,

    /// OAuth2 client secret of the vendor API.
    #[arg(long, global = true, env = "DOCTEXT_VENDOR_CLIENT_SECRET", hide_env_values = true)]
    vendor_client_secret: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GateArg {
    Lenient,
    Default,
    Strict,
}

impl From<GateArg> for QualityGate {
    fn from(v: GateArg) -> Self {
        match v {
            GateArg::Lenient => QualityGate::lenient(),
            GateArg::Default => QualityGate::default(),
            GateArg::Strict => QualityGate::strict(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (show_progress, json) = match &cli.command {
        Command::Extract { no_progress, json, .. } => (!cli.quiet && !no_progress && !json, *json),
        Command::Serve { .. } => (false, false),
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress output already reports strategy decisions, so library
    // INFO logs are suppressed while it is active.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli.extraction, progress_cb)?;

    match cli.command {
        Command::Extract {
            input,
            output,
            json,
            ..
        } => run_extract(&input, output, json, cli.quiet, show_progress, &config).await,
        Command::Serve {
            addr,
            body_limit_mb,
            expose_errors,
        } => {
            let server = doctext::server::ServerConfig {
                addr,
                body_limit_bytes: body_limit_mb.max(1) * 1024 * 1024,
                expose_error_detail: expose_errors,
            };
            if !cli.quiet {
                eprintln!("{} listening on {}", cyan("◆"), bold(&server.addr));
            }
            doctext::server::serve(config, server)
                .await
                .context("HTTP server failed")
        }
    }
}

async fn run_extract(
    input: &str,
    output_path: Option<PathBuf>,
    json: bool,
    quiet: bool,
    show_progress: bool,
    config: &ExtractionConfig,
) -> Result<()> {
    if let Some(ref output_path) = output_path {
        let output = extract_to_file(input, output_path, config)
            .await
            .context("Extraction failed")?;

        if !quiet {
            eprintln!(
                "{}  {} chars  {}ms  →  {}",
                if output.is_recovered() { green("✔") } else { red("✘") },
                output.text.chars().count(),
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    let output = extract(input, config).await.context("Extraction failed")?;

    if json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.text.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !output.text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }

    // Only print inline stats when the progress callback is disabled.
    if !quiet && !show_progress {
        print_summary(&output);
    }
    Ok(())
}

fn print_summary(output: &ExtractionOutput) {
    match (&output.strategy, &output.failure) {
        (Some(strategy), _) => eprintln!(
            "Recovered {} chars from {} via {} in {}ms",
            output.text.chars().count(),
            output.file_name,
            strategy,
            output.stats.total_duration_ms
        ),
        (None, Some(failure)) => {
            eprintln!("No text recovered from {}:", output.file_name);
            for reason in &failure.reasons {
                eprintln!("  {} {}", red("✗"), reason);
            }
        }
        (None, None) => eprintln!(
            "Extracted {} chars from {} ({}) in {}ms",
            output.text.chars().count(),
            output.file_name,
            output.format,
            output.stats.total_duration_ms
        ),
    }
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(args: &ExtractionArgs, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .quality_gate(args.gate.into())
        .download_timeout_secs(args.download_timeout)
        .converter_timeout_secs(args.converter_timeout)
        .enable_converters(!args.no_converters)
        .office_command([args.office_bin.clone()]);

    if let Some(ref dir) = args.work_dir {
        builder = builder.work_dir(dir);
    }

    if let (Some(endpoint), Some(api_key)) = (&args.cloud_url, &args.cloud_api_key) {
        builder = builder.cloud(CloudConverterConfig {
            endpoint: endpoint.clone(),
            api_key: api_key.clone(),
        });
    }

    if let (Some(token_url), Some(convert_url), Some(client_id), Some(client_secret)) = (
        &args.vendor_token_url,
        &args.vendor_convert_url,
        &args.vendor_client_id,
        &args.vendor_client_secret,
    ) {
        builder = builder.vendor(VendorConverterConfig::new(
            token_url.as_str(),
            convert_url.as_str(),
            client_id.as_str(),
            client_secret.as_str(),
        ));
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
