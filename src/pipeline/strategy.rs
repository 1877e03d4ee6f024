//! The HWP recovery chain.
//!
//! Each [`HwpStrategy`] turns raw HWP bytes into a candidate text, or
//! explains why it could not. [`run_strategies`] tries them in order,
//! cleans every candidate with [`clean`], and returns the first one the
//! [`QualityGate`] accepts. Running out of strategies yields
//! [`ExtractionOutcome::Exhausted`], never an error.
//!
//! The CPU-bound strategies run on the blocking pool so a large document
//! cannot stall the async workers serving other requests.

use crate::config::ExtractionConfig;
use crate::converter::ConverterChain;
use crate::error::StrategyFailure;
use crate::hwp::{self, CompoundFileParser, LegacyParser};
use crate::messages::EXHAUSTED_MESSAGE;
use crate::output::{
    ExtractionCandidate, ExtractionFailure, ExtractionOutcome, RawDocument, StrategyKind,
};
use crate::pipeline::clean::clean;
use crate::pipeline::probe::probe;
use crate::pipeline::quality::QualityGate;
use crate::pipeline::scan::{scan_with_pass, ScanRanges};
use crate::progress::ExtractionProgressCallback;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// One way of recovering text from a legacy HWP document.
#[async_trait]
pub trait HwpStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Raw (uncleaned) candidate text, or a human-readable reason.
    async fn attempt(&self, doc: &RawDocument) -> Result<String, String>;
}

/// Run a CPU-bound closure over the document bytes on the blocking pool.
async fn blocking<F>(doc: &RawDocument, f: F) -> Result<String, String>
where
    F: FnOnce(&[u8]) -> Result<String, String> + Send + 'static,
{
    let bytes = Arc::clone(&doc.bytes);
    tokio::task::spawn_blocking(move || f(&bytes[..]))
        .await
        .map_err(|e| format!("strategy task failed: {e}"))?
}

// ── Strategy 1: structured parse + tree walk ─────────────────────────────

pub struct StructureWalkStrategy {
    parser: Arc<dyn LegacyParser>,
}

impl StructureWalkStrategy {
    pub fn new(parser: Arc<dyn LegacyParser>) -> Self {
        Self { parser }
    }
}

#[async_trait]
impl HwpStrategy for StructureWalkStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StructureWalk
    }

    async fn attempt(&self, doc: &RawDocument) -> Result<String, String> {
        let parser = Arc::clone(&self.parser);
        blocking(doc, move |bytes| {
            let parsed = parser
                .parse(bytes)
                .map_err(|e| format!("{} parser: {e}", parser.name()))?;
            let text = hwp::walk(&parsed);
            if text.is_empty() {
                Err("parsed document contains no Hangul text".to_string())
            } else {
                Ok(text)
            }
        })
        .await
    }
}

// ── Strategy 2: byte-pair scan ───────────────────────────────────────────

pub struct ByteScanStrategy {
    ranges: ScanRanges,
}

impl ByteScanStrategy {
    pub fn new(ranges: ScanRanges) -> Self {
        Self { ranges }
    }
}

#[async_trait]
impl HwpStrategy for ByteScanStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ByteScan
    }

    async fn attempt(&self, doc: &RawDocument) -> Result<String, String> {
        let ranges = self.ranges.clone();
        blocking(doc, move |bytes| match scan_with_pass(bytes, &ranges) {
            Some((pass, text)) => {
                debug!(?pass, chars = text.chars().count(), "byte scan found text");
                Ok(text)
            }
            None => Err("no Hangul byte patterns found".to_string()),
        })
        .await
    }
}

// ── Strategy 3: whole-buffer encoding probe ──────────────────────────────

pub struct EncodingProbeStrategy;

#[async_trait]
impl HwpStrategy for EncodingProbeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EncodingProbe
    }

    async fn attempt(&self, doc: &RawDocument) -> Result<String, String> {
        blocking(doc, |bytes| {
            probe(bytes).ok_or_else(|| "no decoding yields enough Hangul".to_string())
        })
        .await
    }
}

// ── Strategy 4: external converters ──────────────────────────────────────

pub struct ConverterStrategy {
    chain: ConverterChain,
}

impl ConverterStrategy {
    pub fn new(chain: ConverterChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl HwpStrategy for ConverterStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ExternalConverter
    }

    async fn attempt(&self, doc: &RawDocument) -> Result<String, String> {
        self.chain
            .try_convert(&doc.bytes, &doc.file_name)
            .await
            .map_err(|failures| {
                if failures.is_empty() {
                    return "no converters available".to_string();
                }
                failures
                    .iter()
                    .map(|f| f.reason.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
    }
}

/// The default chain: structure walk, byte scan, encoding probe and, when
/// enabled, the external converters.
pub fn default_strategies(config: &ExtractionConfig) -> Vec<Box<dyn HwpStrategy>> {
    let parser = config
        .parser
        .clone()
        .unwrap_or_else(|| Arc::new(CompoundFileParser));
    let mut strategies: Vec<Box<dyn HwpStrategy>> = vec![
        Box::new(StructureWalkStrategy::new(parser)),
        Box::new(ByteScanStrategy::new(config.scan_ranges.clone())),
        Box::new(EncodingProbeStrategy),
    ];
    if config.enable_converters {
        strategies.push(Box::new(ConverterStrategy::new(ConverterChain::from_config(config))));
    }
    strategies
}

/// Try each strategy in order; the first cleaned candidate that passes the
/// gate wins.
pub async fn run_strategies(
    strategies: &[Box<dyn HwpStrategy>],
    doc: &RawDocument,
    gate: &QualityGate,
    progress: &dyn ExtractionProgressCallback,
) -> ExtractionOutcome {
    let total = strategies.len();
    let mut reasons = Vec::with_capacity(total);

    for (index, strategy) in strategies.iter().enumerate() {
        let kind = strategy.kind();
        progress.on_strategy_start(kind, index + 1, total);

        let verdict = match strategy.attempt(doc).await {
            Ok(raw) => {
                let cleaned = clean(&raw);
                if cleaned.is_empty() {
                    Err("nothing left after garbage filtering".to_string())
                } else {
                    gate.evaluate(&cleaned).map(|score| (cleaned, score))
                }
            }
            Err(reason) => Err(reason),
        };

        match verdict {
            Ok((text, score)) => {
                info!(
                    strategy = %kind,
                    hangul = score.hangul_chars,
                    chars = score.length,
                    "HWP text recovered"
                );
                progress.on_strategy_accepted(kind, score.length);
                return ExtractionOutcome::Accepted(ExtractionCandidate {
                    text,
                    strategy: kind,
                    score,
                });
            }
            Err(reason) => {
                debug!(strategy = %kind, %reason, "strategy rejected");
                progress.on_strategy_rejected(kind, &reason);
                reasons.push(StrategyFailure::new(kind, reason));
            }
        }
    }

    info!(attempts = reasons.len(), "HWP recovery exhausted");
    ExtractionOutcome::Exhausted(ExtractionFailure {
        reasons,
        message: EXHAUSTED_MESSAGE.to_string(),
    })
}
