//! Progress-callback trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to observe
//! the HWP strategy chain as it runs: which strategy is being tried, why a
//! candidate was rejected, and which one finally produced text.
//!
//! # Example
//!
//! ```rust
//! use doctext::{ExtractionConfig, ExtractionProgressCallback, StrategyKind};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl ExtractionProgressCallback for Logger {
//!     fn on_strategy_rejected(&self, strategy: StrategyKind, reason: &str) {
//!         eprintln!("{strategy} rejected: {reason}");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(Logger))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{DocumentFormat, StrategyKind};
use std::sync::Arc;

/// Called by the orchestrator as an extraction proceeds.
///
/// Strategies run strictly one after another, so calls never overlap for a
/// single extraction. A callback shared across concurrent requests (e.g. by
/// the HTTP server) must still synchronise its own state. All methods have
/// default no-op implementations.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once the input has been read and its format sniffed.
    fn on_extraction_start(&self, file_name: &str, format: DocumentFormat) {
        let _ = (file_name, format);
    }

    /// Called before each HWP recovery strategy.
    ///
    /// # Arguments
    /// * `attempt`: 1-indexed position in the chain
    /// * `total`  : number of strategies in the chain
    fn on_strategy_start(&self, strategy: StrategyKind, attempt: usize, total: usize) {
        let _ = (strategy, attempt, total);
    }

    /// Called when a strategy failed or its output did not pass the quality gate.
    fn on_strategy_rejected(&self, strategy: StrategyKind, reason: &str) {
        let _ = (strategy, reason);
    }

    /// Called when a strategy's cleaned output passed the quality gate.
    fn on_strategy_accepted(&self, strategy: StrategyKind, text_len: usize) {
        let _ = (strategy, text_len);
    }

    /// Called once at the end of a successful extraction.
    ///
    /// `recovered` is `false` when HWP recovery was exhausted and the text is
    /// the explanatory message.
    fn on_extraction_complete(&self, text_len: usize, recovered: bool) {
        let _ = (text_len, recovered);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for Recorder {
        fn on_strategy_start(&self, strategy: StrategyKind, attempt: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {strategy} {attempt}/{total}"));
        }

        fn on_strategy_rejected(&self, strategy: StrategyKind, _reason: &str) {
            self.events.lock().unwrap().push(format!("reject {strategy}"));
        }

        fn on_strategy_accepted(&self, strategy: StrategyKind, _text_len: usize) {
            self.events.lock().unwrap().push(format!("accept {strategy}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start("a.hwp", DocumentFormat::HwpCompound);
        cb.on_strategy_start(StrategyKind::StructureWalk, 1, 4);
        cb.on_strategy_rejected(StrategyKind::StructureWalk, "encrypted");
        cb.on_strategy_accepted(StrategyKind::ByteScan, 120);
        cb.on_extraction_complete(120, true);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let recorder = Recorder::default();
        recorder.on_strategy_start(StrategyKind::StructureWalk, 1, 2);
        recorder.on_strategy_rejected(StrategyKind::StructureWalk, "no text");
        recorder.on_strategy_start(StrategyKind::ByteScan, 2, 2);
        recorder.on_strategy_accepted(StrategyKind::ByteScan, 64);
        // Unimplemented hooks fall back to the defaults.
        recorder.on_extraction_complete(64, true);

        let events = recorder.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start structure-walk 1/2",
                "reject structure-walk",
                "start byte-scan 2/2",
                "accept byte-scan",
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start("b.pdf", DocumentFormat::Pdf);
        cb.on_extraction_complete(10, true);
    }
}
