//! Pipeline stages for text extraction.
//!
//! Each submodule implements exactly one step; the orchestrator in
//! [`crate::extract`] wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ sniff ──┬─▶ formats::extract_direct ──────────────────────────▶ text
//! (path/URL) (magic) │   (PDF, DOCX, XLSX, HWPX, TXT/CSV)
//!                    │
//!                    └─▶ strategy chain ──▶ clean ──▶ quality gate ──▶ text
//!                        (HWP 3 / HWP 5)    (filter)   (accept?)   or explanation
//! ```
//!
//! 1. [`input`]   : canonicalise the user-supplied path or URL to a local file
//! 2. [`sniff`]   : magic bytes, ZIP entry names, then file extension
//! 3. [`strategy`]: ordered HWP recovery attempts:
//!    structure walk, [`scan`] (legacy byte pairs), [`probe`] (modern
//!    encodings), then external converters
//! 4. [`clean`]   : garbage filter and sentence reconstruction applied to
//!    every candidate
//! 5. [`quality`] : accept or reject a cleaned candidate

pub mod clean;
pub mod input;
pub mod probe;
pub mod quality;
pub mod scan;
pub mod sniff;
pub mod strategy;
