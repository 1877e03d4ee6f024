//! Integration tests for the extraction pipeline.
//!
//! Fixtures are built in memory: HWP 5 compound files via `cfb` + `flate2`,
//! HWPX and DOCX archives via `zip`. The office-suite tests stand a small
//! shell script in for `soffice` and only run on Unix.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use doctext::{
    extract, extract_from_bytes, extract_hwpx, extract_to_file, DocTextError, DocumentFormat,
    ExtractionConfig, ExtractionProgressCallback, LegacyParser, ParseError, ParsedDocument,
    QualityGate, StrategyKind, EXHAUSTED_MESSAGE,
};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

// ── Fixture builders ─────────────────────────────────────────────────────────

const PARA_TEXT: u32 = 0x10 + 51;

fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// A minimal HWP 5.0.3.0 document with one compressed body section.
fn hwp5(paragraphs: &[&str]) -> Vec<u8> {
    let mut section = Vec::new();
    for p in paragraphs {
        let mut payload = utf16(p);
        payload.extend_from_slice(&13u16.to_le_bytes());
        section.extend_from_slice(&(PARA_TEXT | ((payload.len() as u32) << 20)).to_le_bytes());
        section.extend_from_slice(&payload);
    }
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&section).unwrap();
    let section = enc.finish().unwrap();

    let mut header = vec![0u8; 256];
    header[..17].copy_from_slice(b"HWP Document File");
    header[32..36].copy_from_slice(&0x0500_0300u32.to_le_bytes());
    header[36..40].copy_from_slice(&1u32.to_le_bytes());

    let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    comp.create_storage("/BodyText").unwrap();
    for (path, data) in [("/FileHeader", &header), ("/BodyText/Section0", &section)] {
        let mut stream = comp.create_stream(path).unwrap();
        stream.write_all(data).unwrap();
        stream.flush().unwrap();
    }
    comp.flush().unwrap();
    comp.into_inner().into_inner()
}

/// An HWP 3 file whose body carries no recoverable text.
fn hopeless_hwp3() -> Vec<u8> {
    let mut bytes = b"HWP Document File V3.00 \x1a\x01\x02\x03\x04\x05".to_vec();
    bytes.extend(std::iter::repeat_n(0u8, 512));
    bytes
}

fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn hwpx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<hp:p><hp:run><hp:t>{p}</hp:t></hp:run></hp:p>"))
        .collect();
    let section = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><hs:sec xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section" xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph">{body}</hs:sec>"#
    );
    zip_archive(&[
        ("mimetype", "application/hwp+zip"),
        ("Contents/section0.xml", section.as_str()),
    ])
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    zip_archive(&[
        ("[Content_Types].xml", "<Types/>"),
        ("word/document.xml", document.as_str()),
    ])
}

fn config_without_converters(work_dir: &std::path::Path) -> ExtractionConfig {
    ExtractionConfig::builder()
        .work_dir(work_dir)
        .enable_converters(false)
        .build()
        .unwrap()
}

fn is_empty_dir(path: &std::path::Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

const PROSE: &str = "이 문서는 오래된 한글 문서에서 본문을 복구하는 과정을 확인하기 위한 시험용 문단입니다.";

// ── Legacy HWP ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn hwp5_is_recovered_by_structure_walk() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());
    let bytes = hwp5(&[PROSE, "두 번째 문단도 함께 읽혀야 합니다."]);

    let output = extract_from_bytes(bytes, "report.hwp", &config).await.unwrap();

    assert!(output.is_recovered(), "unexpected failure: {:?}", output.failure);
    assert_eq!(output.format, DocumentFormat::HwpCompound);
    assert_eq!(output.strategy, Some(StrategyKind::StructureWalk));
    assert_eq!(output.stats.strategies_attempted, 1);
    assert!(output.text.contains("시험용 문단입니다"));
    assert!(output.text.contains("두 번째 문단도"));
}

#[tokio::test]
async fn hopeless_hwp_returns_explanation_with_reasons() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());

    let output = extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();

    assert!(!output.is_recovered());
    assert_eq!(output.format, DocumentFormat::Hwp);
    assert_eq!(output.text, EXHAUSTED_MESSAGE);
    assert!(output.strategy.is_none());
    let failure = output.failure.unwrap();
    let attempted: Vec<_> = failure.reasons.iter().map(|r| r.strategy).collect();
    assert_eq!(
        attempted,
        vec![
            StrategyKind::StructureWalk,
            StrategyKind::ByteScan,
            StrategyKind::EncodingProbe
        ]
    );
    assert_eq!(output.stats.strategies_attempted, 3);
}

#[tokio::test]
async fn strict_gate_rejects_what_lenient_accepts() {
    let work = tempfile::tempdir().unwrap();
    let memo = hwp5(&["짧은 메모 한 줄입니다"]);

    let lenient = ExtractionConfig::builder()
        .work_dir(work.path())
        .enable_converters(false)
        .quality_gate(QualityGate::lenient())
        .build()
        .unwrap();
    let output = extract_from_bytes(memo.clone(), "memo.hwp", &lenient).await.unwrap();
    assert!(output.is_recovered());

    let strict = ExtractionConfig::builder()
        .work_dir(work.path())
        .enable_converters(false)
        .quality_gate(QualityGate::strict())
        .build()
        .unwrap();
    let output = extract_from_bytes(memo, "memo.hwp", &strict).await.unwrap();
    assert!(!output.is_recovered());
    assert!(output.failure.unwrap().reasons[0].reason.contains("quality gate"));
}

struct FixedParser;

impl LegacyParser for FixedParser {
    fn name(&self) -> &str {
        "fixed"
    }

    fn parse(&self, _bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        Ok(ParsedDocument::Tree(serde_json::json!({
            "sections": [{ "paragraphs": [{ "text": PROSE }] }]
        })))
    }
}

#[tokio::test]
async fn injected_parser_replaces_builtin() {
    let work = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::builder()
        .work_dir(work.path())
        .enable_converters(false)
        .parser(Arc::new(FixedParser))
        .build()
        .unwrap();

    let output = extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();
    assert_eq!(output.strategy, Some(StrategyKind::StructureWalk));
    assert!(output.text.contains("시험용 문단입니다"));
}

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl ExtractionProgressCallback for Recorder {
    fn on_strategy_start(&self, strategy: StrategyKind, attempt: usize, total: usize) {
        self.0.lock().unwrap().push(format!("start {strategy} {attempt}/{total}"));
    }

    fn on_strategy_rejected(&self, strategy: StrategyKind, _reason: &str) {
        self.0.lock().unwrap().push(format!("reject {strategy}"));
    }

    fn on_extraction_complete(&self, _text_len: usize, recovered: bool) {
        self.0.lock().unwrap().push(format!("done {recovered}"));
    }
}

#[tokio::test]
async fn progress_reports_every_attempt() {
    let work = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = ExtractionConfig::builder()
        .work_dir(work.path())
        .enable_converters(false)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();

    let events = recorder.0.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start structure-walk 1/3",
            "reject structure-walk",
            "start byte-scan 2/3",
            "reject byte-scan",
            "start encoding-probe 3/3",
            "reject encoding-probe",
            "done false",
        ]
    );
}

// ── Direct formats ───────────────────────────────────────────────────────────

#[tokio::test]
async fn hwpx_sections_are_read() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());

    let text = extract_hwpx(hwpx(&["첫 문단", "둘째 문단"]), "doc.hwpx", &config)
        .await
        .unwrap();
    assert_eq!(text, "첫 문단\n둘째 문단");
}

#[tokio::test]
async fn hwpx_entry_point_rejects_other_formats() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());

    let err = extract_hwpx(docx(&["본문"]), "doc.hwpx", &config).await.unwrap_err();
    assert!(
        matches!(
            err,
            DocTextError::UnexpectedFormat {
                actual: DocumentFormat::Docx,
                ..
            }
        ),
        "got: {err}"
    );
}

#[tokio::test]
async fn docx_renamed_to_hwp_is_sniffed_by_content() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());

    let output = extract_from_bytes(docx(&["계약서 본문", "제2조"]), "contract.hwp", &config)
        .await
        .unwrap();
    assert_eq!(output.format, DocumentFormat::Docx);
    assert_eq!(output.text, "계약서 본문\n제2조");
    assert_eq!(output.stats.strategies_attempted, 0);
}

#[tokio::test]
async fn euc_kr_text_file_is_decoded() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());
    let (encoded, _, _) = encoding_rs::EUC_KR.encode("공지사항: 내일 휴무");

    let output = extract_from_bytes(encoded.into_owned(), "notice.txt", &config)
        .await
        .unwrap();
    assert_eq!(output.format, DocumentFormat::Txt);
    assert_eq!(output.text, "공지사항: 내일 휴무");
}

#[tokio::test]
async fn unknown_binary_is_unsupported() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());

    let err = extract_from_bytes(vec![0x89, b'P', b'N', b'G', 0, 0, 0, 0], "image.png", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DocTextError::UnsupportedFormat { .. }), "got: {err}");
    assert!(err.is_client_error());
}

#[tokio::test]
async fn local_file_extracts_to_output_file() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());
    let input = work.path().join("in.hwp");
    std::fs::write(&input, hwp5(&[PROSE])).unwrap();
    let out = work.path().join("nested/out.txt");

    let output = extract_to_file(input.to_str().unwrap(), &out, &config).await.unwrap();
    assert_eq!(output.file_name, "in.hwp");
    assert_eq!(std::fs::read_to_string(&out).unwrap(), output.text);
}

#[tokio::test]
async fn missing_local_file_is_an_error() {
    let work = tempfile::tempdir().unwrap();
    let config = config_without_converters(work.path());

    let err = extract(work.path().join("absent.hwp").to_str().unwrap(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DocTextError::FileNotFound { .. }), "got: {err}");
}

// ── Office-suite converter ───────────────────────────────────────────────────
//
// The script receives the converter's arguments as
// $1=-env:UserInstallation=… $2=--headless $3=--convert-to $4=<ext>
// $5=--outdir $6=<outdir> $7=<input>.

#[cfg(unix)]
fn fake_office(script: &str, work_dir: &std::path::Path, timeout_secs: u64) -> ExtractionConfig {
    ExtractionConfig::builder()
        .work_dir(work_dir)
        .office_command(["sh", "-c", script, "sh"])
        .converter_timeout_secs(timeout_secs)
        .build()
        .unwrap()
}

#[cfg(unix)]
#[tokio::test]
async fn office_converter_recovers_when_builtin_strategies_fail() {
    let work = tempfile::tempdir().unwrap();
    let script = format!(
        r#"stem=$(basename "$7"); printf '%s' '{PROSE}' > "$6/${{stem%.*}}.$4""#
    );
    let config = fake_office(&script, work.path(), 10);

    let output = extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();

    assert!(output.is_recovered(), "unexpected failure: {:?}", output.failure);
    assert_eq!(output.strategy, Some(StrategyKind::ExternalConverter));
    assert_eq!(output.stats.strategies_attempted, 4);
    assert!(output.text.contains("시험용 문단입니다"));
    assert!(is_empty_dir(work.path()), "scratch files left behind");
}

#[cfg(unix)]
#[tokio::test]
async fn office_converter_keeps_dotted_file_names() {
    let work = tempfile::tempdir().unwrap();
    let script = format!(
        r#"stem=$(basename "$7"); printf '%s' '{PROSE}' > "$6/${{stem%.*}}.$4""#
    );
    let config = fake_office(&script, work.path(), 10);

    let output = extract_from_bytes(hopeless_hwp3(), "공문_2024.05.10.hwp", &config)
        .await
        .unwrap();

    assert!(output.is_recovered(), "unexpected failure: {:?}", output.failure);
    assert_eq!(output.strategy, Some(StrategyKind::ExternalConverter));
    assert!(output.text.contains("시험용 문단입니다"));
    assert!(is_empty_dir(work.path()), "scratch files left behind");
}

#[cfg(unix)]
#[tokio::test]
async fn office_converter_without_output_is_a_failure() {
    let work = tempfile::tempdir().unwrap();
    let config = fake_office("exit 0", work.path(), 10);

    let output = extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();

    assert_eq!(output.text, EXHAUSTED_MESSAGE);
    let failure = output.failure.unwrap();
    let converter = failure.reasons.last().unwrap();
    assert_eq!(converter.strategy, StrategyKind::ExternalConverter);
    assert!(converter.reason.contains("office: converter produced no output"), "{}", converter.reason);
    assert!(converter.reason.contains("cloud: not configured"));
    assert!(converter.reason.contains("vendor: not configured"));
    assert!(is_empty_dir(work.path()));
}

#[cfg(unix)]
#[tokio::test]
async fn hanging_office_suite_is_timed_out_and_cleaned_up() {
    let work = tempfile::tempdir().unwrap();
    let config = fake_office("sleep 30", work.path(), 1);

    let started = std::time::Instant::now();
    let output = extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    let failure = output.failure.unwrap();
    assert!(failure.reasons.last().unwrap().reason.contains("office: timed out after 1s"));
    assert!(is_empty_dir(work.path()));
}

#[cfg(unix)]
#[tokio::test]
async fn missing_office_binary_is_reported() {
    let work = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::builder()
        .work_dir(work.path())
        .office_command(["doctext-no-such-office-binary"])
        .build()
        .unwrap();

    let output = extract_from_bytes(hopeless_hwp3(), "old.hwp", &config).await.unwrap();
    let failure = output.failure.unwrap();
    let reason = &failure.reasons.last().unwrap().reason;
    assert!(reason.contains("not installed"), "{reason}");
}
