//! End-to-end integration tests for joypdf.
//!
//! These tests bind a real libpdfium, may shell out to tesseract and make
//! live LLM API calls. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested. Fixture
//! PDFs are produced by the renderer itself, so no files need downloading.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture
//!
//! The live API test additionally needs `GEMINI_API_KEY`; the OCR test needs
//! `tesseract` on `PATH`.

use joypdf::pipeline::engine::bind_pdfium;
use joypdf::{
    analyze, extract, inspect, render_to_file, AnalysisConfig, Document, ExtractionError,
    ExtractionMethod, JoyPdfError, OcrMode, RenderStrategy, Session,
};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
    (tesseract) => {{
        e2e_skip_unless_ready!();
        if std::process::Command::new("tesseract")
            .arg("--version")
            .output()
            .is_err()
        {
            println!("SKIP — tesseract not found on PATH");
            return;
        }
    }};
    (api) => {{
        e2e_skip_unless_ready!();
        if std::env::var("GEMINI_API_KEY").is_err() {
            println!("SKIP — GEMINI_API_KEY is not set");
            return;
        }
    }};
}

const REPORT: &str = "# Quarterly Report\n\n\
Revenue grew **twelve percent** compared to the previous quarter.\n\n\
## Highlights\n\n\
- Opened a second warehouse in Lyon\n\
- Hired *fourteen* engineers\n\n\
## Risks\n\n\
1. Currency exposure\n\
2. Supplier concentration\n";

/// pdfium keeps process-global state; one test at a time talks to it.
static PDFIUM_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

fn work_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

async fn render_fixture(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    render_to_file(text, &path, &AnalysisConfig::default())
        .await
        .expect("render_to_file() should succeed");
    path
}

/// Rasterise every page of `source` and write an image-only copy to `dest`.
fn write_scanned_copy(source: &Path, dest: &Path) {
    let pdfium = bind_pdfium(None).expect("bind pdfium");
    let original = pdfium
        .load_pdf_from_file(source, None)
        .expect("load rendered fixture");
    let mut scan = pdfium.create_new_pdf().expect("new pdf");

    for page in original.pages().iter() {
        let (w, h) = (page.width(), page.height());
        let image = page
            .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(300.0 / 72.0))
            .expect("render page")
            .as_image();

        let mut out = scan
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(w, h))
            .expect("create page");
        out.objects_mut()
            .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, &image, Some(w), Some(h))
            .expect("place image");
    }

    scan.save_to_file(dest).expect("save scan");
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("utf-8 path")
}

// ── Render → extract round-trip (pdfium only) ────────────────────────────────

#[tokio::test]
async fn test_rendered_report_reads_back() {
    e2e_skip_unless_ready!();
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let pdf = render_fixture(dir.path(), "report.pdf", REPORT).await;

    let text = extract(path_str(&pdf), &AnalysisConfig::default())
        .await
        .expect("extract() should succeed");

    assert_eq!(text.method, ExtractionMethod::TextLayer);
    assert_eq!(text.page_count, 1);
    for needle in ["Quarterly Report", "twelve percent", "Lyon", "Supplier concentration"] {
        assert!(text.text.contains(needle), "missing {needle:?} in {:?}", text.text);
    }
    // Markdown markers are styling, not content.
    assert!(!text.text.contains("**"));
    assert!(!text.text.contains("## "));
}

#[tokio::test]
async fn test_line_strategy_keeps_one_paragraph_per_line() {
    e2e_skip_unless_ready!();
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let config = AnalysisConfig::builder()
        .render_strategy(RenderStrategy::LineOriented)
        .build()
        .unwrap();
    let pdf = dir.path().join("lines.pdf");
    render_to_file("**Verdict**\nHire, with *strong* systems skills.\n", &pdf, &config)
        .await
        .unwrap();

    let text = extract(path_str(&pdf), &config).await.unwrap();
    assert!(text.text.contains("Verdict"));
    assert!(text.text.contains("strong"));
    assert!(text.text.contains("systems skills"));
    assert!(!text.text.contains('*'));
}

#[tokio::test]
async fn test_long_answer_spans_several_pages() {
    e2e_skip_unless_ready!();
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let long: String = (1..=120)
        .map(|i| format!("Paragraph {i}: the committee reviewed the budget line by line.\n\n"))
        .collect();
    let pdf = render_fixture(dir.path(), "long.pdf", &long).await;

    let info = inspect(path_str(&pdf), &AnalysisConfig::default())
        .await
        .expect("inspect() should succeed");
    assert!(info.page_count > 1, "expected pagination, got {info:?}");
    assert!(info.has_embedded_text);

    let text = extract(path_str(&pdf), &AnalysisConfig::default())
        .await
        .unwrap();
    assert!(text.text.contains("Paragraph 1:"));
    assert!(text.text.contains("Paragraph 120:"));
    assert_eq!(text.page_count, info.page_count);
}

#[tokio::test]
async fn test_session_upload_from_bytes() {
    e2e_skip_unless_ready!();
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let pdf = render_fixture(dir.path(), "report.pdf", REPORT).await;

    let document = Document::from_bytes("report.pdf", std::fs::read(&pdf).unwrap()).unwrap();
    let mut session = Session::new(AnalysisConfig::default());
    let extracted = session.upload(&document).await.unwrap();

    assert!(extracted.text.contains("Quarterly Report"));
    assert_eq!(session.document_name(), Some("report.pdf"));
}

// ── Scanned documents ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scanned_pdf_goes_through_ocr() {
    e2e_skip_unless_ready!(tesseract);
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let pdf = render_fixture(dir.path(), "report.pdf", REPORT).await;
    let scan = dir.path().join("scan.pdf");
    write_scanned_copy(&pdf, &scan);

    let info = inspect(path_str(&scan), &AnalysisConfig::default())
        .await
        .unwrap();
    assert!(!info.has_embedded_text);

    let text = extract(path_str(&scan), &AnalysisConfig::default())
        .await
        .expect("OCR extraction should succeed");

    assert_eq!(text.method, ExtractionMethod::Ocr);
    assert!(
        text.text.contains("Quarterly") || text.text.contains("Revenue"),
        "OCR text looks wrong: {:?}",
        text.text
    );
}

#[tokio::test]
async fn test_scanned_pdf_with_ocr_disabled_fails() {
    e2e_skip_unless_ready!();
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let pdf = render_fixture(dir.path(), "report.pdf", REPORT).await;
    let scan = dir.path().join("scan.pdf");
    write_scanned_copy(&pdf, &scan);

    let config = AnalysisConfig::builder()
        .ocr_mode(OcrMode::Disabled)
        .build()
        .unwrap();
    let err = extract(path_str(&scan), &config).await.unwrap_err();

    assert!(
        matches!(err, JoyPdfError::Extraction(ExtractionError::OcrFailed { .. })),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_missing_tesseract_is_reported() {
    e2e_skip_unless_ready!();
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let pdf = render_fixture(dir.path(), "report.pdf", REPORT).await;
    let scan = dir.path().join("scan.pdf");
    write_scanned_copy(&pdf, &scan);

    let config = AnalysisConfig::builder()
        .tesseract_bin("/nonexistent/tesseract")
        .build()
        .unwrap();
    let err = extract(path_str(&scan), &config).await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Can not process OCR PDFs"), "got {msg}");
}

// ── Live API ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_summarize_live() {
    e2e_skip_unless_ready!(api);
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let pdf = render_fixture(dir.path(), "report.pdf", REPORT).await;

    let output = analyze(path_str(&pdf), "summarize pdf", None, &AnalysisConfig::default())
        .await
        .expect("analyze() should reach the model");

    let answer = output
        .result
        .into_result()
        .expect("the model should answer");
    assert!(!answer.trim().is_empty());
    assert!(!answer.starts_with("```markdown"));
    println!("Summary:\n{answer}");

    let out = dir.path().join("summary.pdf");
    let rendered = render_to_file(&answer, &out, &AnalysisConfig::default())
        .await
        .unwrap();
    assert!(rendered.page_count >= 1);
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_evaluate_resume_live_with_context() {
    e2e_skip_unless_ready!(api);
    let _pdfium = PDFIUM_LOCK.lock().await;
    let dir = work_dir();
    let resume = "# Ada Example\n\nBackend engineer, 8 years.\n\n\
                  - Rust, Tokio, PostgreSQL\n- Led migration of billing to event sourcing\n";
    let pdf = render_fixture(dir.path(), "cv.pdf", resume).await;

    let output = analyze(
        path_str(&pdf),
        "evaluate resume",
        Some("Senior Rust engineer for a payments team"),
        &AnalysisConfig::default(),
    )
    .await
    .unwrap();

    assert!(output.result.is_success(), "{}", output.result);
    assert!(output.stats.is_some());
}

// ── Input handling (no pdfium needed) ────────────────────────────────────────

#[tokio::test]
async fn test_missing_file_is_reported() {
    let err = extract("/definitely/not/here.pdf", &AnalysisConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, JoyPdfError::FileNotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn test_non_pdf_is_rejected_before_pdfium() {
    let dir = work_dir();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just some text").unwrap();

    let err = extract(path_str(&path), &AnalysisConfig::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, JoyPdfError::Extraction(ExtractionError::InvalidDocument { .. })),
        "{err:?}"
    );
}
