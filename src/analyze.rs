//! One-shot entry points over a [`Session`].
//!
//! These cover the common "one file, one question" use without managing a
//! session by hand: resolve the input, extract, ask, and optionally write
//! the answer out as PDF or HTML.

use crate::config::AnalysisConfig;
use crate::error::JoyPdfError;
use crate::output::{AnalysisOutput, DocumentInfo, ExtractedText, RenderedDocument};
use crate::pipeline::extract::{extract_document, inspect_document};
use crate::pipeline::input::{resolve_input, Document};
use crate::prompts::Operation;
use crate::render;
use crate::session::Session;
use std::path::Path;
use tracing::info;

/// Extract the text of a PDF file or URL.
pub async fn extract(
    input: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<ExtractedText, JoyPdfError> {
    let document = resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    extract_document(&document, config).await
}

/// Extract a PDF and run one operation over it.
///
/// # Arguments
/// * `input` — local file path or HTTP/HTTPS URL to a PDF
/// * `operation` — operation label, e.g. `"summarize pdf"` or `"evaluate-resume"`
/// * `context` — optional extra context appended to the prompt
///
/// # Returns
/// `Ok(AnalysisOutput)` once the model was asked, even if the call failed
/// (check `output.result.is_success()`).
///
/// # Errors
/// Returns `Err(JoyPdfError)` only when no request could be made:
/// - File not found / download failed / not a PDF
/// - Extraction or OCR failed
/// - Unknown operation or empty document
/// - No completion service configured
pub async fn analyze(
    input: impl AsRef<str>,
    operation: &str,
    context: Option<&str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, JoyPdfError> {
    let input = input.as_ref();
    info!("Starting analysis: {}", input);
    Operation::from_label(operation)?;

    let document = resolve_input(input, config.download_timeout_secs).await?;
    analyze_document(&document, operation, context, config).await
}

/// Like [`analyze`], for a document already in memory.
pub async fn analyze_document(
    document: &Document,
    operation: &str,
    context: Option<&str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, JoyPdfError> {
    // Reject a bad label before paying for extraction and OCR.
    Operation::from_label(operation)?;

    let mut session = Session::new(config.clone());
    session.upload(document).await?;
    if let Some(ctx) = context {
        session.set_context(ctx);
    }
    session.analyze(operation).await?;
    into_output(session)
}

/// Like [`analyze`], for raw PDF bytes (e.g. an HTTP upload body).
pub async fn analyze_bytes(
    bytes: Vec<u8>,
    operation: &str,
    context: Option<&str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, JoyPdfError> {
    Operation::from_label(operation)?;
    let document = Document::from_bytes("upload.pdf", bytes)?;
    analyze_document(&document, operation, context, config).await
}

fn into_output(session: Session) -> Result<AnalysisOutput, JoyPdfError> {
    match (
        session.last_operation(),
        session.extracted(),
        session.last_result(),
    ) {
        (Some(operation), Some(extracted), Some(result)) => Ok(AnalysisOutput {
            operation,
            extracted: extracted.clone(),
            result: result.clone(),
            stats: session.last_stats().cloned(),
        }),
        _ => Err(JoyPdfError::Internal(
            "analysis finished without a result".to_string(),
        )),
    }
}

/// Blocking wrapper around [`analyze`] for non-async callers.
pub fn analyze_sync(
    input: impl AsRef<str>,
    operation: &str,
    context: Option<&str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, JoyPdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| JoyPdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(input, operation, context, config))
}

/// Page count and text-layer probe of a PDF file or URL.
pub async fn inspect(
    input: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<DocumentInfo, JoyPdfError> {
    let document = resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    inspect_document(&document, config).await
}

/// Render `text` as a PDF and write it to `output_path`.
///
/// The file only appears once it is complete: bytes go to a sibling temp
/// file that is renamed into place. On any failure nothing is written.
pub async fn render_to_file(
    text: &str,
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<RenderedDocument, JoyPdfError> {
    let rendered = render::render_pdf(text, config).await?;
    write_atomic(output_path.as_ref(), &rendered.bytes).await?;
    Ok(rendered)
}

/// Write the HTML export of `text` to `output_path`.
pub async fn html_to_file(text: &str, output_path: impl AsRef<Path>) -> Result<(), JoyPdfError> {
    if text.trim().is_empty() {
        return Err(JoyPdfError::NothingToRender);
    }
    let html = render::render_html(text);
    write_atomic(output_path.as_ref(), html.as_bytes()).await
}

/// Write to a temp file next to `path`, then rename over it.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), JoyPdfError> {
    let write_err = |e: std::io::Error| JoyPdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}
