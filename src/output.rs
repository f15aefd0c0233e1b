//! Values produced by the pipeline stages.

use crate::error::{CompletionError, ERROR_SENTINEL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suggested download name for the exported answer.
pub const DEFAULT_PDF_NAME: &str = "summary.pdf";

/// MIME type of the exported answer.
pub const PDF_MIME: &str = "application/pdf";

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// Read from the PDF's embedded text layer.
    TextLayer,
    /// Recognised from rasterised pages.
    Ocr,
}

/// Text of a whole document, pages concatenated in order and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
    pub page_count: usize,
}

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// What `--inspect` reports about a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size_bytes: usize,
    pub page_count: usize,
    /// True iff at least one page has non-whitespace embedded text.
    pub has_embedded_text: bool,
}

/// Token usage and timing of a successful completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub retries: u32,
}

/// A successful model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Reply text, trimmed.
    pub text: String,
    pub stats: CompletionStats,
}

/// Outcome of asking the model about a document.
///
/// Flow control uses the variants. [`AnalysisResult::display_text`] gives the
/// plain-text form shown to users, where a failure starts with
/// [`ERROR_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisResult {
    /// The model's answer.
    Answer(String),
    /// The call failed; the error renders as the sentinel string.
    Failed(CompletionError),
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Answer(_))
    }

    /// The answer, or the sentinel-prefixed error string.
    pub fn display_text(&self) -> String {
        match self {
            AnalysisResult::Answer(text) => text.clone(),
            AnalysisResult::Failed(e) => e.to_string(),
        }
    }

    /// Classify a plain string by its sentinel prefix.
    ///
    /// Used for text that went through a display surface (an edited text box,
    /// a file written by an earlier run) and lost its tag.
    pub fn from_text(text: impl Into<String>) -> AnalysisResult {
        let text = text.into();
        if text.starts_with(ERROR_SENTINEL) {
            let (service, detail) = split_sentinel(&text);
            AnalysisResult::Failed(CompletionError::ServiceUnavailable { service, detail })
        } else {
            AnalysisResult::Answer(text)
        }
    }

    /// Convert into a `Result`, for callers that treat failure as fatal.
    pub fn into_result(self) -> Result<String, CompletionError> {
        match self {
            AnalysisResult::Answer(text) => Ok(text),
            AnalysisResult::Failed(e) => Err(e),
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisResult::Answer(text) => f.write_str(text),
            AnalysisResult::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// Split `"[Error calling <service> API: <detail>]"` into its parts.
fn split_sentinel(text: &str) -> (String, String) {
    let body = text.strip_prefix(ERROR_SENTINEL).unwrap_or(text).trim_end();
    let body = body.strip_suffix(']').unwrap_or(body);
    match body.split_once(" API: ") {
        Some((service, detail)) => (service.to_string(), detail.to_string()),
        None => ("LLM".to_string(), body.to_string()),
    }
}

/// A PDF ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub page_count: usize,
}

impl RenderedDocument {
    pub fn mime_type(&self) -> &'static str {
        PDF_MIME
    }
}

/// Everything the eager [`crate::analyze::analyze`] entry point produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub operation: crate::prompts::Operation,
    pub extracted: ExtractedText,
    pub result: AnalysisResult,
    pub stats: Option<CompletionStats>,
}
