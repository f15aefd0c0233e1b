//! Error types for the joypdf library.
//!
//! Each pipeline stage owns a small error enum so callers can branch on the
//! stage that failed:
//!
//! * [`ExtractionError`] — the PDF could not be turned into text.
//! * [`PromptError`] — no prompt could be built (empty text, unknown operation).
//! * [`CompletionError`] — the hosted model could not be reached or timed out.
//!   It is carried inside [`crate::output::AnalysisResult::Failed`] rather than
//!   returned as `Err`, so a failed analysis is still something the session can
//!   display.
//! * [`RenderError`] — the answer could not be written as a PDF.
//!
//! [`JoyPdfError`] is the fatal, top-level error returned by the entry points.
//! It wraps the stage errors and adds input, configuration and I/O failures.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix of the display string of every failed completion.
///
/// Consumers that only see plain text detect failure with a prefix check.
pub const ERROR_SENTINEL: &str = "[Error calling ";

/// All fatal errors returned by the joypdf library.
#[derive(Debug, Error)]
pub enum JoyPdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Session errors ────────────────────────────────────────────────────
    /// An analysis was requested before any document was uploaded.
    #[error("Please upload a PDF file before analyzing.")]
    NoDocument,

    /// PDF generation was requested with an empty result text.
    #[error("Nothing to render: the result text is empty.")]
    NothingToRender,

    // ── Stage errors ──────────────────────────────────────────────────────
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    // ── LLM configuration ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium (https://github.com/bblanchon/pdfium-binaries/releases) and either:\n\
  • place it next to the executable or in the working directory, or\n\
  • set PDFIUM_LIB_PATH to the directory that contains it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The uploaded document could not be turned into text.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// Not a PDF, or the PDF structure is corrupt.
    #[error("Invalid or corrupted PDF file: {detail}")]
    InvalidDocument { detail: String },

    /// The PDF is encrypted and the password is missing or wrong.
    #[error("PDF is encrypted; provide the correct password with --password")]
    PasswordRequired,

    /// OCR was needed but failed (or is disabled).
    #[error("Can not process OCR PDFs: page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },
}

/// No prompt could be produced for the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// The extracted text is empty.
    #[error("The document contains no text to analyze.")]
    EmptyInput,

    /// The operation label is not one of the known operations.
    #[error("please choose a valid operation! (got '{label}')")]
    UnknownOperation { label: String },
}

/// The hosted model could not produce an answer.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompletionError {
    /// Transport or service failure after all retries.
    #[error("{sentinel}{service} API: {detail}]", sentinel = ERROR_SENTINEL)]
    ServiceUnavailable { service: String, detail: String },

    /// The call did not finish within the configured timeout.
    #[error("{sentinel}{service} API: timed out after {secs}s]", sentinel = ERROR_SENTINEL)]
    Timeout { service: String, secs: u64 },
}

/// The result text could not be turned into a PDF.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Failed to generate PDF: {detail}")]
    ConversionFailed { detail: String },
}

impl RenderError {
    pub(crate) fn conversion(detail: impl std::fmt::Display) -> Self {
        RenderError::ConversionFailed {
            detail: detail.to_string(),
        }
    }
}
