//! # joypdf
//!
//! Ask a hosted LLM about a PDF: summarize it, evaluate it as a resume, or
//! solve it as an assignment, then export the answer as a styled PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    local file, URL, byte buffer or stream → Document
//!  ├─ 2. Extract  text layer via pdfium; scanned PDFs go through tesseract
//!  ├─ 3. Prompt   fixed template per operation + optional user context
//!  ├─ 4. Complete one call to gemini-2.5-flash (or any edgequake-llm provider)
//!  ├─ 5. Polish   strip fences, normalise whitespace
//!  └─ 6. Render   Markdown or line-oriented layout → A4 PDF (summary.pdf)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use joypdf::{AnalysisConfig, Document, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment.
//!     let mut session = Session::new(AnalysisConfig::default());
//!     session.upload(&Document::from_path("resume.pdf")?).await?;
//!     session.set_context("Senior backend engineer, Rust and Postgres");
//!
//!     let result = session.analyze("evaluate resume").await?;
//!     println!("{}", result);
//!
//!     if result.is_success() {
//!         let pdf = session.generate_pdf().await?;
//!         std::fs::write(&pdf.file_name, &pdf.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `joypdf` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! joypdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * libpdfium, found next to the executable, in the working directory, in
//!   `PDFIUM_LIB_PATH`, or on the system library path.
//! * `tesseract` on `PATH`, only for scanned PDFs.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_bytes, analyze_sync, extract, html_to_file, inspect, render_to_file};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, OcrMode, RenderStrategy};
pub use error::{
    CompletionError, ExtractionError, JoyPdfError, PromptError, RenderError, ERROR_SENTINEL,
};
pub use output::{
    AnalysisOutput, AnalysisResult, Completion, CompletionStats, DocumentInfo, ExtractedText,
    ExtractionMethod, RenderedDocument,
};
pub use pipeline::extract::PageSource;
pub use pipeline::input::Document;
pub use pipeline::llm::CompletionService;
pub use pipeline::ocr::{OcrEngine, TesseractOcr};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{build_prompt, prepare_prompt, Operation};
pub use render::render_html;
pub use session::Session;
