//! Pipeline stages for document analysis.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (prompts) ──▶ llm ──▶ postprocess
//! (path/URL)  (pdfium + ocr)          (LLM)    (cleanup)
//! ```
//!
//! 1. [`input`]   — read a path, URL, buffer or stream into a [`input::Document`]
//! 2. [`engine`]  — bind libpdfium and open documents from memory
//! 3. [`extract`] — probe for a text layer; read it, or rasterise and run [`ocr`]
//! 4. [`encode`]  — PNG-encode rasterised pages for the OCR engine
//! 5. [`llm`]     — one prompt to one reply, with retry/backoff and a timeout
//! 6. [`postprocess`] — deterministic cleanup of the reply
//!
//! Turning the reply into a PDF lives in [`crate::render`].

pub mod encode;
pub mod engine;
pub mod extract;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
