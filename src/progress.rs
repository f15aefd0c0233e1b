//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told
//! what the pipeline is doing. OCR of a long scan and a slow model reply are
//! the two places where a user otherwise stares at a silent terminal.
//!
//! # Example
//!
//! ```rust
//! use joypdf::{AnalysisProgressCallback, AnalysisConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for PageCounter {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {}/{}: {} chars", page_num, total_pages, chars);
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ExtractionMethod;
use std::sync::Arc;

/// Called by the pipeline as it works through a request.
///
/// Extraction events fire from a blocking worker thread, so implementations
/// must be `Send + Sync`. All methods default to no-ops.
pub trait AnalysisProgressCallback: Send + Sync {
    /// The PDF was opened.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages in the document
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// No page had a text layer; every page will be rasterised and OCR'd.
    fn on_ocr_fallback(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// One page's text was read (text layer or OCR).
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    /// * `chars`       — characters obtained from this page
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Extraction finished.
    fn on_extraction_complete(&self, method: ExtractionMethod, chars: usize) {
        let _ = (method, chars);
    }

    /// The prompt is about to be sent.
    fn on_completion_start(&self, model: &str) {
        let _ = model;
    }

    /// The model answered (`success = true`) or the call failed.
    fn on_completion_complete(&self, success: bool, duration_ms: u64) {
        let _ = (success, duration_ms);
    }

    /// The result PDF was written.
    fn on_render_complete(&self, pages: usize, bytes: usize) {
        let _ = (pages, bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
