//! Text extraction: text layer when present, OCR otherwise.
//!
//! ```text
//! Document ──▶ probe ──┬─ any page has text ──▶ concatenate text layer
//!                      └─ no page has text ──▶ rasterise → OCR, page by page
//! ```
//!
//! A document takes exactly one of the two paths. The probe and both paths
//! work through [`PageSource`], so the decision logic is tested with an
//! in-memory source and the pdfium-backed [`PdfiumSource`] stays a thin
//! adapter.

use crate::config::{AnalysisConfig, OcrMode};
use crate::error::{ExtractionError, JoyPdfError};
use crate::output::{DocumentInfo, ExtractedText, ExtractionMethod};
use crate::pipeline::encode::encode_png;
use crate::pipeline::engine::{bind_pdfium, load_document};
use crate::pipeline::input::Document;
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Page-level access to a loaded PDF.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Embedded text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String, ExtractionError>;

    /// The page at `index` rendered at `dpi` and encoded as PNG.
    fn rasterize(&self, index: usize, dpi: u32) -> Result<Vec<u8>, ExtractionError>;
}

/// Options of one extraction pass.
pub struct ExtractOptions<'a> {
    pub ocr_mode: OcrMode,
    pub ocr_dpi: u32,
    pub progress: Option<&'a ProgressCallback>,
}

impl Default for ExtractOptions<'_> {
    fn default() -> Self {
        Self {
            ocr_mode: OcrMode::Auto,
            ocr_dpi: 300,
            progress: None,
        }
    }
}

/// True iff at least one page has non-whitespace embedded text.
pub fn has_embedded_text(source: &dyn PageSource) -> Result<bool, ExtractionError> {
    for index in 0..source.page_count() {
        if !source.page_text(index)?.trim().is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Probe `source` and extract its text through the matching path.
pub fn extract_from_source(
    source: &dyn PageSource,
    ocr: &dyn OcrEngine,
    options: &ExtractOptions<'_>,
) -> Result<ExtractedText, ExtractionError> {
    let total = source.page_count();
    if let Some(cb) = options.progress {
        cb.on_extraction_start(total);
    }

    // A document without pages has nothing to OCR either.
    let extracted = if total == 0 || has_embedded_text(source)? {
        read_text_layer(source, options)?
    } else {
        match options.ocr_mode {
            OcrMode::Disabled => {
                return Err(ExtractionError::OcrFailed {
                    page: 1,
                    detail: "document has no extractable text layer and OCR is disabled"
                        .to_string(),
                })
            }
            OcrMode::Auto => {
                info!("No text layer found; running OCR on {} pages", total);
                if let Some(cb) = options.progress {
                    cb.on_ocr_fallback(total);
                }
                read_with_ocr(source, ocr, options)?
            }
        }
    };

    if let Some(cb) = options.progress {
        cb.on_extraction_complete(extracted.method, extracted.text.len());
    }
    Ok(extracted)
}

fn read_text_layer(
    source: &dyn PageSource,
    options: &ExtractOptions<'_>,
) -> Result<ExtractedText, ExtractionError> {
    let total = source.page_count();
    let mut all = String::new();

    for index in 0..total {
        let text = source.page_text(index)?;
        all.push_str(&text);
        // pdfium page text carries no trailing break; keep pages apart.
        if !text.is_empty() && !text.ends_with('\n') {
            all.push('\n');
        }
        if let Some(cb) = options.progress {
            cb.on_page_extracted(index + 1, total, text.len());
        }
    }

    Ok(ExtractedText {
        text: all.trim().to_string(),
        method: ExtractionMethod::TextLayer,
        page_count: total,
    })
}

fn read_with_ocr(
    source: &dyn PageSource,
    ocr: &dyn OcrEngine,
    options: &ExtractOptions<'_>,
) -> Result<ExtractedText, ExtractionError> {
    let total = source.page_count();
    let mut all = String::new();

    for index in 0..total {
        let page_num = index + 1;
        let png = source.rasterize(index, options.ocr_dpi)?;
        let text = ocr.recognize(page_num, &png)?;
        all.push_str(&text);
        all.push('\n');
        if let Some(cb) = options.progress {
            cb.on_page_extracted(page_num, total, text.len());
        }
    }

    Ok(ExtractedText {
        text: all.trim().to_string(),
        method: ExtractionMethod::Ocr,
        page_count: total,
    })
}

// ── pdfium adapter ───────────────────────────────────────────────────────────

/// [`PageSource`] over a document opened with pdfium.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    pub fn new(document: PdfDocument<'a>) -> Self {
        Self { document }
    }

    fn page(&self, index: usize) -> Result<PdfPage<'a>, ExtractionError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| ExtractionError::InvalidDocument {
                detail: format!("page {}: {:?}", index + 1, e),
            })
    }
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractionError> {
        let page = self.page(index)?;
        let text = page.text().map_err(|e| ExtractionError::InvalidDocument {
            detail: format!("page {}: cannot read text: {:?}", index + 1, e),
        })?;
        Ok(text.all())
    }

    fn rasterize(&self, index: usize, dpi: u32) -> Result<Vec<u8>, ExtractionError> {
        let page_num = index + 1;
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

        let image = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractionError::OcrFailed {
                page: page_num,
                detail: format!("rasterisation failed: {:?}", e),
            })?
            .as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        encode_png(&image).map_err(|e| ExtractionError::OcrFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {}", e),
        })
    }
}

// ── async entry points ───────────────────────────────────────────────────────

/// Settings moved into the blocking worker.
struct BlockingJob {
    bytes: Vec<u8>,
    password: Option<String>,
    pdfium_lib_path: Option<PathBuf>,
    ocr_mode: OcrMode,
    ocr_dpi: u32,
    ocr: Arc<dyn OcrEngine>,
    progress: Option<ProgressCallback>,
}

impl BlockingJob {
    fn new(document: &Document, config: &AnalysisConfig) -> Self {
        let ocr = config.ocr_engine.clone().unwrap_or_else(|| {
            Arc::new(TesseractOcr::new(
                config.tesseract_bin.clone(),
                config.ocr_language.clone(),
            ))
        });
        Self {
            bytes: document.bytes().to_vec(),
            password: config.password.clone(),
            pdfium_lib_path: config.pdfium_lib_path.clone(),
            ocr_mode: config.ocr_mode,
            ocr_dpi: config.ocr_dpi,
            ocr,
            progress: config.progress_callback.clone(),
        }
    }
}

/// Extract the text of `document`.
///
/// Runs inside `spawn_blocking` since pdfium and tesseract both block.
pub async fn extract_document(
    document: &Document,
    config: &AnalysisConfig,
) -> Result<ExtractedText, JoyPdfError> {
    let job = BlockingJob::new(document, config);
    info!("Extracting text from {}", document.name());

    tokio::task::spawn_blocking(move || extract_blocking(job))
        .await
        .map_err(|e| JoyPdfError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_blocking(job: BlockingJob) -> Result<ExtractedText, JoyPdfError> {
    let pdfium = bind_pdfium(job.pdfium_lib_path.as_deref())?;
    let document = load_document(&pdfium, &job.bytes, job.password.as_deref())?;
    let source = PdfiumSource::new(document);

    let options = ExtractOptions {
        ocr_mode: job.ocr_mode,
        ocr_dpi: job.ocr_dpi,
        progress: job.progress.as_ref(),
    };
    Ok(extract_from_source(&source, job.ocr.as_ref(), &options)?)
}

/// Page count and text-layer probe, without extracting anything.
pub async fn inspect_document(
    document: &Document,
    config: &AnalysisConfig,
) -> Result<DocumentInfo, JoyPdfError> {
    let name = document.name().to_string();
    let size_bytes = document.len();
    let job = BlockingJob::new(document, config);

    tokio::task::spawn_blocking(move || -> Result<DocumentInfo, JoyPdfError> {
        let pdfium = bind_pdfium(job.pdfium_lib_path.as_deref())?;
        let doc = load_document(&pdfium, &job.bytes, job.password.as_deref())?;
        let source = PdfiumSource::new(doc);
        Ok(DocumentInfo {
            name,
            size_bytes,
            page_count: source.page_count(),
            has_embedded_text: has_embedded_text(&source)?,
        })
    })
    .await
    .map_err(|e| JoyPdfError::Internal(format!("Inspect task panicked: {}", e)))?
}
