//! Optical character recognition of rasterised pages.
//!
//! [`OcrEngine`] takes one page as PNG bytes and returns its text. The
//! production engine, [`TesseractOcr`], shells out to the `tesseract` CLI:
//! the PNG is written into a scratch directory that is removed when the call
//! returns, and the recognised text is read from stdout.

use crate::error::ExtractionError;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Recognise the text of a single page image.
pub trait OcrEngine: Send + Sync {
    /// `page_num` is 1-indexed and only used for error reporting.
    fn recognize(&self, page_num: usize, png: &[u8]) -> Result<String, ExtractionError>;
}

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    bin: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(bin: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            language: language.into(),
        }
    }

    fn failed(page_num: usize, detail: impl Into<String>) -> ExtractionError {
        ExtractionError::OcrFailed {
            page: page_num,
            detail: detail.into(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, page_num: usize, png: &[u8]) -> Result<String, ExtractionError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| Self::failed(page_num, format!("cannot create temp dir: {}", e)))?;
        let image_path = scratch.path().join(format!("page-{:04}.png", page_num));
        std::fs::write(&image_path, png)
            .map_err(|e| Self::failed(page_num, format!("cannot write page image: {}", e)))?;

        let output = Command::new(&self.bin)
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                Self::failed(
                    page_num,
                    format!("failed to run '{}': {}", self.bin.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("tesseract failed on page {}: {}", page_num, stderr.trim());
            return Err(Self::failed(
                page_num,
                format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("OCR page {}: {} chars", page_num, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_reported_as_ocr_failure() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract-joypdf", "eng");
        let err = ocr.recognize(3, b"\x89PNG").unwrap_err();
        match err {
            ExtractionError::OcrFailed { page, detail } => {
                assert_eq!(page, 3);
                assert!(detail.contains("failed to run"), "got: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_uses_english() {
        let ocr = TesseractOcr::default();
        assert_eq!(ocr.language, "eng");
        assert_eq!(ocr.bin, PathBuf::from("tesseract"));
    }
}
