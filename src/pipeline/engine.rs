//! Binding to the pdfium shared library.
//!
//! Lookup order:
//! 1. the configured directory (`AnalysisConfig::pdfium_lib_path`)
//! 2. `$PDFIUM_LIB_PATH`
//! 3. the directory of the running executable
//! 4. the working directory
//! 5. the system library search path
//!
//! The location that worked is cached for the rest of the process.

use crate::error::{ExtractionError, JoyPdfError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Environment variable naming a directory that contains libpdfium.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Library that bound first in this process; `None` means the system library.
static RESOLVED_LIBRARY: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Bind to pdfium, trying each candidate directory before the system library.
///
/// The first successful location is remembered, so later calls without an
/// explicit `lib_dir` skip the search.
pub fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, JoyPdfError> {
    if lib_dir.is_none() {
        if let Some(resolved) = RESOLVED_LIBRARY.get() {
            return bind_resolved(resolved.as_deref());
        }
    }

    let mut last_err = String::from("no candidate directory");

    for dir in candidate_dirs(lib_dir) {
        let lib = Pdfium::pdfium_platform_library_name_at_path(&dir);
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", lib.display());
                let _ = RESOLVED_LIBRARY.set(Some(lib));
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => last_err = format!("{}: {:?}", lib.display(), e),
        }
    }

    let pdfium = Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| JoyPdfError::PdfiumBindingFailed(format!("{} (system: {:?})", last_err, e)))?;
    debug!("Bound pdfium from the system library path");
    let _ = RESOLVED_LIBRARY.set(None);
    Ok(pdfium)
}

fn bind_resolved(lib: Option<&Path>) -> Result<Pdfium, JoyPdfError> {
    let bindings = match lib {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| JoyPdfError::PdfiumBindingFailed(format!("{:?}", e)))
}

fn candidate_dirs(lib_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = lib_dir {
        dirs.push(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(PDFIUM_LIB_ENV).filter(|v| !v.is_empty()) {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(dir);
    }
    dirs.push(PathBuf::from("./"));
    dirs
}

/// Open a PDF held in memory, mapping pdfium's errors onto [`ExtractionError`].
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ExtractionError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(&format!("{:?}", e)))
}

/// pdfium reports password problems through its generic error type; the
/// debug text is the only place the distinction shows.
pub(crate) fn classify_load_error(detail: &str) -> ExtractionError {
    if detail.contains("Password") || detail.contains("password") {
        ExtractionError::PasswordRequired
    } else {
        ExtractionError::InvalidDocument {
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_errors_are_recognised() {
        assert_eq!(
            classify_load_error("PdfiumLibraryInternalError(PasswordError)"),
            ExtractionError::PasswordRequired
        );
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(FormatError)"),
            ExtractionError::InvalidDocument { .. }
        ));
    }

    #[test]
    fn configured_dir_is_tried_first() {
        let dirs = candidate_dirs(Some(Path::new("/opt/pdfium/lib")));
        assert_eq!(dirs[0], PathBuf::from("/opt/pdfium/lib"));
        assert_eq!(dirs.last(), Some(&PathBuf::from("./")));
    }
}
