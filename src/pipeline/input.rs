//! Input resolution: turn a path, URL, byte buffer or stream into a [`Document`].
//!
//! Every source ends up as an owned byte buffer. pdfium can load a document
//! straight from a byte slice, so keeping the bytes in memory lets the probe
//! and the extraction pass read the same upload as often as they like.
//! The `%PDF` magic bytes (anywhere in the first kilobyte) are checked up front so a wrong file type is
//! reported as an invalid document rather than a pdfium failure.

use crate::error::{ExtractionError, JoyPdfError};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// An uploaded PDF: raw bytes plus a display name.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Document {
    /// Wrap bytes already in memory, checking the PDF magic.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        check_magic(&bytes)?;
        Ok(Self {
            name: name.into(),
            bytes,
        })
    }

    /// Read a whole stream and rewind it to the start afterwards.
    pub fn from_reader<R: Read + Seek>(
        name: impl Into<String>,
        reader: &mut R,
    ) -> Result<Self, JoyPdfError> {
        let mut bytes = Vec::new();
        let read = reader
            .seek(SeekFrom::Start(0))
            .and_then(|_| reader.read_to_end(&mut bytes));
        // Rewind even when the read failed part-way.
        let rewind = reader.seek(SeekFrom::Start(0));

        read.map_err(|e| JoyPdfError::Internal(format!("Failed to read upload: {}", e)))?;
        rewind.map_err(|e| JoyPdfError::Internal(format!("Failed to rewind upload: {}", e)))?;
        Ok(Self::from_bytes(name, bytes)?)
    }

    /// Read a local file, validating existence, permission and PDF magic.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, JoyPdfError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(JoyPdfError::FileNotFound { path });
        }

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(JoyPdfError::PermissionDenied { path });
            }
            Err(_) => return Err(JoyPdfError::FileNotFound { path }),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The header may follow a BOM or other leading bytes; readers accept it
/// anywhere in the first kilobyte.
const HEADER_SEARCH_LEN: usize = 1024;

fn check_magic(bytes: &[u8]) -> Result<(), ExtractionError> {
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_LEN)];
    if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        let shown = String::from_utf8_lossy(&bytes[..bytes.len().min(4)]).into_owned();
        return Err(ExtractionError::InvalidDocument {
            detail: format!("missing %PDF header (found {:?})", shown),
        });
    }
    Ok(())
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a user-supplied path or URL to a [`Document`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Document, JoyPdfError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() {
        Err(JoyPdfError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        Document::from_path(PathBuf::from(input))
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, JoyPdfError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| JoyPdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            JoyPdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            JoyPdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(JoyPdfError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| JoyPdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(Document::from_bytes(file_name_from_url(url), bytes.to_vec())?)
}

/// Last path segment of the URL if it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
