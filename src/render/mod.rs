//! Result rendering: answer text → styled blocks → laid-out pages → PDF bytes.
//!
//! ```text
//! text ──▶ blocks ──────▶ layout ──────▶ pdf
//!          (markdown       (wrap +        (pdfium,
//!           or lines)       paginate)      standard fonts)
//! ```
//!
//! Only the last step needs libpdfium. Block building and layout are pure
//! functions over the text and the [`Stylesheet`], so the whole layout is
//! tested without a PDF engine.

pub mod emphasis;
pub mod layout;
mod lines;
mod markdown;
mod pdf;
pub mod style;

pub use layout::{layout, PageLayout, PlacedItem};
pub use markdown::render_html;
pub use style::Stylesheet;

use crate::config::{AnalysisConfig, RenderStrategy};
use crate::error::JoyPdfError;
use crate::output::{RenderedDocument, DEFAULT_PDF_NAME};
use crate::pipeline::engine::bind_pdfium;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Character-level style of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl SpanStyle {
    pub const PLAIN: SpanStyle = SpanStyle {
        bold: false,
        italic: false,
        code: false,
    };
    pub const BOLD: SpanStyle = SpanStyle {
        bold: true,
        italic: false,
        code: false,
    };
}

/// A run of text in one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Level 1–6.
    Heading(u8),
    Paragraph,
    ListItem { depth: usize, marker: String },
    CodeBlock,
    Quote,
    Rule,
}

/// A block-level element: a heading, a paragraph, one list item, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub spans: Vec<Span>,
}

impl Block {
    pub fn new(kind: BlockKind, spans: Vec<Span>) -> Self {
        Self { kind, spans }
    }

    /// Append text, merging with the last span when the style matches.
    pub fn push(&mut self, text: &str, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span::new(text, style)),
        }
    }

    /// Drop trailing whitespace (and spans left empty by it).
    pub fn trim_end(&mut self) {
        while let Some(last) = self.spans.last_mut() {
            let trimmed_len = last.text.trim_end().len();
            last.text.truncate(trimmed_len);
            if last.text.is_empty() {
                self.spans.pop();
            } else {
                break;
            }
        }
    }

    pub(crate) fn strip_suffix(&mut self, suffix: &str) {
        if let Some(last) = self.spans.last_mut() {
            if last.text.ends_with(suffix) {
                let keep = last.text.len() - suffix.len();
                last.text.truncate(keep);
            }
        }
        self.trim_end();
    }

    /// Concatenated text of all spans.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Split `text` into blocks with the chosen strategy.
pub fn to_blocks(text: &str, strategy: RenderStrategy) -> Vec<Block> {
    match strategy {
        RenderStrategy::Markdown => markdown::to_blocks(text),
        RenderStrategy::LineOriented => lines::to_blocks(text),
    }
}

/// Render `text` to PDF bytes. Blocks; call from a blocking context.
pub fn render_pdf_blocking(
    text: &str,
    strategy: RenderStrategy,
    pdfium_lib_path: Option<&Path>,
) -> Result<RenderedDocument, JoyPdfError> {
    if text.trim().is_empty() {
        return Err(JoyPdfError::NothingToRender);
    }

    let sheet = Stylesheet::default();
    let blocks = to_blocks(text, strategy);
    let pages = layout(&blocks, &sheet);
    debug!("Laid out {} blocks on {} pages", blocks.len(), pages.len());

    let pdfium = bind_pdfium(pdfium_lib_path)?;
    let bytes = pdf::write_pdf(&pdfium, &pages, &sheet)?;

    Ok(RenderedDocument {
        bytes,
        file_name: DEFAULT_PDF_NAME.to_string(),
        page_count: pages.len(),
    })
}

/// Render `text` to PDF bytes on a blocking worker.
pub async fn render_pdf(
    text: &str,
    config: &AnalysisConfig,
) -> Result<RenderedDocument, JoyPdfError> {
    let text = text.to_string();
    let strategy = config.render_strategy;
    let lib_path: Option<PathBuf> = config.pdfium_lib_path.clone();

    let rendered = tokio::task::spawn_blocking(move || {
        render_pdf_blocking(&text, strategy, lib_path.as_deref())
    })
    .await
    .map_err(|e| JoyPdfError::Internal(format!("Render task panicked: {}", e)))??;

    info!(
        "Rendered {} pages ({} bytes)",
        rendered.page_count,
        rendered.bytes.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(rendered.page_count, rendered.bytes.len());
    }
    Ok(rendered)
}
