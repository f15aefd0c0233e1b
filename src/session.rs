//! One user's analysis session.
//!
//! A [`Session`] holds everything that survives between user actions: the
//! extracted text of the uploaded document, the extra context, and the last
//! analysis result. It is owned by the caller and passed around explicitly;
//! two sessions never share state.
//!
//! ```text
//! upload ──▶ set_context ──▶ analyze ──▶ (edit result) ──▶ generate_pdf
//! ```

use crate::config::AnalysisConfig;
use crate::error::JoyPdfError;
use crate::output::{AnalysisResult, CompletionStats, ExtractedText, RenderedDocument};
use crate::pipeline::extract::extract_document;
use crate::pipeline::input::Document;
use crate::pipeline::llm::{self, resolve_completion_service, CompletionService};
use crate::prompts::{prepare_prompt, Operation};
use crate::render;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct Session {
    config: AnalysisConfig,
    service: Option<Arc<dyn CompletionService>>,
    document_name: Option<String>,
    extracted: Option<ExtractedText>,
    context: Option<String>,
    last_operation: Option<Operation>,
    last_result: Option<AnalysisResult>,
    last_stats: Option<CompletionStats>,
}

impl Session {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            service: None,
            document_name: None,
            extracted: None,
            context: None,
            last_operation: None,
            last_result: None,
            last_stats: None,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Extract the text of `document` and make it the session's document.
    ///
    /// On failure the previous document (if any) is dropped too, so a
    /// rejected upload can never be analyzed by mistake.
    pub async fn upload(&mut self, document: &Document) -> Result<&ExtractedText, JoyPdfError> {
        self.document_name = None;
        self.extracted = None;

        let extracted = extract_document(document, &self.config).await?;
        info!(
            "{}: {} chars via {:?} from {} pages",
            document.name(),
            extracted.text.len(),
            extracted.method,
            extracted.page_count
        );
        self.document_name = Some(document.name().to_string());
        Ok(self.extracted.insert(extracted))
    }

    /// Use text extracted elsewhere as the session's document.
    pub fn set_extracted(&mut self, name: impl Into<String>, extracted: ExtractedText) {
        self.document_name = Some(name.into());
        self.extracted = Some(extracted);
    }

    pub fn extracted(&self) -> Option<&ExtractedText> {
        self.extracted.as_ref()
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    /// Set the free-text context appended to the next prompt.
    pub fn set_context(&mut self, context: impl Into<String>) {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Run `operation_label` over the uploaded text.
    ///
    /// Returns `Err` only when nothing was sent: no document, empty text,
    /// unknown operation, or no usable completion service. A failed model
    /// call is a result, not an error: it comes back as
    /// [`AnalysisResult::Failed`] and is kept as the session's last result.
    pub async fn analyze(&mut self, operation_label: &str) -> Result<&AnalysisResult, JoyPdfError> {
        let extracted = self.extracted.as_ref().ok_or(JoyPdfError::NoDocument)?;
        let (operation, prompt) =
            prepare_prompt(&extracted.text, operation_label, self.context.as_deref())?;

        let service = match self.service {
            Some(ref service) => Arc::clone(service),
            None => {
                let service = resolve_completion_service(&self.config)?;
                self.service = Some(Arc::clone(&service));
                service
            }
        };

        info!("Analyzing ({}) with {}", operation, service.label());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_completion_start(&self.config.model);
        }

        let start = Instant::now();
        let (result, stats) = llm::complete(service.as_ref(), &prompt).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_completion_complete(result.is_success(), elapsed_ms);
        }
        if !result.is_success() {
            warn!("Analysis failed after {}ms", elapsed_ms);
        }

        self.last_operation = Some(operation);
        self.last_stats = stats;
        Ok(self.last_result.insert(result))
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    pub fn last_operation(&self) -> Option<Operation> {
        self.last_operation
    }

    pub fn last_stats(&self) -> Option<&CompletionStats> {
        self.last_stats.as_ref()
    }

    /// The text shown to the user: the answer, the sentinel error, or "".
    pub fn result_text(&self) -> String {
        self.last_result
            .as_ref()
            .map(AnalysisResult::display_text)
            .unwrap_or_default()
    }

    /// Replace the result with text edited by the user.
    pub fn set_result_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.last_result = if text.is_empty() {
            None
        } else {
            Some(AnalysisResult::from_text(text))
        };
    }

    fn renderable_text(&self) -> Result<&str, JoyPdfError> {
        match self.last_result {
            Some(AnalysisResult::Answer(ref text)) if !text.trim().is_empty() => Ok(text),
            Some(AnalysisResult::Failed(ref e)) => Err(JoyPdfError::Completion(e.clone())),
            _ => Err(JoyPdfError::NothingToRender),
        }
    }

    /// Render the current result as a PDF.
    pub async fn generate_pdf(&self) -> Result<RenderedDocument, JoyPdfError> {
        let text = self.renderable_text()?;
        render::render_pdf(text, &self.config).await
    }

    /// Render the current result as a standalone HTML page.
    pub fn generate_html(&self) -> Result<String, JoyPdfError> {
        Ok(render::render_html(self.renderable_text()?))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("document_name", &self.document_name)
            .field("extracted_chars", &self.extracted.as_ref().map(|e| e.text.len()))
            .field("context", &self.context)
            .field("last_operation", &self.last_operation)
            .field("last_result", &self.last_result)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ExtractionMethod;

    fn text(s: &str) -> ExtractedText {
        ExtractedText {
            text: s.to_string(),
            method: ExtractionMethod::TextLayer,
            page_count: 1,
        }
    }

    #[tokio::test]
    async fn analyze_without_document_is_rejected() {
        let mut session = Session::new(AnalysisConfig::default());
        let err = session.analyze("summarize pdf").await.unwrap_err();
        assert!(matches!(err, JoyPdfError::NoDocument));
        assert!(session.last_result().is_none());
    }

    #[test]
    fn blank_context_is_cleared() {
        let mut session = Session::new(AnalysisConfig::default());
        session.set_context("Backend role");
        assert_eq!(session.context(), Some("Backend role"));
        session.set_context("   ");
        assert_eq!(session.context(), None);
    }

    #[test]
    fn edited_result_is_reclassified() {
        let mut session = Session::new(AnalysisConfig::default());
        session.set_extracted("a.pdf", text("body"));
        session.set_result_text("[Error calling Gemini API: boom]");
        assert!(!session.last_result().unwrap().is_success());
        session.set_result_text("fixed by hand");
        assert!(session.last_result().unwrap().is_success());
        session.set_result_text("");
        assert!(session.last_result().is_none());
        assert_eq!(session.result_text(), "");
    }

    #[test]
    fn html_needs_a_successful_result() {
        let mut session = Session::new(AnalysisConfig::default());
        assert!(matches!(
            session.generate_html(),
            Err(JoyPdfError::NothingToRender)
        ));
        session.set_result_text("[Error calling Gemini API: boom]");
        assert!(matches!(
            session.generate_html(),
            Err(JoyPdfError::Completion(_))
        ));
        session.set_result_text("# Done");
        assert!(session.generate_html().unwrap().contains("<h1>Done</h1>"));
    }
}
