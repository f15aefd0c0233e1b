//! Session behaviour against an in-process completion service.
//!
//! No libpdfium, network or API key is needed: the extracted text is set
//! directly and the model is replaced by a recording fake.

use futures::future::BoxFuture;
use joypdf::{
    AnalysisConfig, AnalysisProgressCallback, AnalysisResult, Completion, CompletionError,
    CompletionService, CompletionStats, ExtractedText, ExtractionMethod, JoyPdfError, Operation,
    PromptError, Session, ERROR_SENTINEL,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Records every prompt and answers with a fixed reply.
struct FakeModel {
    reply: Result<String, CompletionError>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(CompletionError::ServiceUnavailable {
                service: "Gemini".to_string(),
                detail: detail.to_string(),
            }),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl CompletionService for FakeModel {
    fn label(&self) -> &str {
        "Gemini"
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, CompletionError>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.reply.clone().map(|text| Completion {
            text,
            stats: CompletionStats {
                input_tokens: prompt.len() / 4,
                output_tokens: 42,
                duration_ms: 1,
                retries: 0,
            },
        });
        Box::pin(async move { reply })
    }
}

fn session_with(model: Arc<FakeModel>) -> Session {
    let config = AnalysisConfig::builder()
        .completion(model as Arc<dyn CompletionService>)
        .build()
        .unwrap();
    Session::new(config)
}

fn extracted(text: &str) -> ExtractedText {
    ExtractedText {
        text: text.to_string(),
        method: ExtractionMethod::TextLayer,
        page_count: 1,
    }
}

// ── Analysis ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn summary_reaches_the_model_and_is_kept() {
    let model = FakeModel::answering("```markdown\n## Summary\n\n- Revenue grew 12%\n```\n");
    let mut session = session_with(model.clone());
    session.set_extracted("report.pdf", extracted("Q3 revenue grew 12% year over year."));

    let result = session.analyze("summarize pdf").await.unwrap().clone();

    assert_eq!(
        result,
        AnalysisResult::Answer("## Summary\n\n- Revenue grew 12%".to_string())
    );
    assert_eq!(model.calls(), 1);
    assert!(model.last_prompt().contains("Q3 revenue grew 12% year over year."));
    assert_eq!(session.last_operation(), Some(Operation::Summarize));
    assert_eq!(session.last_stats().map(|s| s.output_tokens), Some(42));
}

#[tokio::test]
async fn context_is_appended_after_the_document() {
    let model = FakeModel::answering("Strong match.");
    let mut session = session_with(model.clone());
    session.set_extracted("cv.pdf", extracted("Ten years of Rust."));
    session.set_context("Senior backend engineer");

    session.analyze("evaluate resume").await.unwrap();

    let prompt = model.last_prompt();
    let doc_at = prompt.find("Ten years of Rust.").unwrap();
    let ctx_at = prompt.find("Senior backend engineer").unwrap();
    assert!(doc_at < ctx_at, "context must follow the document text");
}

#[tokio::test]
async fn failed_call_is_a_result_with_the_sentinel() {
    let model = FakeModel::failing("429 quota exceeded");
    let mut session = session_with(model.clone());
    session.set_extracted("hw.pdf", extracted("1. Prove that 2 + 2 = 4."));

    let result = session.analyze("Solve Assignment").await.unwrap().clone();

    assert!(!result.is_success());
    let shown = session.result_text();
    assert!(shown.starts_with(ERROR_SENTINEL), "got {shown:?}");
    assert!(shown.contains("429 quota exceeded"));
    assert!(session.last_stats().is_none());

    // A failure is never offered as a downloadable PDF.
    assert!(matches!(
        session.generate_pdf().await,
        Err(JoyPdfError::Completion(_))
    ));
}

#[tokio::test]
async fn unknown_operation_sends_nothing() {
    let model = FakeModel::answering("unused");
    let mut session = session_with(model.clone());
    session.set_extracted("a.pdf", extracted("body"));

    let err = session.analyze("translate pdf").await.unwrap_err();

    assert!(matches!(
        err,
        JoyPdfError::Prompt(PromptError::UnknownOperation { .. })
    ));
    assert_eq!(model.calls(), 0);
    assert!(session.last_result().is_none());
}

#[tokio::test]
async fn empty_document_sends_nothing() {
    let model = FakeModel::answering("unused");
    let mut session = session_with(model.clone());
    session.set_extracted("blank.pdf", extracted(""));

    let err = session.analyze("summarize pdf").await.unwrap_err();

    assert!(matches!(err, JoyPdfError::Prompt(PromptError::EmptyInput)));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn no_document_sends_nothing() {
    let model = FakeModel::answering("unused");
    let mut session = session_with(model.clone());

    let err = session.analyze("summarize pdf").await.unwrap_err();

    assert!(matches!(err, JoyPdfError::NoDocument));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn each_operation_uses_its_own_template() {
    let model = FakeModel::answering("ok");
    let mut session = session_with(model.clone());
    session.set_extracted("a.pdf", extracted("same text"));

    let mut prompts = Vec::new();
    for op in Operation::ALL {
        session.analyze(op.label()).await.unwrap();
        prompts.push(model.last_prompt());
    }

    assert_eq!(model.calls(), 3);
    assert_ne!(prompts[0], prompts[1]);
    assert_ne!(prompts[1], prompts[2]);
    assert_ne!(prompts[0], prompts[2]);
    assert!(prompts.iter().all(|p| p.contains("same text")));
}

#[tokio::test]
async fn repeated_analysis_replaces_the_result() {
    let model = FakeModel::answering("first");
    let mut session = session_with(model.clone());
    session.set_extracted("a.pdf", extracted("text"));

    session.analyze("summarize").await.unwrap();
    session.set_result_text("edited by hand");
    assert_eq!(session.result_text(), "edited by hand");

    session.analyze("summarize").await.unwrap();
    assert_eq!(session.result_text(), "first");
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn sessions_do_not_share_state() {
    let model = FakeModel::answering("answer");
    let mut a = session_with(model.clone());
    let b = session_with(model.clone());

    a.set_extracted("a.pdf", extracted("text"));
    a.set_context("only for a");
    a.analyze("summarize").await.unwrap();

    assert!(b.extracted().is_none());
    assert!(b.context().is_none());
    assert!(b.last_result().is_none());
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct CompletionEvents {
    started: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl AnalysisProgressCallback for CompletionEvents {
    fn on_completion_start(&self, _model: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_completion_complete(&self, success: bool, _duration_ms: u64) {
        if success {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn completion_events_bracket_each_call() {
    let events = Arc::new(CompletionEvents::default());
    let config = AnalysisConfig::builder()
        .completion(FakeModel::failing("boom") as Arc<dyn CompletionService>)
        .progress_callback(events.clone())
        .build()
        .unwrap();
    let mut session = Session::new(config);
    session.set_extracted("a.pdf", extracted("text"));

    session.analyze("summarize").await.unwrap();
    // Rejected before any call: no events.
    let _ = session.analyze("nope").await;

    assert_eq!(events.started.load(Ordering::SeqCst), 1);
    assert_eq!(events.failed.load(Ordering::SeqCst), 1);
    assert_eq!(events.succeeded.load(Ordering::SeqCst), 0);
}

// ── Provider resolution ──────────────────────────────────────────────────────

#[tokio::test]
async fn missing_api_key_is_reported_before_any_call() {
    let config = AnalysisConfig::builder()
        .api_key_env(Some("JOYPDF_TEST_KEY_THAT_IS_NEVER_SET".to_string()))
        .build()
        .unwrap();
    let mut session = Session::new(config);
    session.set_extracted("a.pdf", extracted("text"));

    let err = session.analyze("summarize").await.unwrap_err();

    match err {
        JoyPdfError::ProviderNotConfigured { hint, .. } => {
            assert!(hint.contains("JOYPDF_TEST_KEY_THAT_IS_NEVER_SET"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.last_result().is_none());
}
