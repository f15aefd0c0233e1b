//! Configuration types for document analysis.
//!
//! Every knob of the pipeline (extraction, OCR, completion, rendering) lives
//! in [`AnalysisConfig`], built via its [`AnalysisConfigBuilder`]. Setters
//! clamp obviously wrong values; [`AnalysisConfigBuilder::build`] rejects the
//! rest with [`JoyPdfError::InvalidConfig`].

use crate::error::JoyPdfError;
use crate::pipeline::llm::CompletionService;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Hosted model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the API key of the default provider.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for one analysis session.
///
/// # Example
/// ```rust
/// use joypdf::{AnalysisConfig, RenderStrategy};
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.5-flash")
///     .render_strategy(RenderStrategy::LineOriented)
///     .ocr_dpi(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM provider name understood by `edgequake_llm::ProviderFactory`. Default: "gemini".
    pub provider_name: String,

    /// Model identifier sent with every request. Default: "gemini-2.5-flash".
    pub model: String,

    /// Environment variable that must hold the provider's API key. Default: "GEMINI_API_KEY".
    ///
    /// Checked before the provider is created so a missing key surfaces as a
    /// configuration error instead of a failed request. `None` skips the
    /// check (local providers such as Ollama need no key).
    pub api_key_env: Option<String>,

    /// Pre-constructed completion service. Takes precedence over `provider_name`.
    pub completion: Option<Arc<dyn CompletionService>>,

    /// Sampling temperature. `None` keeps the provider default.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate. `None` keeps the provider default.
    pub max_tokens: Option<usize>,

    /// Retry attempts on a failed completion call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout for the completion request in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Whether image-only PDFs are sent through OCR. Default: [`OcrMode::Auto`].
    pub ocr_mode: OcrMode,

    /// Rasterisation resolution for OCR pages. Range: 72–600. Default: 300.
    pub ocr_dpi: u32,

    /// Tesseract language code(s), e.g. "eng" or "deu+eng". Default: "eng".
    pub ocr_language: String,

    /// Tesseract executable. Default: "tesseract" (looked up on `PATH`).
    pub tesseract_bin: PathBuf,

    /// Pre-constructed OCR engine. Takes precedence over the tesseract settings.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Directory containing libpdfium. If None, the working directory and
    /// the system library paths are searched.
    pub pdfium_lib_path: Option<PathBuf>,

    /// How the result text is laid out in the exported PDF. Default: [`RenderStrategy::Markdown`].
    pub render_strategy: RenderStrategy,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives extraction / completion / render events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_string()),
            completion: None,
            temperature: None,
            max_tokens: None,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            ocr_mode: OcrMode::default(),
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            tesseract_bin: PathBuf::from("tesseract"),
            ocr_engine: None,
            password: None,
            pdfium_lib_path: None,
            render_strategy: RenderStrategy::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field(
                "completion",
                &self.completion.as_ref().map(|_| "<dyn CompletionService>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("ocr_mode", &self.ocr_mode)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("render_strategy", &self.render_strategy)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Human-readable service name used in error messages ("Gemini", "Openai", …).
    pub fn service_label(&self) -> String {
        let mut chars = self.provider_name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "LLM".to_string(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key_env(mut self, var: Option<String>) -> Self {
        self.config.api_key_env = var;
        self
    }

    pub fn completion(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.config.completion = Some(service);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    /// Clamped to [`MAX_RETRIES_LIMIT`].
    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(MAX_RETRIES_LIMIT);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi.clamp(72, 600);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.config.tesseract_bin = bin.into();
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn render_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.config.render_strategy = strategy;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, JoyPdfError> {
        let c = &self.config;
        if c.completion.is_none() && c.provider_name.trim().is_empty() {
            return Err(JoyPdfError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(JoyPdfError::InvalidConfig("Model must not be empty".into()));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(JoyPdfError::InvalidConfig(
                "OCR language must not be empty (e.g. \"eng\")".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(JoyPdfError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What to do with a PDF that has no extractable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// Rasterise every page and run OCR. (default)
    #[default]
    Auto,
    /// Reject image-only PDFs with [`crate::error::ExtractionError::OcrFailed`].
    Disabled,
}

/// Layout used when the result text is exported as a PDF.
///
/// | Strategy | Input treated as |
/// |----------|------------------|
/// | `Markdown` | lightweight Markdown: headings, lists, `**strong**`, `*emphasis*`, code |
/// | `LineOriented` | plain lines; `**…**` and `*…*` runs become bold, one paragraph per line |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderStrategy {
    /// Markdown parsed with pulldown-cmark and styled with the fixed stylesheet. (default)
    #[default]
    Markdown,
    /// Line-by-line rendering with inline bold-run detection.
    LineOriented,
}
