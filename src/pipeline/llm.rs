//! Completion client: send one instruction, get one reply.
//!
//! [`CompletionService`] is the seam between the pipeline and a hosted
//! model. The production implementation, [`LlmCompletion`], wraps an
//! `edgequake_llm` provider and adds retries and a per-call timeout. Tests
//! and embedders plug in their own service through
//! [`crate::config::AnalysisConfigBuilder::completion`].
//!
//! ## Retry Strategy
//!
//! Rate limits and 503s from hosted APIs are transient. Each retry waits
//! `retry_backoff_ms * 2^(attempt-1)`: with the 500 ms default and 2 retries
//! that is 500 ms then 1 s. A timeout is not retried; the model already had
//! the whole timeout once.

use crate::config::AnalysisConfig;
use crate::error::{CompletionError, JoyPdfError};
use crate::output::{AnalysisResult, Completion, CompletionStats};
use crate::pipeline::postprocess::clean_response;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Anything that turns a prompt into a model reply.
pub trait CompletionService: Send + Sync {
    /// Service name used in error messages, e.g. "Gemini".
    fn label(&self) -> &str;

    /// Send `prompt` as the sole user message.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, CompletionError>>;
}

/// [`CompletionService`] backed by an `edgequake_llm` provider.
pub struct LlmCompletion {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
    timeout_secs: u64,
}

impl LlmCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            label: config.service_label(),
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            timeout_secs: config.api_timeout_secs,
        }
    }

    async fn complete_with_retries(&self, prompt: &str) -> Result<Completion, CompletionError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_delay_ms(self.retry_backoff_ms, attempt);
                warn!(
                    "{} API: retry {}/{} after {}ms",
                    self.label, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let call = self.provider.chat(&messages, Some(&self.options));
            match timeout(Duration::from_secs(self.timeout_secs), call).await {
                Err(_) => {
                    warn!("{} API: no reply within {}s", self.label, self.timeout_secs);
                    return Err(CompletionError::Timeout {
                        service: self.label.clone(),
                        secs: self.timeout_secs,
                    });
                }
                Ok(Ok(response)) => {
                    let duration = start.elapsed();
                    debug!(
                        "{} API: {} input tokens, {} output tokens, {:?}",
                        self.label, response.prompt_tokens, response.completion_tokens, duration
                    );
                    return Ok(Completion {
                        text: response.content,
                        stats: CompletionStats {
                            input_tokens: response.prompt_tokens,
                            output_tokens: response.completion_tokens,
                            duration_ms: duration.as_millis() as u64,
                            retries: attempt,
                        },
                    });
                }
                Ok(Err(e)) => {
                    let err_msg = format!("{}", e);
                    warn!(
                        "{} API: attempt {} failed: {}",
                        self.label,
                        attempt + 1,
                        err_msg
                    );
                    last_err = Some(err_msg);
                }
            }
        }

        Err(CompletionError::ServiceUnavailable {
            service: self.label.clone(),
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

impl CompletionService for LlmCompletion {
    fn label(&self) -> &str {
        &self.label
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, CompletionError>> {
        Box::pin(self.complete_with_retries(prompt))
    }
}

/// Delay before retry `attempt` (1-based): `base_ms * 2^(attempt-1)`, saturating.
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Pick the completion service for `config`.
///
/// A service set on the config wins. Otherwise the API key variable is
/// checked and an `edgequake_llm` provider is created for
/// `provider_name` / `model`.
pub fn resolve_completion_service(
    config: &AnalysisConfig,
) -> Result<Arc<dyn CompletionService>, JoyPdfError> {
    if let Some(ref service) = config.completion {
        return Ok(Arc::clone(service));
    }

    if let Some(ref var) = config.api_key_env {
        let present = std::env::var(var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(JoyPdfError::ProviderNotConfigured {
                provider: config.provider_name.clone(),
                hint: format!(
                    "{} is not set. Export it or add it to a .env file in the working directory.",
                    var
                ),
            });
        }
    }

    info!(
        "Using provider={}, model={}",
        config.provider_name, config.model
    );
    let provider = ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
        .map_err(|e| JoyPdfError::ProviderNotConfigured {
            provider: config.provider_name.clone(),
            hint: format!("{e}"),
        })?;

    Ok(Arc::new(LlmCompletion::new(provider, config)))
}

/// Ask `service` about `prompt` and fold the outcome into an [`AnalysisResult`].
///
/// The reply is cleaned and trimmed. Failures come back as
/// [`AnalysisResult::Failed`], never as `Err`.
pub async fn complete(
    service: &dyn CompletionService,
    prompt: &str,
) -> (AnalysisResult, Option<CompletionStats>) {
    match service.complete(prompt).await {
        Ok(completion) => {
            let text = clean_response(&completion.text);
            (AnalysisResult::Answer(text), Some(completion.stats))
        }
        Err(e) => {
            warn!("{}", e);
            (AnalysisResult::Failed(e), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ERROR_SENTINEL;

    struct Canned(Result<&'static str, CompletionError>);

    impl CompletionService for Canned {
        fn label(&self) -> &str {
            "Canned"
        }

        fn complete<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> BoxFuture<'a, Result<Completion, CompletionError>> {
            let out = self.0.clone().map(|text| Completion {
                text: text.to_string(),
                stats: CompletionStats::default(),
            });
            Box::pin(async move { out })
        }
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay_ms(500, 1), 500);
        assert_eq!(backoff_delay_ms(500, 2), 1000);
        assert_eq!(backoff_delay_ms(500, 3), 2000);
        assert_eq!(backoff_delay_ms(500, 80), u64::MAX);
        assert_eq!(backoff_delay_ms(u64::MAX, 2), u64::MAX);
    }

    #[test]
    fn build_options_follows_config() {
        let config = AnalysisConfig::builder()
            .temperature(0.3)
            .max_tokens(2048)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(2048));

        let opts = build_options(&AnalysisConfig::default());
        assert_eq!(opts.temperature, None);
    }

    #[tokio::test]
    async fn success_is_trimmed() {
        let service = Canned(Ok("\n\n  - point one\n- point two  \n"));
        let (result, stats) = complete(&service, "prompt").await;
        assert_eq!(
            result,
            AnalysisResult::Answer("- point one\n- point two".into())
        );
        assert!(stats.is_some());
    }

    #[tokio::test]
    async fn failure_becomes_sentinel_result() {
        let service = Canned(Err(CompletionError::ServiceUnavailable {
            service: "Gemini".into(),
            detail: "403 API key not valid".into(),
        }));
        let (result, stats) = complete(&service, "prompt").await;
        assert!(!result.is_success());
        assert!(result.display_text().starts_with(ERROR_SENTINEL));
        assert!(result.display_text().contains("API key not valid"));
        assert!(stats.is_none());
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let config = AnalysisConfig::builder()
            .api_key_env(Some("JOYPDF_TEST_KEY_THAT_IS_NEVER_SET".into()))
            .build()
            .unwrap();
        match resolve_completion_service(&config) {
            Err(JoyPdfError::ProviderNotConfigured { provider, hint }) => {
                assert_eq!(provider, "gemini");
                assert!(hint.contains("JOYPDF_TEST_KEY_THAT_IS_NEVER_SET"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn configured_service_takes_precedence() {
        let config = AnalysisConfig::builder()
            .api_key_env(Some("JOYPDF_TEST_KEY_THAT_IS_NEVER_SET".into()))
            .completion(Arc::new(Canned(Ok("hi"))))
            .build()
            .unwrap();
        let service = resolve_completion_service(&config).unwrap();
        assert_eq!(service.label(), "Canned");
    }
}
