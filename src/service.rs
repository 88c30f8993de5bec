//! The model-service boundary.
//!
//! Every stage that talks to a language model does so through one operation,
//! [`ModelService::complete`]: a prompt in, the reply text out. Keeping the
//! boundary that narrow lets the pipeline run against any backend, and lets
//! tests script replies and count calls without a network.
//!
//! [`LlmService`] is the production implementation: it adapts any
//! `edgequake_llm` provider (OpenAI, Anthropic, Gemini, Azure, Ollama, …).
//! [`resolve_service`] picks the backend from the config and environment.

use crate::config::{PipelineConfig, DEFAULT_MODEL};
use crate::error::PipelineError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failure reported by a model service.
///
/// Timeouts are not part of this type: the pipeline enforces its own
/// deadline around every call (see [`crate::pipeline::llm`]).
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The backend API returned an error.
    #[error("{0}")]
    Api(String),

    /// The backend signalled rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),
}

/// A text-completion backend.
///
/// Implementations must be `Send + Sync`: translations call the same service
/// concurrently.
pub trait ModelService: Send + Sync {
    /// Complete `prompt`, generating at most `max_tokens` tokens.
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        max_tokens: usize,
    ) -> BoxFuture<'a, Result<String, ModelError>>;

    /// Short backend name for log lines.
    fn name(&self) -> &str {
        "model"
    }
}

/// [`ModelService`] over an `edgequake_llm` provider.
pub struct LlmService {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    label: String,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, label: impl Into<String>) -> Self {
        Self {
            provider,
            temperature,
            label: label.into(),
        }
    }
}

impl ModelService for LlmService {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        max_tokens: usize,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        Box::pin(async move {
            let messages = vec![ChatMessage::user(prompt)];
            let options = CompletionOptions {
                temperature: Some(self.temperature),
                max_tokens: Some(max_tokens),
                ..Default::default()
            };

            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| classify_error(e.to_string()))?;

            debug!(
                "{}: {} input tokens, {} output tokens",
                self.label, response.prompt_tokens, response.completion_tokens
            );
            Ok(response.content)
        })
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Separate 429-style failures so callers can tell the user to slow down.
fn classify_error(message: String) -> ModelError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
    {
        ModelError::RateLimited(message)
    } else {
        ModelError::Api(message)
    }
}

/// Resolve the model service, from most-specific to least-specific.
///
/// 1. **Pre-built service** (`config.service`): used as-is.
/// 2. **Pre-built provider** (`config.provider`): wrapped in [`LlmService`].
/// 3. **Named provider + model** (`config.provider_name`): created through
///    [`ProviderFactory::create_llm_provider`], which reads the matching API
///    key from the environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **OpenAI** when `OPENAI_API_KEY` is set.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_service(config: &PipelineConfig) -> Result<Arc<dyn ModelService>, PipelineError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }

    let (provider, label) = resolve_provider(config)?;
    Ok(Arc::new(LlmService::new(provider, config.temperature, label)))
}

fn resolve_provider(
    config: &PipelineConfig,
) -> Result<(Arc<dyn LLMProvider>, String), PipelineError> {
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), "custom".to_string()));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    // Prefer OpenAI when its key is present, even if other keys are too.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PipelineError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<(Arc<dyn LLMProvider>, String), PipelineError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PipelineError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok((provider, format!("{provider_name}/{model}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ModelService for Echo {
        fn complete<'a>(
            &'a self,
            prompt: &'a str,
            _max_tokens: usize,
        ) -> BoxFuture<'a, Result<String, ModelError>> {
            Box::pin(async move { Ok(prompt.to_uppercase()) })
        }
    }

    #[test]
    fn rate_limit_messages_are_classified() {
        assert!(matches!(
            classify_error("HTTP 429 Too Many Requests".into()),
            ModelError::RateLimited(_)
        ));
        assert!(matches!(
            classify_error("invalid api key".into()),
            ModelError::Api(_)
        ));
    }

    #[tokio::test]
    async fn configured_service_takes_precedence() {
        let config = PipelineConfig::builder()
            .service(Arc::new(Echo))
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        let service = resolve_service(&config).expect("pre-built service is used as-is");
        assert_eq!(service.complete("hi", 8).await.unwrap(), "HI");
        assert_eq!(service.name(), "model");
    }
}
