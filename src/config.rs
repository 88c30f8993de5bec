//! Configuration types for the eligibility pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. One struct for every knob makes it easy to
//! share a config across sessions, log it, and compare two runs.

use crate::error::PipelineError;
use crate::output::Language;
use crate::progress::ProgressCallback;
use crate::service::ModelService;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for one pipeline run or session.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use scheme_eligibility::{Language, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4o-mini")
///     .max_input_chars(8_000)
///     .languages(vec![Language::English, Language::Tamil])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// LLM model identifier, e.g. "gpt-4o-mini", "claude-sonnet-4-20250514".
    /// If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed model service. Takes precedence over every provider
    /// setting; used to plug in a non-edgequake backend or a test double.
    pub service: Option<Arc<dyn ModelService>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Summaries and verdicts must stay faithful to the document, so the
    /// default is low.
    pub temperature: f32,

    /// Maximum tokens for the summary reply. Default: 2048.
    pub summary_max_tokens: usize,

    /// Maximum tokens for the verdict reply. Default: 1024.
    pub evaluation_max_tokens: usize,

    /// Maximum tokens for each translation reply. Default: 2048.
    ///
    /// Indic scripts tokenise less efficiently than English; a translation
    /// often needs two to three times the tokens of its source.
    pub translation_max_tokens: usize,

    /// Maximum characters of document text sent to the summarizer. Default: 10 000.
    ///
    /// Longer text is cut (prefix kept) and the summary is flagged
    /// `input_truncated`.
    pub max_input_chars: usize,

    /// Per model call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Retries on a failed model call. Default: 0.
    ///
    /// Failures are surfaced to the caller for manual resubmission unless this
    /// is raised.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Concurrent translation calls. Default: 4.
    pub translation_concurrency: usize,

    /// Languages rendered by [`crate::orchestrator::run`] when the caller
    /// passes none. Default: English, Hindi, Telugu.
    pub languages: Vec<Language>,

    /// Separator between pages of extracted text. Default: blank line.
    pub page_separator: PageSeparator,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional stage and per-language event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            service: None,
            temperature: 0.2,
            summary_max_tokens: 2048,
            evaluation_max_tokens: 1024,
            translation_max_tokens: 2048,
            max_input_chars: 10_000,
            api_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            translation_concurrency: 4,
            languages: Language::DEFAULT.to_vec(),
            page_separator: PageSeparator::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("service", &self.service.as_ref().map(|_| "<dyn ModelService>"))
            .field("temperature", &self.temperature)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("evaluation_max_tokens", &self.evaluation_max_tokens)
            .field("translation_max_tokens", &self.translation_max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("translation_concurrency", &self.translation_concurrency)
            .field("languages", &self.languages)
            .field("page_separator", &self.page_separator)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn service(mut self, service: Arc<dyn ModelService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn summary_max_tokens(mut self, n: usize) -> Self {
        self.config.summary_max_tokens = n;
        self
    }

    pub fn evaluation_max_tokens(mut self, n: usize) -> Self {
        self.config.evaluation_max_tokens = n;
        self
    }

    pub fn translation_max_tokens(mut self, n: usize) -> Self {
        self.config.translation_max_tokens = n;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn translation_concurrency(mut self, n: usize) -> Self {
        self.config.translation_concurrency = n.max(1);
        self
    }

    pub fn languages(mut self, languages: Vec<Language>) -> Self {
        self.config.languages = languages;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
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
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.max_input_chars < 100 {
            return Err(PipelineError::InvalidConfig(format!(
                "max_input_chars must be ≥ 100, got {}",
                c.max_input_chars
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(PipelineError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.summary_max_tokens == 0 || c.evaluation_max_tokens == 0 || c.translation_max_tokens == 0
        {
            return Err(PipelineError::InvalidConfig(
                "max tokens must be ≥ 1 for every stage".into(),
            ));
        }
        if c.translation_concurrency == 0 {
            return Err(PipelineError::InvalidConfig(
                "Translation concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How to separate pages in the extracted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Blank line: "\n\n". (default)
    #[default]
    BlankLine,
    /// ASCII form feed, the classic page break.
    FormFeed,
    /// A visible marker naming the page: "--- Page N ---".
    Marker,
}

impl PageSeparator {
    /// Render the separator placed before the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::BlankLine => "\n\n".to_string(),
            PageSeparator::FormFeed => "\n\u{000C}\n".to_string(),
            PageSeparator::Marker => format!("\n\n--- Page {} ---\n\n", page_num),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_input_chars, 10_000);
        assert_eq!(c.api_timeout_secs, 60);
        assert_eq!(c.max_retries, 0);
        assert_eq!(
            c.languages,
            vec![Language::English, Language::Hindi, Language::Telugu]
        );
        assert_eq!(c.page_separator, PageSeparator::BlankLine);
    }

    #[test]
    fn builder_rejects_tiny_input_budget() {
        let err = PipelineConfig::builder()
            .max_input_chars(10)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_input_chars"));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(PipelineConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn builder_clamps_temperature_and_concurrency() {
        let c = PipelineConfig::builder()
            .temperature(7.0)
            .translation_concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.translation_concurrency, 1);
    }

    #[test]
    fn separator_render() {
        assert_eq!(PageSeparator::BlankLine.render(2), "\n\n");
        assert_eq!(PageSeparator::Marker.render(3), "\n\n--- Page 3 ---\n\n");
        assert!(PageSeparator::FormFeed.render(2).contains('\u{000C}'));
    }
}
