//! Localizer: summary and verdict → plain-language text per requested language.
//!
//! Summary and verdict are first rendered together as English text with
//! [`crate::prompts::render_result`]. English is served from that rendering
//! directly; every other language is one model call. Calls run concurrently,
//! at most `translation_concurrency` at a time, and a failure in one language
//! is recorded in [`LocalizedResult::failures`] without touching the others.

use crate::config::PipelineConfig;
use crate::error::TranslationError;
use crate::output::{EligibilityVerdict, Language, LocalizedResult, SchemeSummary};
use crate::pipeline::{llm, parse};
use crate::prompts::{render_result, translation_prompt};
use crate::service::ModelService;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Render `summary` and `verdict` in every language of `languages`.
///
/// Duplicates are ignored; order of first appearance is kept for the model
/// calls. The result never fails as a whole.
pub async fn translate(
    service: &dyn ModelService,
    summary: &SchemeSummary,
    verdict: &EligibilityVerdict,
    languages: &[Language],
    config: &PipelineConfig,
) -> LocalizedResult {
    let targets = dedup_languages(languages);
    let total = targets.len();
    let english = render_result(summary, verdict);
    let mut result = LocalizedResult::default();

    let remote: Vec<Language> = targets
        .iter()
        .copied()
        .filter(|l| *l != Language::English)
        .collect();

    if targets.contains(&Language::English) {
        if let Some(ref cb) = config.progress_callback {
            cb.on_translation_start(Language::English.code(), total);
            cb.on_translation_complete(Language::English.code(), total, english.len());
        }
        result
            .entries
            .insert(Language::English.code().to_string(), english.clone());
    }

    let outcomes: Vec<(Language, Result<String, TranslationError>)> =
        stream::iter(remote.into_iter().map(|language| {
            let english = english.as_str();
            async move {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_translation_start(language.code(), total);
                }
                let outcome = translate_one(service, english, language, config).await;
                if let Some(ref cb) = config.progress_callback {
                    match &outcome {
                        Ok(text) => cb.on_translation_complete(language.code(), total, text.len()),
                        Err(e) => cb.on_translation_error(language.code(), total, &e.to_string()),
                    }
                }
                (language, outcome)
            }
        }))
        .buffer_unordered(config.translation_concurrency)
        .collect()
        .await;

    for (language, outcome) in outcomes {
        match outcome {
            Ok(text) => {
                result.entries.insert(language.code().to_string(), text);
            }
            Err(e) => {
                warn!("Translation to {} failed: {}", language.name(), e);
                result.failures.insert(language.code().to_string(), e);
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, result.len());
    }
    info!(
        "Localized result into {}/{} languages",
        result.len(),
        total
    );
    result
}

async fn translate_one(
    service: &dyn ModelService,
    english: &str,
    language: Language,
    config: &PipelineConfig,
) -> Result<String, TranslationError> {
    let prompt = translation_prompt(english, language);
    let label = format!("translate:{}", language.code());
    let reply = llm::call_model(service, &label, &prompt, config.translation_max_tokens, config)
        .await
        .map_err(|e| e.into_translation_error(language.code()))?;

    parse::parse_translation(&reply).ok_or_else(|| TranslationError::EmptyResponse {
        language: language.code().to_string(),
    })
}

/// Distinct languages in order of first appearance.
pub fn dedup_languages(languages: &[Language]) -> Vec<Language> {
    let mut out = Vec::with_capacity(languages.len());
    for &l in languages {
        if !out.contains(&l) {
            out.push(l);
        }
    }
    out
}

/// Model calls a translation of `languages` will make.
pub fn remote_count(languages: &[Language]) -> usize {
    dedup_languages(languages)
        .into_iter()
        .filter(|l| *l != Language::English)
        .count()
}
