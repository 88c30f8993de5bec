//! Scheme summarizer: document text → [`SchemeSummary`].
//!
//! One model call with [`crate::prompts::SUMMARY_TEMPLATE`]. The input is cut
//! to `max_input_chars` first; the cut is deterministic so resubmitting the
//! same document sends the same prompt.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::orchestrator::Stage;
use crate::output::{ExtractedText, SchemeSummary};
use crate::pipeline::{llm, parse};
use crate::prompts::summary_prompt;
use crate::service::ModelService;
use tracing::{info, warn};

/// A sentence boundary is preferred over a hard cut when it keeps at least
/// this share of the budget.
const SENTENCE_CUT_MIN_RATIO: f64 = 0.8;

/// Summarise `text`.
///
/// Blank text fails with an extraction error without calling the model.
/// Leading whitespace is dropped before the input budget is applied.
pub async fn summarize(
    service: &dyn ModelService,
    text: &ExtractedText,
    config: &PipelineConfig,
) -> Result<SchemeSummary, PipelineError> {
    // Leading whitespace must not use up the input budget.
    let body = text.text.trim_start();
    if body.is_empty() {
        return Err(PipelineError::Extraction {
            reason: "extracted text is empty; nothing to summarise".to_string(),
        });
    }

    let (input, truncated) = truncate_to_budget(body, config.max_input_chars);
    if truncated {
        warn!(
            "Document text truncated from {} to {} chars; summary may be incomplete",
            body.chars().count(),
            input.chars().count()
        );
    }

    let prompt = summary_prompt(input);
    let reply = llm::call_model(service, "summary", &prompt, config.summary_max_tokens, config)
        .await
        .map_err(|e| e.into_pipeline_error(Stage::Summarizing))?;

    let summary = parse::parse_summary(&reply, truncated)
        .map_err(|reason| PipelineError::SummaryParse { reason })?;

    info!(
        "Summary: {} benefits, {} criteria, {} documents",
        summary.benefits.len(),
        summary.eligibility_criteria.len(),
        summary.required_documents.len()
    );
    Ok(summary)
}

/// Keep at most `max_chars` characters of `text`, preferring to end on a full
/// stop. Returns the kept prefix and whether anything was cut.
pub fn truncate_to_budget(text: &str, max_chars: usize) -> (&str, bool) {
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => byte_idx,
        None => return (text, false),
    };
    let prefix = &text[..cut];

    if let Some(period) = prefix.rfind('.') {
        let kept_chars = prefix[..=period].chars().count();
        if kept_chars as f64 > max_chars as f64 * SENTENCE_CUT_MIN_RATIO {
            return (&prefix[..=period], true);
        }
    }
    (prefix, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_budget("hello.", 100), ("hello.", false));
        assert_eq!(truncate_to_budget("exactly", 7), ("exactly", false));
    }

    #[test]
    fn cut_prefers_late_sentence_boundary() {
        let text = format!("{}. tail that does not fit", "a".repeat(90));
        let (kept, truncated) = truncate_to_budget(&text, 100);
        assert!(truncated);
        assert_eq!(kept, format!("{}.", "a".repeat(90)));
    }

    #[test]
    fn early_sentence_boundary_is_ignored() {
        let text = format!("Intro. {}", "b".repeat(200));
        let (kept, truncated) = truncate_to_budget(&text, 100);
        assert!(truncated);
        assert_eq!(kept.chars().count(), 100);
        assert!(text.starts_with(kept));
    }

    #[test]
    fn cut_counts_characters_not_bytes() {
        let text = "₹".repeat(50);
        let (kept, truncated) = truncate_to_budget(&text, 10);
        assert!(truncated);
        assert_eq!(kept, "₹".repeat(10));
    }

    #[test]
    fn truncation_is_deterministic() {
        let text = "Sentence one. Sentence two. ".repeat(500);
        assert_eq!(truncate_to_budget(&text, 1000), truncate_to_budget(&text, 1000));
    }
}
