//! Eligibility evaluator: scheme summary + profile → [`EligibilityVerdict`].

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::orchestrator::Stage;
use crate::output::{EligibilityVerdict, SchemeSummary, UserProfile};
use crate::pipeline::{llm, parse};
use crate::prompts::evaluation_prompt;
use crate::service::ModelService;
use tracing::info;

/// Ask the model whether `profile` qualifies for the scheme in `summary`.
///
/// Exactly one model call. A reply without one of the three verdict labels
/// is a [`PipelineError::VerdictParse`]; nothing is guessed from prose.
pub async fn evaluate(
    service: &dyn ModelService,
    summary: &SchemeSummary,
    profile: &UserProfile,
    config: &PipelineConfig,
) -> Result<EligibilityVerdict, PipelineError> {
    let prompt = evaluation_prompt(summary, profile);
    let reply = llm::call_model(
        service,
        "evaluation",
        &prompt,
        config.evaluation_max_tokens,
        config,
    )
    .await
    .map_err(|e| e.into_pipeline_error(Stage::Evaluating))?;

    let verdict =
        parse::parse_verdict(&reply).map_err(|reason| PipelineError::VerdictParse { reason })?;

    info!(
        "Verdict: {} ({} remediation steps)",
        verdict.verdict.label(),
        verdict.remediation_steps.len()
    );
    Ok(verdict)
}
