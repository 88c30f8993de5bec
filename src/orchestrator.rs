//! Orchestration: the stage machine that drives one document upload from
//! extraction to a localized verdict.
//!
//! ```text
//! AwaitingDocument ─ingest─▶ Extracting ─▶ Summarizing ─▶ AwaitingProfile
//!                                                             │  ▲
//!                                          submit_profile ────┘  │ (invalid fields)
//!                                                             │
//!                         Done ◀─ Translating ◀─ Evaluating ◀─complete
//!
//!        any stage error ─▶ Failed (terminal)
//! ```
//!
//! Two surfaces are offered. [`Session`] is step-wise, for front-ends that
//! collect the profile after showing the summary. [`run`] is one-shot, for
//! callers that already hold both the document and the profile.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::output::{
    EligibilityVerdict, ExtractedText, Language, RawDocument, RunOutput, RunStats, SchemeSummary,
    UserProfile,
};
use crate::pipeline::profile::{collect_profile, RawProfile};
use crate::pipeline::{evaluate, extract, input, summarize, translate};
use crate::service::{resolve_service, ModelService};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Where a session is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingDocument,
    Extracting,
    Summarizing,
    AwaitingProfile,
    Evaluating,
    Translating,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::AwaitingDocument => "awaiting_document",
            Stage::Extracting => "extracting",
            Stage::Summarizing => "summarizing",
            Stage::AwaitingProfile => "awaiting_profile",
            Stage::Evaluating => "evaluating",
            Stage::Translating => "translating",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    /// No further operation is accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document upload, driven stage by stage.
///
/// ```rust,no_run
/// use scheme_eligibility::{Language, PipelineConfig, RawDocument, RawProfile, Session};
///
/// # async fn demo(bytes: Vec<u8>) -> Result<(), scheme_eligibility::PipelineError> {
/// let mut session = Session::from_config(PipelineConfig::default())?;
/// let summary = session.ingest(RawDocument::pdf(bytes)).await?;
/// println!("{:?}", summary.eligibility_criteria);
///
/// session.submit_profile(&RawProfile::new("65", "80000", "General", "Telangana"))?;
/// let output = session.complete(&[Language::English, Language::Hindi]).await?;
/// println!("{}", output.verdict.verdict);
/// # Ok(())
/// # }
/// ```
pub struct Session {
    service: Arc<dyn ModelService>,
    config: PipelineConfig,
    stage: Stage,
    summary: Option<SchemeSummary>,
    profile: Option<UserProfile>,
    verdict: Option<EligibilityVerdict>,
    failure: Option<PipelineError>,
    stats: RunStats,
    started: Option<Instant>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("service", &self.service.name())
            .field("stage", &self.stage)
            .field("summary", &self.summary.is_some())
            .field("profile", &self.profile.is_some())
            .field("failure", &self.failure)
            .finish()
    }
}

impl Session {
    pub fn new(service: Arc<dyn ModelService>, config: PipelineConfig) -> Self {
        Self {
            service,
            config,
            stage: Stage::AwaitingDocument,
            summary: None,
            profile: None,
            verdict: None,
            failure: None,
            stats: RunStats::default(),
            started: None,
        }
    }

    /// Build a session whose model service is resolved from `config`.
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let service = resolve_service(&config)?;
        Ok(Self::new(service, config))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn summary(&self) -> Option<&SchemeSummary> {
        self.summary.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn verdict(&self) -> Option<&EligibilityVerdict> {
        self.verdict.as_ref()
    }

    /// The error that moved the session to [`Stage::Failed`].
    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Extract and summarise `document`.
    ///
    /// On success the session waits for a profile.
    pub async fn ingest(&mut self, document: RawDocument) -> Result<&SchemeSummary, PipelineError> {
        self.expect_stage(Stage::AwaitingDocument, "ingest a document")?;
        self.started = Some(Instant::now());
        info!("Ingesting {}", document.display_name());

        self.enter(Stage::Extracting);
        let extract_start = Instant::now();
        let extracted = extract::extract_text(&document, &self.config.page_separator).await;
        self.stats.extraction_duration_ms = extract_start.elapsed().as_millis() as u64;
        let text = self.check(extracted)?;
        self.summarize_text(text).await
    }

    /// Summarise text that was extracted elsewhere, skipping
    /// [`Stage::Extracting`].
    pub async fn ingest_text(&mut self, text: ExtractedText) -> Result<&SchemeSummary, PipelineError> {
        self.expect_stage(Stage::AwaitingDocument, "ingest text")?;
        self.started = Some(Instant::now());
        self.summarize_text(text).await
    }

    async fn summarize_text(&mut self, text: ExtractedText) -> Result<&SchemeSummary, PipelineError> {
        self.stats.page_count = text.page_count;
        self.stats.pages_with_text = text.pages_with_text;
        self.stats.input_chars = text.char_count();

        self.enter(Stage::Summarizing);
        let summary_start = Instant::now();
        if !text.is_empty() {
            self.stats.model_requests += 1;
        }
        let summary = summarize::summarize(self.service.as_ref(), &text, &self.config).await;
        self.stats.summary_duration_ms = summary_start.elapsed().as_millis() as u64;
        let summary = self.check(summary)?;
        self.stats.input_truncated = summary.input_truncated;

        self.enter(Stage::AwaitingProfile);
        Ok(self.summary.insert(summary))
    }

    /// Validate raw form input and store it as the session's profile.
    ///
    /// Invalid fields do not fail the session; it stays in
    /// [`Stage::AwaitingProfile`] so the form can be corrected and resent.
    pub fn submit_profile(&mut self, raw: &RawProfile) -> Result<&UserProfile, PipelineError> {
        self.expect_stage(Stage::AwaitingProfile, "submit a profile")?;
        match collect_profile(raw) {
            Ok(profile) => Ok(self.profile.insert(profile)),
            Err(e) => {
                debug!("Profile rejected: {} field(s) invalid", e.errors.len());
                Err(PipelineError::Validation(e))
            }
        }
    }

    /// Store an already validated profile.
    pub fn set_profile(&mut self, profile: UserProfile) -> Result<(), PipelineError> {
        self.expect_stage(Stage::AwaitingProfile, "set a profile")?;
        self.profile = Some(profile);
        Ok(())
    }

    /// Evaluate the stored profile and localize the summary and verdict.
    ///
    /// An empty `languages` slice means the configured default languages.
    /// Per-language failures are reported in the output, not as an error.
    pub async fn complete(&mut self, languages: &[Language]) -> Result<RunOutput, PipelineError> {
        self.expect_stage(Stage::AwaitingProfile, "evaluate eligibility")?;
        let (summary, profile) = match (self.summary.clone(), self.profile.clone()) {
            (Some(s), Some(p)) => (s, p),
            _ => {
                return Err(PipelineError::InvalidTransition {
                    stage: self.stage,
                    action: "evaluate eligibility before a profile is set",
                })
            }
        };
        let languages: Vec<Language> = if languages.is_empty() {
            self.config.languages.clone()
        } else {
            languages.to_vec()
        };

        self.enter(Stage::Evaluating);
        let eval_start = Instant::now();
        self.stats.model_requests += 1;
        let verdict = evaluate::evaluate(self.service.as_ref(), &summary, &profile, &self.config).await;
        self.stats.evaluation_duration_ms = eval_start.elapsed().as_millis() as u64;
        let verdict = self.check(verdict)?;
        self.verdict = Some(verdict.clone());

        self.enter(Stage::Translating);
        let translate_start = Instant::now();
        self.stats.model_requests += translate::remote_count(&languages);
        let localized = translate::translate(
            self.service.as_ref(),
            &summary,
            &verdict,
            &languages,
            &self.config,
        )
        .await;
        self.stats.translation_duration_ms = translate_start.elapsed().as_millis() as u64;
        self.stats.languages_requested = translate::dedup_languages(&languages).len();
        self.stats.languages_failed = localized.failures.len();
        self.stats.total_duration_ms = self
            .started
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or_default();

        self.enter(Stage::Done);
        info!(
            "Done: {} in {}/{} languages, {} model requests, {}ms",
            verdict.verdict.label(),
            localized.len(),
            self.stats.languages_requested,
            self.stats.model_requests,
            self.stats.total_duration_ms
        );

        Ok(RunOutput {
            summary,
            verdict,
            localized,
            stats: self.stats.clone(),
        })
    }

    fn expect_stage(&self, expected: Stage, action: &'static str) -> Result<(), PipelineError> {
        if self.stage == expected {
            return Ok(());
        }
        if let (Stage::Failed, Some(e)) = (self.stage, &self.failure) {
            return Err(PipelineError::SessionFailed {
                message: e.to_string(),
            });
        }
        Err(PipelineError::InvalidTransition {
            stage: self.stage,
            action,
        })
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Stage {} → {}", self.stage, stage);
        self.stage = stage;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_change(stage);
        }
    }

    /// Pass `Ok` through; on `Err` move to [`Stage::Failed`] and keep a copy.
    fn check<T>(&mut self, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
        result.map_err(|e| {
            error!("{}", e);
            self.failure = Some(e.clone());
            self.enter(Stage::Failed);
            e
        })
    }
}

/// Run the whole pipeline on an in-memory document and a validated profile.
///
/// # Errors
/// The first fatal [`PipelineError`]. Failed translations are not errors;
/// check [`RunOutput::is_partial`].
pub async fn run(
    document: RawDocument,
    profile: &UserProfile,
    languages: &[Language],
    config: &PipelineConfig,
) -> Result<RunOutput, PipelineError> {
    let mut session = Session::from_config(config.clone())?;
    session.ingest(document).await?;
    session.set_profile(profile.clone())?;
    session.complete(languages).await
}

/// Blocking wrapper around [`run`] that owns its own tokio runtime.
pub fn run_sync(
    document: RawDocument,
    profile: &UserProfile,
    languages: &[Language],
    config: &PipelineConfig,
) -> Result<RunOutput, PipelineError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PipelineError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(document, profile, languages, config))
}

/// Like [`run`], reading the document from a local path or an HTTP(S) URL.
pub async fn run_from_input(
    input_str: impl AsRef<str>,
    profile: &UserProfile,
    languages: &[Language],
    config: &PipelineConfig,
) -> Result<RunOutput, PipelineError> {
    let document = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    run(document, profile, languages, config).await
}
