//! Error types for the scheme-eligibility library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`PipelineError`] is **fatal** for the run. Extraction failed, the model
//!   reply did not match its schema, the model call timed out. Every variant
//!   knows the [`Stage`] it belongs to so front-ends can tell the user where
//!   things went wrong.
//!
//! * [`TranslationError`] is **non-fatal**. One target language failed but the
//!   others are fine. Stored inside [`crate::output::LocalizedResult`] so the
//!   caller sees a partial result instead of losing every language.
//!
//! * [`ValidationError`] means the user profile form had invalid fields. Lists
//!   every bad field at once so the form can be corrected in one round trip.

use crate::orchestrator::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pipeline.
///
/// Per-language translation failures use [`TranslationError`] and are stored
/// in [`crate::output::LocalizedResult`] rather than propagated here.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    // ── Stage errors ──────────────────────────────────────────────────────
    /// The document could not be turned into text, or the text is empty.
    #[error("[{}] Could not extract text: {reason}", Stage::Extracting)]
    Extraction { reason: String },

    /// The summary reply did not match the expected schema.
    #[error("[{}] Model reply is not a valid scheme summary: {reason}\nResubmit the document to try again.", Stage::Summarizing)]
    SummaryParse { reason: String },

    /// The user profile has invalid fields.
    #[error("[awaiting_profile] {0}")]
    Validation(#[from] ValidationError),

    /// The eligibility reply did not carry a recognised verdict.
    #[error("[{}] Model reply is not a valid eligibility verdict: {reason}\nResubmit to try again.", Stage::Evaluating)]
    VerdictParse { reason: String },

    /// A model call exceeded the configured timeout.
    #[error("[{stage}] Model call timed out after {secs}s\nIncrease --api-timeout or resubmit.")]
    ServiceTimeout { stage: Stage, secs: u64 },

    /// The model service returned an error.
    #[error("[{stage}] Model service error: {message}")]
    ServiceFailed { stage: Stage, message: String },

    // ── Orchestration errors ──────────────────────────────────────────────
    /// A session operation was called in the wrong stage.
    #[error("[{stage}] Cannot {action} in stage '{stage}'")]
    InvalidTransition { stage: Stage, action: &'static str },

    /// The session already failed; the first error is kept in the session.
    #[error("[{}] Session already failed: {message}", Stage::Failed)]
    SessionFailed { message: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("[{}] LLM provider '{provider}' is not configured.\n{hint}", Stage::AwaitingDocument)]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("[{}] Document not found: '{path}'\nCheck the path exists and is readable.", Stage::AwaitingDocument)]
    FileNotFound { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("[{}] Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL", Stage::AwaitingDocument)]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("[{}] Failed to download '{url}': {reason}\nCheck your internet connection.", Stage::AwaitingDocument)]
    DownloadFailed { url: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("[awaiting_document] Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("[awaiting_document] Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// The stage at which this error occurred.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Extraction { .. } => Stage::Extracting,
            PipelineError::SummaryParse { .. } => Stage::Summarizing,
            PipelineError::Validation(_) => Stage::AwaitingProfile,
            PipelineError::VerdictParse { .. } => Stage::Evaluating,
            PipelineError::ServiceTimeout { stage, .. }
            | PipelineError::ServiceFailed { stage, .. }
            | PipelineError::InvalidTransition { stage, .. } => *stage,
            PipelineError::SessionFailed { .. } => Stage::Failed,
            PipelineError::ProviderNotConfigured { .. }
            | PipelineError::FileNotFound { .. }
            | PipelineError::InvalidInput { .. }
            | PipelineError::DownloadFailed { .. }
            | PipelineError::InvalidConfig(_)
            | PipelineError::Internal(_) => Stage::AwaitingDocument,
        }
    }

    /// True for failures caused by the document text itself.
    pub fn is_extraction(&self) -> bool {
        matches!(self, PipelineError::Extraction { .. })
    }
}

/// A non-fatal error for a single target language.
///
/// Stored in [`crate::output::LocalizedResult::failures`]. The other
/// languages of the same run are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TranslationError {
    /// The model service returned an error.
    #[error("[{}] {language}: model call failed: {detail}", Stage::Translating)]
    Failed { language: String, detail: String },

    /// The model call timed out.
    #[error("[{}] {language}: model call timed out after {secs}s", Stage::Translating)]
    Timeout { language: String, secs: u64 },

    /// The model answered with nothing usable.
    #[error("[{}] {language}: model returned an empty translation", Stage::Translating)]
    EmptyResponse { language: String },
}

impl TranslationError {
    /// Language code the failure belongs to.
    pub fn language(&self) -> &str {
        match self {
            TranslationError::Failed { language, .. }
            | TranslationError::Timeout { language, .. }
            | TranslationError::EmptyResponse { language } => language,
        }
    }
}

/// Profile form fields, used to label validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Age,
    AnnualIncome,
    Category,
    State,
    Gender,
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfileField::Age => "age",
            ProfileField::AnnualIncome => "annual income",
            ProfileField::Category => "category",
            ProfileField::State => "state",
            ProfileField::Gender => "gender",
        })
    }
}

/// One invalid profile field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: ProfileField,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every invalid field of a submitted profile.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Fields that failed, in form order.
    pub fn fields(&self) -> Vec<ProfileField> {
        self.errors.iter().map(|e| e.field).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid profile field(s)", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n  • {e}")?;
        }
        Ok(())
    }
}
