//! # scheme-eligibility
//!
//! Check whether a person qualifies for an Indian government welfare scheme,
//! starting from the scheme's PDF, and explain the answer in the languages
//! they read.
//!
//! ## Why this crate?
//!
//! Scheme documents are long, legal and English-only. This crate reads the
//! text layer of the PDF, has an LLM condense it into benefits, criteria and
//! required documents, compares the criteria against a validated user
//! profile, and renders the verdict in plain language. Every model reply is
//! a strict JSON contract, so a malformed reply is an error and never a
//! guessed verdict.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    page text via pdf-extract (CPU-bound, spawn_blocking)
//!  ├─ 2. Summarize  budgeted prompt → benefits / criteria / documents
//!  ├─ 3. Profile    age, income, category, state (+ optional fields)
//!  ├─ 4. Evaluate   ELIGIBLE / NOT_ELIGIBLE / UNCERTAIN + rationale
//!  └─ 5. Localize   English locally, other languages concurrently
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scheme_eligibility::{collect_profile, run_from_input, PipelineConfig, RawProfile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = PipelineConfig::default();
//!     let profile = collect_profile(&RawProfile::new("65", "₹80,000", "General", "Telangana"))?;
//!     let output = run_from_input("scheme.pdf", &profile, &[], &config).await?;
//!     for (lang, text) in &output.localized.entries {
//!         println!("── {lang} ──\n{text}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scheme-check` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! scheme-eligibility = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageSeparator, PipelineConfig, PipelineConfigBuilder};
pub use error::{FieldError, PipelineError, ProfileField, TranslationError, ValidationError};
pub use orchestrator::{run, run_from_input, run_sync, Session, Stage};
pub use output::{
    Category, EligibilityVerdict, ExtractedText, Gender, ImportantDetails, IndianState, Language,
    LocalizedResult,
    RawDocument, RunOutput, RunStats, SchemeSummary, UserProfile, Verdict,
};
pub use pipeline::profile::{collect_profile, RawProfile};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use service::{LlmService, ModelError, ModelService};
