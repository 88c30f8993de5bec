//! Pipeline stages for scheme eligibility checking.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own. [`crate::orchestrator`] strings them together and owns the
//! stage bookkeeping.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ summarize ──▶ evaluate ──▶ translate
//! (URL/path) (pdf-extract)  (LLM)   ▲   (LLM)       (LLM × N)
//!                                   │
//!                       profile ────┘
//!                       (form validation)
//! ```
//!
//! 1. [`input`]     read a local file or download a URL into a `RawDocument`
//! 2. [`extract`]   page-ordered text; runs in `spawn_blocking`
//! 3. [`summarize`] budgeted prompt, JSON summary reply
//! 4. [`profile`]   validate the user's form fields; no I/O
//! 5. [`evaluate`]  one call, one of three verdict labels
//! 6. [`translate`] English rendered locally, other languages fanned out
//!
//! [`llm`] is the shared call driver (timeout, optional retry) and [`parse`]
//! holds the reply cleanup and schema checks.

pub mod evaluate;
pub mod extract;
pub mod input;
pub mod llm;
pub mod parse;
pub mod profile;
pub mod summarize;
pub mod translate;
