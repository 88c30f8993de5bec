//! Progress-callback trait for stage and per-language events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages.
//!
//! Callbacks keep the library ignorant of how the host reports progress: a
//! terminal spinner, a web socket, a log line. The trait is `Send + Sync`
//! because translations run concurrently.
//!
//! # Example
//!
//! ```rust
//! use scheme_eligibility::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl PipelineProgressCallback for StageLogger {
//!     fn on_stage_change(&self, stage: Stage) {
//!         eprintln!("now {stage}");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::orchestrator::Stage;
use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_translation_start`, `on_translation_complete` and
/// `on_translation_error` may be called concurrently for different
/// languages.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called on every state-machine transition, including into
    /// [`Stage::Failed`].
    fn on_stage_change(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called just before the model request for a language is sent.
    fn on_translation_start(&self, language: &str, total: usize) {
        let _ = (language, total);
    }

    /// Called when a language has been rendered.
    ///
    /// # Arguments
    /// * `language`: ISO 639-1 code
    /// * `total`   : languages requested
    /// * `text_len`: byte length of the rendered text
    fn on_translation_complete(&self, language: &str, total: usize, text_len: usize) {
        let _ = (language, total, text_len);
    }

    /// Called when a language failed. The run continues.
    fn on_translation_error(&self, language: &str, total: usize, error: &str) {
        let _ = (language, total, error);
    }

    /// Called once after every language has been attempted.
    fn on_run_complete(&self, requested: usize, succeeded: usize) {
        let _ = (requested, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_stage_change(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_translation_complete(&self, _language: &str, _total: usize, _text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_translation_error(&self, _language: &str, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_change(Stage::Extracting);
        cb.on_translation_start("hi", 3);
        cb.on_translation_complete("hi", 3, 42);
        cb.on_translation_error("te", 3, "timeout");
        cb.on_run_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_stage_change(Stage::Extracting);
        tracker.on_stage_change(Stage::Summarizing);
        tracker.on_translation_complete("en", 2, 10);
        tracker.on_translation_error("hi", 2, "boom");

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![Stage::Extracting, Stage::Summarizing]
        );
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_change(Stage::Done);
        cb.on_run_complete(1, 1);
    }
}
