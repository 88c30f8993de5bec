//! Model call driver: deadline, optional retry, and call logging.
//!
//! Every stage calls the model through [`call_model`] so that timeouts are
//! enforced the same way everywhere. The stage modules own their prompts
//! (see [`crate::prompts`]) and the parsing of the reply; this module only
//! moves text in and out.
//!
//! ## Retry Strategy
//!
//! `max_retries` defaults to 0: a failed call is surfaced to the caller, who
//! may resubmit. When raised, retries back off exponentially
//! (`retry_backoff_ms * 2^attempt`), so with 500 ms base and 3 retries the
//! waits are 500 ms → 1 s → 2 s.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, TranslationError};
use crate::orchestrator::Stage;
use crate::service::ModelService;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Why a model call produced no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The call did not finish within `api_timeout_secs`.
    Timeout { secs: u64 },
    /// The service returned an error.
    Failed(String),
}

impl CallError {
    /// Map to the fatal error of `stage`.
    pub fn into_pipeline_error(self, stage: Stage) -> PipelineError {
        match self {
            CallError::Timeout { secs } => PipelineError::ServiceTimeout { stage, secs },
            CallError::Failed(message) => PipelineError::ServiceFailed { stage, message },
        }
    }

    /// Map to the non-fatal error of one translation.
    pub fn into_translation_error(self, language: &str) -> TranslationError {
        match self {
            CallError::Timeout { secs } => TranslationError::Timeout {
                language: language.to_string(),
                secs,
            },
            CallError::Failed(detail) => TranslationError::Failed {
                language: language.to_string(),
                detail,
            },
        }
    }
}

/// Send `prompt` to the model and return the raw reply text.
///
/// `label` names the call in log lines (`"summary"`, `"translate:hi"`).
pub async fn call_model(
    service: &dyn ModelService,
    label: &str,
    prompt: &str,
    max_tokens: usize,
    config: &PipelineConfig,
) -> Result<String, CallError> {
    let start = Instant::now();
    let deadline = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = CallError::Failed("no attempt made".to_string());

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                label, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        debug!(
            "{}: sending {} prompt chars to {} (max {} tokens)",
            label,
            prompt.chars().count(),
            service.name(),
            max_tokens
        );

        match timeout(deadline, service.complete(prompt, max_tokens)).await {
            Ok(Ok(reply)) => {
                debug!(
                    "{}: {} reply chars in {:?}",
                    label,
                    reply.chars().count(),
                    start.elapsed()
                );
                return Ok(reply);
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed: {}", label, attempt + 1, e);
                last_err = CallError::Failed(e.to_string());
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    label,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = CallError::Timeout {
                    secs: config.api_timeout_secs,
                };
            }
        }
    }

    Err(last_err)
}

/// Wait before retry `attempt` (1-based), saturating at `u64::MAX`.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ModelError;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then echoes.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl ModelService for Flaky {
        fn complete<'a>(
            &'a self,
            prompt: &'a str,
            _max_tokens: usize,
        ) -> BoxFuture<'a, Result<String, ModelError>> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n < self.failures {
                    Err(ModelError::Api("503 overloaded".into()))
                } else {
                    Ok(prompt.to_string())
                }
            })
        }
    }

    struct Stuck;

    impl ModelService for Stuck {
        fn complete<'a>(
            &'a self,
            _prompt: &'a str,
            _max_tokens: usize,
        ) -> BoxFuture<'a, Result<String, ModelError>> {
            Box::pin(async move {
                sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            })
        }
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let svc = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let config = PipelineConfig::default();
        let err = call_model(&svc, "test", "hello", 16, &config)
            .await
            .unwrap_err();
        assert_eq!(err, CallError::Failed("503 overloaded".into()));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_when_configured() {
        let svc = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let config = PipelineConfig::builder()
            .max_retries(2)
            .retry_backoff_ms(1)
            .build()
            .unwrap();
        let reply = call_model(&svc, "test", "hello", 16, &config).await.unwrap();
        assert_eq!(reply, "hello");
        assert_eq!(svc.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_doubles_then_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(500, 70), u64::MAX);
        assert_eq!(backoff_ms(0, 70), 0);
    }

    #[tokio::test]
    async fn many_retries_do_not_overflow() {
        let svc = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        let config = PipelineConfig::builder()
            .max_retries(70)
            .retry_backoff_ms(0)
            .build()
            .unwrap();
        let err = call_model(&svc, "test", "hello", 16, &config)
            .await
            .unwrap_err();
        assert_eq!(err, CallError::Failed("503 overloaded".into()));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 71);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_becomes_timeout() {
        let config = PipelineConfig::builder().api_timeout_secs(5).build().unwrap();
        let err = call_model(&Stuck, "test", "hello", 16, &config)
            .await
            .unwrap_err();
        assert_eq!(err, CallError::Timeout { secs: 5 });

        let fatal = err.into_pipeline_error(Stage::Summarizing);
        assert!(matches!(
            fatal,
            PipelineError::ServiceTimeout {
                stage: Stage::Summarizing,
                secs: 5
            }
        ));
    }
}
