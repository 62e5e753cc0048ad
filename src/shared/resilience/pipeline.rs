use super::retry_policy::RetryPolicy;
use crate::shared::config::ResilienceConfig;
use crate::shared::errors::{AppError, AppResult, RetryClass};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry budget an error was charged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryTier {
    General,
    RateLimited,
}

impl std::fmt::Display for RetryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryTier::General => write!(f, "general"),
            RetryTier::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Emitted once before every retry sleep
#[derive(Debug, Clone)]
pub struct RetryEvent {
    pub operation: String,
    pub tier: RetryTier,
    /// 1-based retry number within the tier
    pub attempt: u32,
    pub delay: Duration,
    pub cause: String,
}

/// Hook for anything that wants to watch retries besides the log
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, event: &RetryEvent);
}

/// Retry and timeout wrapper shared by every outbound registry call.
///
/// Transient failures and throttling draw from independent budgets. The
/// overall timeout covers the first attempt, every retry and every sleep.
#[derive(Clone)]
pub struct ResiliencePipeline {
    general: RetryPolicy,
    rate_limit: RetryPolicy,
    overall_timeout: Duration,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl ResiliencePipeline {
    pub fn new(config: &ResilienceConfig) -> Self {
        Self {
            general: RetryPolicy::from(&config.general),
            rate_limit: RetryPolicy::from(&config.rate_limit),
            overall_timeout: config.overall_timeout(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn policy(&self, tier: RetryTier) -> &RetryPolicy {
        match tier {
            RetryTier::General => &self.general,
            RetryTier::RateLimited => &self.rate_limit,
        }
    }

    /// Run `call` until it succeeds, fails permanently, exhausts its tier,
    /// exceeds the overall timeout, or the run is cancelled.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled(operation.to_string()));
        }

        let attempts = self.run_attempts(operation, &mut call);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation, "Cancelled while in flight");
                Err(AppError::Cancelled(operation.to_string()))
            }
            outcome = tokio::time::timeout(self.overall_timeout, attempts) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        operation,
                        timeout_ms = self.overall_timeout.as_millis() as u64,
                        "Overall timeout elapsed"
                    );
                    Err(AppError::Timeout(format!(
                        "{} did not complete within {:?}",
                        operation, self.overall_timeout
                    )))
                }
            },
        }
    }

    async fn run_attempts<F, Fut, T>(&self, operation: &str, call: &mut F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut general_retries = 0u32;
        let mut rate_limit_retries = 0u32;

        loop {
            let error = match call().await {
                Ok(value) => {
                    if general_retries + rate_limit_retries > 0 {
                        debug!(
                            operation,
                            general_retries, rate_limit_retries, "Succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let (tier, retry) = match error.retry_class() {
                RetryClass::Never => return Err(error),
                RetryClass::General => {
                    if !self.general.allows(general_retries) {
                        warn!(operation, tier = %RetryTier::General, cause = %error, "Retries exhausted");
                        return Err(error);
                    }
                    general_retries += 1;
                    (RetryTier::General, general_retries)
                }
                RetryClass::RateLimited => {
                    if !self.rate_limit.allows(rate_limit_retries) {
                        warn!(operation, tier = %RetryTier::RateLimited, cause = %error, "Retries exhausted");
                        return Err(error);
                    }
                    rate_limit_retries += 1;
                    (RetryTier::RateLimited, rate_limit_retries)
                }
            };

            let delay = self.policy(tier).calculate_delay(retry, error.retry_after());
            self.emit(RetryEvent {
                operation: operation.to_string(),
                tier,
                attempt: retry,
                delay,
                cause: error.to_string(),
            });

            sleep(delay).await;
        }
    }

    fn emit(&self, event: RetryEvent) {
        warn!(
            operation = %event.operation,
            tier = %event.tier,
            attempt = event.attempt,
            delay_ms = event.delay.as_millis() as u64,
            cause = %event.cause,
            "Retrying registry call"
        );
        if let Some(observer) = &self.observer {
            observer.on_retry(&event);
        }
    }
}
