use log::{debug, error, info};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the logging system
/// This should be called once at application startup. `log` records emitted by
/// the application layer are forwarded into the same `tracing` subscriber.
pub fn init_logger() {
    INIT.call_once(|| {
        let max_level = std::env::var("ORGSYNC_LOG_LEVEL")
            .ok()
            .and_then(|level| level.parse::<tracing::Level>().ok())
            .unwrap_or(tracing::Level::INFO);

        let installed = tracing_subscriber::fmt()
            .with_max_level(max_level)
            .with_target(true)
            .try_init();

        match installed {
            Ok(()) => info!("Logging system initialized at {}", max_level),
            Err(e) => eprintln!("Logging already initialized elsewhere: {}", e),
        }
    });
}

/// Macro for structured logging with context
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// Structured logging helpers for common patterns
pub struct LogContext;

impl LogContext {
    /// Log registry calls
    pub fn registry_call(operation: &str, subject: &str, status: &str, duration_ms: Option<u64>) {
        match duration_ms {
            Some(duration) => info!(
                "Registry: {} '{}' {} in {}ms",
                operation, subject, status, duration
            ),
            None => debug!("Registry: Starting {} '{}'", operation, subject),
        }
    }

    /// Log reconciliation progress
    pub fn unit_progress(current: usize, total: usize, organisation_id: &str) {
        info!(
            "Reconcile: [{}/{}] Processing parent unit '{}'",
            current, total, organisation_id
        );
    }

    /// Log stage summaries for one run
    pub fn stage_summary(run_key: &str, stage: &str, detail: &str) {
        info!("Run {}: {} - {}", run_key, stage, detail);
    }

    /// Log errors with context
    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!("{}: {}", context, error);
    }

    /// Log performance metrics
    pub fn performance_metric(operation: &str, duration_ms: u64, additional_info: Option<&str>) {
        match additional_info {
            Some(info) => info!(
                "Performance: {} took {}ms ({})",
                operation, duration_ms, info
            ),
            None => info!("Performance: {} took {}ms", operation, duration_ms),
        }
    }
}

/// Helper for timing operations
pub struct TimedOperation {
    start: std::time::Instant,
    operation: String,
}

impl TimedOperation {
    pub fn new(operation: &str) -> Self {
        debug!("Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation: operation.to_string(),
        }
    }

    pub fn finish(self) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        LogContext::performance_metric(&self.operation, duration, None);
        duration
    }

    pub fn finish_with_info(self, info: &str) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        LogContext::performance_metric(&self.operation, duration, Some(info));
        duration
    }
}
