use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::ports::StatusSink;
use crate::modules::notification::domain::{ReportedError, RunStatus, RunSummary, UploadEvent};
use crate::modules::reconciliation::domain::{OutcomeRecord, RunContext};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::resilience::ResiliencePipeline;
use crate::{log_info, log_warn};

const ANTIVIRUS_REJECTED: &str = "The file failed the antivirus check.";

/// Turns run outcomes into status updates on the sink.
///
/// Every sink call goes through the resilience pipeline. Once its retries are
/// spent the failure is logged and never changes the outcome of the run.
#[derive(Clone)]
pub struct StatusReporter {
    sink: Arc<dyn StatusSink>,
    pipeline: ResiliencePipeline,
}

impl StatusReporter {
    pub fn new(sink: Arc<dyn StatusSink>, pipeline: ResiliencePipeline) -> Self {
        Self { sink, pipeline }
    }

    pub async fn set_working(&self, context: &RunContext) {
        if let Err(e) = self.set_status(&context.run_key, RunStatus::Working).await {
            log_warn!("Run {}: could not mark as working: {}", context.run_key, e);
        }
    }

    /// Report per-row outcomes and the aggregate verdict
    pub async fn report(&self, outcomes: &[OutcomeRecord], context: &RunContext) -> RunSummary {
        let summary = Self::summarize(outcomes, &context.run_key);

        log_info!(
            "Run {}: {} ({} succeeded, {} failed of {} rows)",
            summary.run_key,
            summary.status,
            summary.succeeded,
            summary.failed,
            summary.total_rows
        );

        self.dispatch(&UploadEvent::bulk_upload_complete(
            &context.run_key,
            &context.file_name,
            summary.status,
            summary.errors.clone(),
        ))
        .await;

        summary
    }

    /// Report an error that stopped the whole run
    pub async fn report_fatal(&self, error: &AppError, context: &RunContext) -> RunSummary {
        log_warn!("Run {}: failed before reconciliation: {}", context.run_key, error);

        self.dispatch(&UploadEvent::bulk_upload_failed(
            &context.run_key,
            &context.file_name,
            error.to_string(),
        ))
        .await;

        RunSummary {
            run_key: context.run_key.clone(),
            status: RunStatus::Failed,
            total_rows: 0,
            succeeded: 0,
            failed: 0,
            errors: vec![ReportedError::file_level(error.to_string())],
        }
    }

    /// Single handler for every notification event
    pub async fn dispatch(&self, event: &UploadEvent) {
        if let Err(e) = self.handle(event).await {
            log_warn!(
                "Run {}: status update for {} was not delivered: {}",
                event.run_key(),
                event.event_type(),
                e
            );
        }
    }

    async fn handle(&self, event: &UploadEvent) -> AppResult<()> {
        match event {
            UploadEvent::AntivirusCheck { run_key, clean, .. } => {
                if *clean {
                    self.set_status(run_key, RunStatus::Working).await
                } else {
                    self.set_status(run_key, RunStatus::Failed).await?;
                    self.set_errors(run_key, vec![ReportedError::file_level(ANTIVIRUS_REJECTED)])
                        .await
                }
            }
            UploadEvent::BulkUploadComplete {
                run_key,
                status,
                errors,
                ..
            } => {
                self.set_status(run_key, *status).await?;
                if !errors.is_empty() {
                    self.set_errors(run_key, errors.clone()).await?;
                }
                Ok(())
            }
            UploadEvent::BulkUploadFailed {
                run_key, reason, ..
            } => {
                self.set_status(run_key, RunStatus::Failed).await?;
                self.set_errors(run_key, vec![ReportedError::file_level(reason.clone())])
                    .await
            }
        }
    }

    // Status must still land for cancelled runs, so sink calls never share
    // the run's cancellation token.
    async fn set_status(&self, run_key: &str, status: RunStatus) -> AppResult<()> {
        self.pipeline
            .execute("set_status", &CancellationToken::new(), || {
                self.sink.set_status(run_key, status)
            })
            .await
    }

    async fn set_errors(&self, run_key: &str, errors: Vec<ReportedError>) -> AppResult<()> {
        self.pipeline
            .execute("set_error_status", &CancellationToken::new(), || {
                self.sink.set_error_status(run_key, errors.clone())
            })
            .await
    }

    /// Aggregate verdict plus itemised errors ordered by row number
    pub fn summarize(outcomes: &[OutcomeRecord], run_key: &str) -> RunSummary {
        let mut ordered: Vec<&OutcomeRecord> = outcomes.iter().collect();
        ordered.sort_by_key(|outcome| outcome.row_number);

        let succeeded = ordered.iter().filter(|outcome| outcome.is_success()).count();
        let failed = ordered.len() - succeeded;

        let errors = ordered
            .iter()
            .filter(|outcome| !outcome.is_success())
            .flat_map(|outcome| {
                outcome.errors.iter().map(move |error| ReportedError {
                    row_number: Some(outcome.row_number),
                    field: error.field.clone(),
                    message: error.message.clone(),
                })
            })
            .collect();

        RunSummary {
            run_key: run_key.to_string(),
            status: RunStatus::from_counts(succeeded, failed),
            total_rows: ordered.len(),
            succeeded,
            failed,
            errors,
        }
    }
}
