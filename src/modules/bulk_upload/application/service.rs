use std::io::Read;
use std::sync::Arc;

use serde::Serialize;

use crate::modules::hierarchy::domain::HierarchyExtractor;
use crate::modules::ingestion::domain::{RecordValidator, ValidatedRecord};
use crate::modules::ingestion::infrastructure::CsvRowStream;
use crate::modules::notification::application::{StatusReporter, StatusSink};
use crate::modules::notification::domain::{RunSummary, UploadEvent};
use crate::modules::reconciliation::application::ReconciliationOrchestrator;
use crate::modules::reconciliation::domain::{OutcomeRecord, RunContext};
use crate::modules::registry::application::ports::{OrganisationRegistry, SystemIdentityProvider};
use crate::modules::registry::infrastructure::{ConfiguredIdentity, HttpOrganisationRegistry};
use crate::shared::config::{IngestionOptions, PipelineConfig};
use crate::shared::errors::AppResult;
use crate::shared::resilience::{ResiliencePipeline, RetryObserver};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_debug, log_info};

/// Everything one finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub summary: RunSummary,
    /// One record per data row, ordered by row number
    pub outcomes: Vec<OutcomeRecord>,
}

/// Entry point for one uploaded subsidiary file
#[derive(Clone)]
pub struct BulkUploadService {
    ingestion: IngestionOptions,
    validator: RecordValidator,
    orchestrator: ReconciliationOrchestrator,
    reporter: StatusReporter,
}

impl BulkUploadService {
    pub fn new(
        config: &PipelineConfig,
        registry: Arc<dyn OrganisationRegistry>,
        identity: Arc<dyn SystemIdentityProvider>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self::with_pipeline(
            config,
            ResiliencePipeline::new(&config.resilience),
            registry,
            identity,
            sink,
        )
    }

    /// Same as [`BulkUploadService::new`], with retries reported to `observer`
    pub fn with_retry_observer(
        config: &PipelineConfig,
        observer: Arc<dyn RetryObserver>,
        registry: Arc<dyn OrganisationRegistry>,
        identity: Arc<dyn SystemIdentityProvider>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        let pipeline = ResiliencePipeline::new(&config.resilience).with_observer(observer);
        Self::with_pipeline(config, pipeline, registry, identity, sink)
    }

    fn with_pipeline(
        config: &PipelineConfig,
        pipeline: ResiliencePipeline,
        registry: Arc<dyn OrganisationRegistry>,
        identity: Arc<dyn SystemIdentityProvider>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            ingestion: config.ingestion.clone(),
            validator: RecordValidator::new(),
            reporter: StatusReporter::new(sink, pipeline.clone()),
            orchestrator: ReconciliationOrchestrator::new(
                registry,
                identity,
                pipeline,
                config.max_concurrent_units,
            ),
        }
    }

    /// Wire the HTTP registry and configured identity from `config`
    pub fn from_config(config: &PipelineConfig, sink: Arc<dyn StatusSink>) -> AppResult<Self> {
        config.validate()?;
        let registry = Arc::new(HttpOrganisationRegistry::new(&config.api)?);
        let identity = Arc::new(ConfiguredIdentity::from_config(config));
        Ok(Self::new(config, registry, identity, sink))
    }

    /// Forward an externally raised event to the status sink
    pub async fn notify(&self, event: &UploadEvent) {
        self.reporter.dispatch(event).await;
    }

    /// Parse, validate, group and reconcile one file, then report the result.
    ///
    /// Header, stream and row-limit failures are reported as a failed run and
    /// returned as the error. Everything else ends up in the result.
    pub async fn process_upload<R: Read>(
        &self,
        source: R,
        context: &RunContext,
    ) -> AppResult<UploadResult> {
        let timer = TimedOperation::new("process_upload");
        log_info!(
            "Run {}: processing '{}'",
            context.run_key,
            context.file_name
        );
        self.reporter.set_working(context).await;

        let records = match self.read_records(source) {
            Ok(records) => records,
            Err(e) => {
                self.reporter.report_fatal(&e, context).await;
                return Err(e);
            }
        };
        let invalid = records.iter().filter(|record| !record.is_clean()).count();
        LogContext::stage_summary(
            &context.run_key,
            "validated",
            &format!("{} row(s), {} invalid", records.len(), invalid),
        );

        let extraction = HierarchyExtractor::extract(&records);
        LogContext::stage_summary(
            &context.run_key,
            "extracted",
            &format!(
                "{} parent unit(s), {} subsidiary row(s)",
                extraction.units.len(),
                extraction.subsidiary_count()
            ),
        );

        let mut outcomes = extraction.outcomes;
        outcomes.extend(
            self.orchestrator
                .orchestrate(extraction.units, context)
                .await,
        );
        outcomes.sort_by_key(|outcome| outcome.row_number);

        let summary = self.reporter.report(&outcomes, context).await;
        timer.finish_with_info(&format!("{} row(s), {}", summary.total_rows, summary.status));
        Ok(UploadResult { summary, outcomes })
    }

    fn read_records<R: Read>(&self, source: R) -> AppResult<Vec<ValidatedRecord>> {
        let stream = CsvRowStream::open(source, &self.ingestion)?;
        if !stream.schema().ignored_columns().is_empty() {
            log_debug!(
                "Ignoring columns: {}",
                stream.schema().ignored_columns().join(", ")
            );
        }

        let mut records = Vec::new();
        for row in stream {
            records.push(self.validator.validate(row?));
        }
        Ok(records)
    }
}
