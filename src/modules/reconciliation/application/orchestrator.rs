use crate::log_info;
use crate::modules::hierarchy::domain::ParentUnit;
use crate::modules::ingestion::domain::RawRow;
use crate::modules::reconciliation::domain::{OutcomeRecord, RunContext};
use crate::modules::registry::application::ports::{OrganisationRegistry, SystemIdentityProvider};
use crate::modules::registry::domain::{OrganisationReference, SystemIdentity};
use crate::shared::errors::AppError;
use crate::shared::resilience::ResiliencePipeline;
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::shared::validation::RowError;

use super::organisation_resolver::OrganisationResolver;
use super::reference_cache::ReferenceCache;
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CANCELLED_MESSAGE: &str = "Reconciliation was cancelled.";

/// Append-only sink for outcomes produced by concurrently running units
#[derive(Default)]
struct OutcomeCollector {
    records: Mutex<Vec<OutcomeRecord>>,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl OutcomeCollector {
    async fn push(&self, outcome: OutcomeRecord) {
        if outcome.is_success() {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.records.lock().await.push(outcome);
    }

    fn into_sorted(self) -> Vec<OutcomeRecord> {
        let mut records = self.records.into_inner();
        records.sort_by_key(|outcome| outcome.row_number);
        records
    }
}

/// Reconciles parent units against the registry, several units at a time
#[derive(Clone)]
pub struct ReconciliationOrchestrator {
    registry: Arc<dyn OrganisationRegistry>,
    identity: Arc<dyn SystemIdentityProvider>,
    pipeline: ResiliencePipeline,
    max_concurrent_units: usize,
}

impl ReconciliationOrchestrator {
    pub fn new(
        registry: Arc<dyn OrganisationRegistry>,
        identity: Arc<dyn SystemIdentityProvider>,
        pipeline: ResiliencePipeline,
        max_concurrent_units: usize,
    ) -> Self {
        Self {
            registry,
            identity,
            pipeline,
            max_concurrent_units: max_concurrent_units.max(1),
        }
    }

    /// One outcome per row in `units`, ordered by row number
    pub async fn orchestrate(
        &self,
        units: Vec<ParentUnit>,
        context: &RunContext,
    ) -> Vec<OutcomeRecord> {
        let timer = TimedOperation::new("reconcile_parent_units");
        let total_units = units.len();
        let collector = OutcomeCollector::default();

        if total_units == 0 {
            return Vec::new();
        }

        let identity_provider = self.identity.as_ref();
        let identity = match self
            .pipeline
            .execute("system_identity", &context.cancellation, move || {
                identity_provider.system_identity()
            })
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                LogContext::error_with_context(&e, "Could not resolve system identity");
                for unit in &units {
                    Self::fail_unit(unit, &collector, &e, None).await;
                }
                return collector.into_sorted();
            }
        };

        // Fresh cache per run
        let resolver = OrganisationResolver::new(
            self.registry.clone(),
            self.pipeline.clone(),
            Arc::new(ReferenceCache::new()),
        );
        let concurrency = self.max_concurrent_units.min(total_units);
        log_info!(
            "Reconciling {} parent unit(s) with concurrency {}",
            total_units,
            concurrency
        );

        stream::iter(units.iter().enumerate().map(|(index, unit)| {
            let resolver = &resolver;
            let collector = &collector;
            async move {
                LogContext::unit_progress(index + 1, total_units, unit.organisation_id());
                Self::reconcile_unit(resolver, unit, &identity, context, collector).await;
            }
        }))
        .buffer_unordered(concurrency)
        .collect::<Vec<()>>()
        .await;

        log_info!(
            "Reconciliation finished: {} succeeded, {} failed",
            collector.succeeded.load(Ordering::Relaxed),
            collector.failed.load(Ordering::Relaxed)
        );
        timer.finish();

        collector.into_sorted()
    }

    async fn reconcile_unit(
        resolver: &OrganisationResolver,
        unit: &ParentUnit,
        identity: &SystemIdentity,
        context: &RunContext,
        collector: &OutcomeCollector,
    ) {
        let cancel = &context.cancellation;

        let parent = match resolver.resolve_parent(&unit.parent, identity, cancel).await {
            Ok(parent) => parent,
            Err(e) => {
                Self::fail_unit(unit, collector, &e, Some(&unit.parent.organisation_name)).await;
                return;
            }
        };

        collector
            .push(OutcomeRecord::succeeded(&unit.parent, parent.clone()))
            .await;
        for duplicate in &unit.duplicate_parent_rows {
            collector
                .push(OutcomeRecord::succeeded(duplicate, parent.clone()))
                .await;
        }

        for row in unit.subsidiaries() {
            let reconciled =
                Self::reconcile_subsidiary(resolver, &parent, row, identity, context).await;
            let outcome = match reconciled {
                Ok(child) => OutcomeRecord::succeeded(row, child),
                Err(e) => Self::failure(row, &e),
            };
            collector.push(outcome).await;
        }
    }

    async fn reconcile_subsidiary(
        resolver: &OrganisationResolver,
        parent: &OrganisationReference,
        row: &RawRow,
        identity: &SystemIdentity,
        context: &RunContext,
    ) -> Result<OrganisationReference, AppError> {
        let cancel = &context.cancellation;
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled(row.describe()));
        }

        let child = resolver.resolve_subsidiary(row, identity, cancel).await?;
        resolver
            .ensure_link(parent, &child, row, identity, cancel)
            .await?;
        Ok(child)
    }

    /// Every row of the unit fails. The parent row carries the cause; the
    /// others point at their parent.
    async fn fail_unit(
        unit: &ParentUnit,
        collector: &OutcomeCollector,
        error: &AppError,
        parent_name: Option<&str>,
    ) {
        collector.push(Self::failure(&unit.parent, error)).await;

        let dependent_error = match (error, parent_name) {
            (AppError::Cancelled(_), _) => RowError::general(CANCELLED_MESSAGE),
            (_, Some(name)) => RowError::general(format!(
                "Parent organisation '{}' could not be reconciled: {}",
                name, error
            )),
            (_, None) => RowError::general(error.to_string()),
        };

        for row in unit
            .duplicate_parent_rows
            .iter()
            .chain(unit.subsidiaries().iter())
        {
            collector
                .push(OutcomeRecord::reconciliation_failed(row, dependent_error.clone()))
                .await;
        }
    }

    fn failure(row: &RawRow, error: &AppError) -> OutcomeRecord {
        match error {
            AppError::Cancelled(_) => {
                OutcomeRecord::reconciliation_failed(row, RowError::general(CANCELLED_MESSAGE))
            }
            other => OutcomeRecord::from_error(row, other),
        }
    }
}
