use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::reference_cache::{CacheKey, ReferenceCache};
use crate::modules::ingestion::domain::RawRow;
use crate::modules::registry::application::ports::OrganisationRegistry;
use crate::modules::registry::domain::{
    NewOrganisation, OrganisationReference, SubsidiaryLink, SystemIdentity,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::resilience::ResiliencePipeline;
use crate::shared::utils::logger::LogContext;

/// Finds or creates registry organisations for upload rows.
///
/// Every registry call goes through the resilience pipeline. Lookups are
/// remembered for the rest of the run.
#[derive(Clone)]
pub struct OrganisationResolver {
    registry: Arc<dyn OrganisationRegistry>,
    pipeline: ResiliencePipeline,
    cache: Arc<ReferenceCache>,
}

impl OrganisationResolver {
    pub fn new(
        registry: Arc<dyn OrganisationRegistry>,
        pipeline: ResiliencePipeline,
        cache: Arc<ReferenceCache>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            cache,
        }
    }

    /// Companies House number, then the uploader's organisation id, then
    /// name, then create
    pub async fn resolve_parent(
        &self,
        row: &RawRow,
        identity: &SystemIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<OrganisationReference> {
        let registry = self.registry.as_ref();

        if let Some(number) = row.companies_house_number() {
            let found = self
                .lookup(
                    CacheKey::companies_house(number),
                    "lookup_by_companies_house_number",
                    cancel,
                    move || registry.lookup_by_companies_house_number(number),
                )
                .await?;
            if let Some(reference) = found {
                return Ok(reference);
            }
        }

        let reference_number = row.organisation_id.trim();
        if !reference_number.is_empty() {
            let found = self
                .lookup(
                    CacheKey::reference(reference_number),
                    "lookup_by_reference_number",
                    cancel,
                    move || registry.lookup_by_reference_number(reference_number),
                )
                .await?;
            if let Some(reference) = found {
                return Ok(reference);
            }
        }

        if let Some(reference) = self.lookup_name(row, cancel).await? {
            return Ok(reference);
        }

        self.create(row, Some(reference_number), false, identity, cancel)
            .await
    }

    /// Companies House number, then name, then create
    pub async fn resolve_subsidiary(
        &self,
        row: &RawRow,
        identity: &SystemIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<OrganisationReference> {
        let registry = self.registry.as_ref();

        if let Some(number) = row.companies_house_number() {
            let found = self
                .lookup(
                    CacheKey::companies_house(number),
                    "lookup_by_companies_house_number",
                    cancel,
                    move || registry.lookup_by_companies_house_number(number),
                )
                .await?;
            if let Some(reference) = found {
                return Ok(reference);
            }
        }

        if let Some(reference) = self.lookup_name(row, cancel).await? {
            return Ok(reference);
        }

        self.create(row, row.subsidiary_id(), true, identity, cancel)
            .await
    }

    /// Make sure the parent/subsidiary relationship is recorded. An existing
    /// relationship, or a conflict while linking, counts as done.
    pub async fn ensure_link(
        &self,
        parent: &OrganisationReference,
        child: &OrganisationReference,
        row: &RawRow,
        identity: &SystemIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let registry = self.registry.as_ref();
        let (parent_id, child_id) = (parent.id, child.id);

        let exists = self
            .pipeline
            .execute("relationship_exists", cancel, move || {
                registry.relationship_exists(parent_id, child_id)
            })
            .await?;
        if exists {
            log::debug!("{} already linked to {}", child.name, parent.name);
            return Ok(());
        }

        let link = SubsidiaryLink {
            parent_id,
            child_id,
            joiner_date: row.joiner_date().and_then(Result::ok),
            reporting_type: row.reporting_type().map(str::to_string),
            franchisee_licensee_tenant: row.is_franchisee(),
            created_by: *identity,
        };
        let link = &link;

        let started = Instant::now();
        match self
            .pipeline
            .execute("link_subsidiary", cancel, move || registry.link_subsidiary(link))
            .await
        {
            Ok(()) => {
                LogContext::registry_call(
                    "link_subsidiary",
                    &child.name,
                    "linked",
                    Some(started.elapsed().as_millis() as u64),
                );
                Ok(())
            }
            Err(AppError::Conflict(detail)) => {
                log::debug!("Link conflict treated as existing relationship: {}", detail);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn lookup_name(
        &self,
        row: &RawRow,
        cancel: &CancellationToken,
    ) -> AppResult<Option<OrganisationReference>> {
        let registry = self.registry.as_ref();
        let name = row.organisation_name.trim();
        self.lookup(CacheKey::name(name), "lookup_by_name", cancel, move || {
            registry.lookup_by_name(name)
        })
        .await
    }

    async fn lookup<F, Fut>(
        &self,
        key: CacheKey,
        operation: &str,
        cancel: &CancellationToken,
        call: F,
    ) -> AppResult<Option<OrganisationReference>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<Option<OrganisationReference>>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Some(hit));
        }

        let started = Instant::now();
        let found = self.pipeline.execute(operation, cancel, call).await?;
        LogContext::registry_call(
            operation,
            &format!("{:?}", key),
            if found.is_some() { "found" } else { "not found" },
            Some(started.elapsed().as_millis() as u64),
        );

        if let Some(reference) = &found {
            self.cache.remember(key, reference);
        }
        Ok(found)
    }

    async fn create(
        &self,
        row: &RawRow,
        reference_number: Option<&str>,
        is_subsidiary: bool,
        identity: &SystemIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<OrganisationReference> {
        let registry = self.registry.as_ref();
        let organisation = NewOrganisation {
            name: row.organisation_name.trim().to_string(),
            companies_house_number: row.companies_house_number().map(str::to_string),
            reference_number: reference_number
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            nation_code: row.nation_code().map(str::to_uppercase),
            is_subsidiary,
            created_by: *identity,
        };
        let organisation = &organisation;

        let started = Instant::now();
        let created = self
            .pipeline
            .execute("create_organisation", cancel, move || {
                registry.create_organisation(organisation)
            })
            .await?;
        LogContext::registry_call(
            "create_organisation",
            &created.name,
            "created",
            Some(started.elapsed().as_millis() as u64),
        );

        self.cache.remember(CacheKey::name(&created.name), &created);
        Ok(created)
    }
}
