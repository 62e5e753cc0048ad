use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::registry::domain::{NewOrganisation, OrganisationReference, SubsidiaryLink};
use crate::shared::errors::AppResult;

/// Port (interface) for the external organisation registry
/// Infrastructure layer implements this over HTTP; tests use in-memory fakes.
///
/// Lookups answer `Ok(None)` when the registry has no match. Failures carry an
/// explicit error kind so the resilience pipeline can decide on retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganisationRegistry: Send + Sync {
    async fn lookup_by_companies_house_number(
        &self,
        number: &str,
    ) -> AppResult<Option<OrganisationReference>>;

    /// Look up by the uploader's own organisation identifier
    async fn lookup_by_reference_number(
        &self,
        reference: &str,
    ) -> AppResult<Option<OrganisationReference>>;

    async fn lookup_by_name(&self, name: &str) -> AppResult<Option<OrganisationReference>>;

    async fn create_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> AppResult<OrganisationReference>;

    /// Record the relationship. An existing relationship answers `Conflict`.
    async fn link_subsidiary(&self, link: &SubsidiaryLink) -> AppResult<()>;

    async fn relationship_exists(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool>;
}
