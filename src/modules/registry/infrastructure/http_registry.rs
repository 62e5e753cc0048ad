use async_trait::async_trait;
use uuid::Uuid;

use super::http_client::RegistryHttpClient;
use crate::modules::registry::application::ports::OrganisationRegistry;
use crate::modules::registry::domain::{NewOrganisation, OrganisationReference, SubsidiaryLink};
use crate::shared::config::ApiOptions;
use crate::shared::errors::AppResult;
use crate::shared::utils::logger::LogContext;

/// Organisation registry reached over its REST API
pub struct HttpOrganisationRegistry {
    http: RegistryHttpClient,
}

impl HttpOrganisationRegistry {
    pub fn new(options: &ApiOptions) -> AppResult<Self> {
        Ok(Self {
            http: RegistryHttpClient::new(options)?,
        })
    }
}

#[async_trait]
impl OrganisationRegistry for HttpOrganisationRegistry {
    async fn lookup_by_companies_house_number(
        &self,
        number: &str,
    ) -> AppResult<Option<OrganisationReference>> {
        LogContext::registry_call("lookup_by_companies_house_number", number, "started", None);
        let path = format!(
            "/organisations/companies-house/{}",
            urlencoding::encode(number)
        );
        self.http
            .get_optional("lookup_by_companies_house_number", &path, &[])
            .await
    }

    async fn lookup_by_reference_number(
        &self,
        reference: &str,
    ) -> AppResult<Option<OrganisationReference>> {
        LogContext::registry_call("lookup_by_reference_number", reference, "started", None);
        let path = format!("/organisations/reference/{}", urlencoding::encode(reference));
        self.http
            .get_optional("lookup_by_reference_number", &path, &[])
            .await
    }

    async fn lookup_by_name(&self, name: &str) -> AppResult<Option<OrganisationReference>> {
        LogContext::registry_call("lookup_by_name", name, "started", None);
        let candidates: Option<Vec<OrganisationReference>> = self
            .http
            .get_optional("lookup_by_name", "/organisations", &[("name", name)])
            .await?;

        // The search is fuzzy; only an exact name counts as a match
        Ok(candidates
            .unwrap_or_default()
            .into_iter()
            .find(|candidate| candidate.matches_name(name)))
    }

    async fn create_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> AppResult<OrganisationReference> {
        LogContext::registry_call("create_organisation", &organisation.name, "started", None);
        self.http
            .post_json("create_organisation", "/organisations", organisation)
            .await
    }

    async fn link_subsidiary(&self, link: &SubsidiaryLink) -> AppResult<()> {
        let path = format!("/organisations/{}/subsidiaries", link.parent_id);
        self.http.post_unit("link_subsidiary", &path, link).await
    }

    async fn relationship_exists(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool> {
        let path = format!("/organisations/{}/subsidiaries/{}", parent_id, child_id);
        self.http.exists("relationship_exists", &path).await
    }
}
