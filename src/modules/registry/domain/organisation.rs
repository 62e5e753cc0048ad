use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an organisation as the registry knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationReference {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub companies_house_number: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
}

impl OrganisationReference {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Payload for registering an organisation that could not be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganisation {
    pub name: String,
    pub companies_house_number: Option<String>,
    /// Uploader's own identifier for the organisation
    pub reference_number: Option<String>,
    pub nation_code: Option<String>,
    pub is_subsidiary: bool,
    pub created_by: SystemIdentity,
}

/// Parent/subsidiary relationship to record in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsidiaryLink {
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub joiner_date: Option<NaiveDate>,
    pub reporting_type: Option<String>,
    pub franchisee_licensee_tenant: bool,
    pub created_by: SystemIdentity,
}

/// Account the pipeline acts as when it writes to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemIdentity {
    pub user_id: Uuid,
    pub organisation_id: Uuid,
}
