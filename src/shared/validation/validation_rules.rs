use super::validation_chain::{RowError, ValidationChain, ValidationResult, ValidationRule};
use crate::modules::ingestion::domain::raw_row::{RawRow, RowRole, NATION_CODES};
use regex::Regex;
use std::sync::{Arc, OnceLock};

pub const ORGANISATION_ID_REQUIRED: &str = "Organisation_id is required.";
pub const INVALID_ORGANISATION_NAME: &str = "Invalid organisation_name format.";
pub const ORGANISATION_NUMBER_REQUIRED: &str = "Organisation_number is required.";
pub const PARENT_OR_CHILD_REQUIRED: &str = "parent_or_child is required.";
pub const PARENT_OR_CHILD_INVALID: &str = "parent_or_child must be 'Parent' or 'Child'.";
pub const SUBSIDIARY_ID_REQUIRED: &str = "Subsidiary_id is required for child rows.";
pub const INVALID_JOINER_DATE: &str = "Invalid joiner_date format.";
pub const INVALID_NATION_CODE: &str = "Invalid nation_code.";

/// Printable text up to the registry's 160 character limit
fn organisation_name_format() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| Regex::new(r"^[^\p{Cc}]{1,160}$").expect("organisation name pattern"))
}

/// Surfaces parser problems (field count, encoding) as a row error
pub struct MalformedRowRule;

impl ValidationRule<RawRow> for MalformedRowRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        match &row.malformed {
            Some(reason) => ValidationResult::invalid(RowError::general(reason.clone())),
            None => ValidationResult::valid(),
        }
    }

    fn rule_name(&self) -> &'static str {
        "MalformedRow"
    }
}

pub struct OrganisationIdRule;

impl ValidationRule<RawRow> for OrganisationIdRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        if row.organisation_id.trim().is_empty() {
            return ValidationResult::invalid(RowError::field(
                "organisation_id",
                ORGANISATION_ID_REQUIRED,
            ));
        }
        ValidationResult::valid()
    }

    fn rule_name(&self) -> &'static str {
        "OrganisationId"
    }
}

pub struct OrganisationNameRule;

impl ValidationRule<RawRow> for OrganisationNameRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        let name = row.organisation_name.trim();
        if name.is_empty() || !organisation_name_format().is_match(name) {
            return ValidationResult::invalid(RowError::field(
                "organisation_name",
                INVALID_ORGANISATION_NAME,
            ));
        }
        ValidationResult::valid()
    }

    fn rule_name(&self) -> &'static str {
        "OrganisationName"
    }
}

/// Companies House number is only demanded once a name is supplied
pub struct CompaniesHouseNumberRule;

impl ValidationRule<RawRow> for CompaniesHouseNumberRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        if row.companies_house_number.trim().is_empty() {
            return ValidationResult::invalid(RowError::field(
                "companies_house_number",
                ORGANISATION_NUMBER_REQUIRED,
            ));
        }
        ValidationResult::valid()
    }

    fn rule_name(&self) -> &'static str {
        "CompaniesHouseNumber"
    }

    fn should_skip(&self, row: &RawRow) -> bool {
        row.organisation_name.trim().is_empty()
    }
}

pub struct ParentChildRule;

impl ValidationRule<RawRow> for ParentChildRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        if row.parent_child.trim().is_empty() {
            return ValidationResult::invalid(RowError::field(
                "parent_child",
                PARENT_OR_CHILD_REQUIRED,
            ));
        }
        if row.role().is_none() {
            return ValidationResult::invalid(RowError::field(
                "parent_child",
                PARENT_OR_CHILD_INVALID,
            ));
        }
        ValidationResult::valid()
    }

    fn rule_name(&self) -> &'static str {
        "ParentChild"
    }
}

/// Child rows are keyed by subsidiary id inside their parent unit
pub struct SubsidiaryIdRule;

impl ValidationRule<RawRow> for SubsidiaryIdRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        if row.subsidiary_id().is_none() {
            return ValidationResult::invalid(RowError::field(
                "subsidiary_id",
                SUBSIDIARY_ID_REQUIRED,
            ));
        }
        ValidationResult::valid()
    }

    fn rule_name(&self) -> &'static str {
        "SubsidiaryId"
    }

    fn should_skip(&self, row: &RawRow) -> bool {
        row.role() != Some(RowRole::Child)
    }
}

pub struct JoinerDateRule;

impl ValidationRule<RawRow> for JoinerDateRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        match row.joiner_date() {
            Some(Err(_)) => {
                ValidationResult::invalid(RowError::field("joiner_date", INVALID_JOINER_DATE))
            }
            _ => ValidationResult::valid(),
        }
    }

    fn rule_name(&self) -> &'static str {
        "JoinerDate"
    }
}

pub struct NationCodeRule;

impl ValidationRule<RawRow> for NationCodeRule {
    fn validate(&self, row: &RawRow) -> ValidationResult {
        match row.nation_code() {
            Some(code) if !NATION_CODES.contains(&code.to_uppercase().as_str()) => {
                ValidationResult::invalid(RowError::field("nation_code", INVALID_NATION_CODE))
            }
            _ => ValidationResult::valid(),
        }
    }

    fn rule_name(&self) -> &'static str {
        "NationCode"
    }
}

/// Factory for creating validation chains
pub struct ValidationChainBuilder;

impl ValidationChainBuilder {
    /// Every rule a subsidiary upload row must pass, in reporting order
    pub fn upload_row_chain() -> ValidationChain<RawRow> {
        ValidationChain::new()
            .add_rule(Arc::new(MalformedRowRule))
            .add_rule(Arc::new(OrganisationIdRule))
            .add_rule(Arc::new(OrganisationNameRule))
            .add_rule(Arc::new(CompaniesHouseNumberRule))
            .add_rule(Arc::new(ParentChildRule))
            .add_rule(Arc::new(SubsidiaryIdRule))
            .add_rule(Arc::new(JoinerDateRule))
            .add_rule(Arc::new(NationCodeRule))
    }
}
