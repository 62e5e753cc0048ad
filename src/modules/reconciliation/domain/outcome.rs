use crate::modules::ingestion::domain::RawRow;
use crate::modules::registry::domain::OrganisationReference;
use crate::shared::errors::AppError;
use crate::shared::validation::RowError;
use serde::{Deserialize, Serialize};

/// Terminal state of one input row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    Succeeded,
    ValidationFailed,
    ReconciliationFailed,
}

/// Final verdict for one input row. Built once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub row_number: usize,
    pub organisation_id: String,
    pub subsidiary_id: Option<String>,
    pub organisation_name: String,
    pub reference: Option<OrganisationReference>,
    pub errors: Vec<RowError>,
    pub status: RowStatus,
}

impl OutcomeRecord {
    fn for_row(
        row: &RawRow,
        status: RowStatus,
        reference: Option<OrganisationReference>,
        errors: Vec<RowError>,
    ) -> Self {
        Self {
            row_number: row.row_number,
            organisation_id: row.organisation_id.clone(),
            subsidiary_id: row.subsidiary_id().map(str::to_string),
            organisation_name: row.organisation_name.clone(),
            reference,
            errors,
            status,
        }
    }

    pub fn succeeded(row: &RawRow, reference: OrganisationReference) -> Self {
        Self::for_row(row, RowStatus::Succeeded, Some(reference), Vec::new())
    }

    pub fn validation_failed(row: &RawRow, errors: Vec<RowError>) -> Self {
        Self::for_row(row, RowStatus::ValidationFailed, None, errors)
    }

    pub fn reconciliation_failed(row: &RawRow, error: RowError) -> Self {
        Self::for_row(row, RowStatus::ReconciliationFailed, None, vec![error])
    }

    /// Failure caused by a registry call, attributed to no particular column
    pub fn from_error(row: &RawRow, error: &AppError) -> Self {
        Self::reconciliation_failed(row, RowError::general(error.to_string()))
    }

    pub fn is_success(&self) -> bool {
        self.status == RowStatus::Succeeded
    }
}
