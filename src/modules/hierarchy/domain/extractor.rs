use super::parent_unit::ParentUnit;
use crate::modules::ingestion::domain::{RowRole, ValidatedRecord};
use crate::modules::reconciliation::domain::OutcomeRecord;
use crate::shared::validation::validation_rules::PARENT_OR_CHILD_INVALID;
use crate::shared::validation::RowError;
use std::collections::HashMap;

/// Units ready for reconciliation plus the rows already decided
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub units: Vec<ParentUnit>,
    /// Validation failures, orphans and duplicates, in file order
    pub outcomes: Vec<OutcomeRecord>,
}

impl Extraction {
    pub fn subsidiary_count(&self) -> usize {
        self.units.iter().map(|unit| unit.subsidiaries().len()).sum()
    }
}

/// Groups validated rows into parent units in one stable pass
pub struct HierarchyExtractor;

impl HierarchyExtractor {
    pub fn extract(records: &[ValidatedRecord]) -> Extraction {
        let mut extraction = Extraction::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let row = &record.row;

            if row.trailing_blank {
                continue;
            }
            if !record.is_clean() {
                extraction
                    .outcomes
                    .push(OutcomeRecord::validation_failed(row, record.errors.clone()));
                continue;
            }

            let key = row.organisation_id.trim().to_string();
            match row.role() {
                Some(RowRole::Parent) => match index.get(&key) {
                    // First definition wins
                    Some(&position) => extraction.units[position]
                        .duplicate_parent_rows
                        .push(row.clone()),
                    None => {
                        index.insert(key, extraction.units.len());
                        extraction.units.push(ParentUnit::new(row.clone()));
                    }
                },
                Some(RowRole::Child) => match index.get(&key) {
                    Some(&position) => {
                        if let Err(duplicate) =
                            extraction.units[position].add_subsidiary(row.clone())
                        {
                            extraction.outcomes.push(OutcomeRecord::validation_failed(
                                &duplicate,
                                vec![RowError::field(
                                    "subsidiary_id",
                                    format!(
                                        "Duplicate subsidiary_id '{}' for organisation_id '{}'.",
                                        duplicate.subsidiary_id.trim(),
                                        key
                                    ),
                                )],
                            ));
                        }
                    }
                    None => extraction.outcomes.push(OutcomeRecord::validation_failed(
                        row,
                        vec![RowError::field(
                            "organisation_id",
                            format!("No parent row found for organisation_id '{}'.", key),
                        )],
                    )),
                },
                None => extraction.outcomes.push(OutcomeRecord::validation_failed(
                    row,
                    vec![RowError::field("parent_child", PARENT_OR_CHILD_INVALID)],
                )),
            }
        }

        log::debug!(
            "Extracted {} parent unit(s), {} subsidiary row(s), {} early outcome(s)",
            extraction.units.len(),
            extraction.subsidiary_count(),
            extraction.outcomes.len()
        );

        extraction
    }
}
