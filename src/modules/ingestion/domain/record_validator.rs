use super::raw_row::RawRow;
use crate::shared::validation::{RowError, ValidationChain, ValidationChainBuilder};
use serde::{Deserialize, Serialize};

/// A parsed row plus every problem the validator found on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub row: RawRow,
    pub errors: Vec<RowError>,
}

impl ValidatedRecord {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the upload row rules over one row at a time
#[derive(Clone)]
pub struct RecordValidator {
    chain: ValidationChain<RawRow>,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordValidator {
    pub fn new() -> Self {
        Self {
            chain: ValidationChainBuilder::upload_row_chain(),
        }
    }

    /// Validate one row. Every rule runs; errors keep rule order.
    /// Trailing blank rows are passed through without errors.
    pub fn validate(&self, row: RawRow) -> ValidatedRecord {
        if row.trailing_blank {
            return ValidatedRecord {
                row,
                errors: Vec::new(),
            };
        }

        let errors = self.chain.validate(&row).errors;
        ValidatedRecord { row, errors }
    }
}
