use std::collections::HashMap;

use crate::modules::ingestion::domain::RawRow;

/// One parent row and the subsidiary rows that name it, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentUnit {
    pub parent: RawRow,
    subsidiaries: Vec<RawRow>,
    /// Position in `subsidiaries` keyed by subsidiary id
    by_subsidiary_id: HashMap<String, usize>,
    /// Later rows repeating this parent; they share the unit's verdict
    pub duplicate_parent_rows: Vec<RawRow>,
}

impl ParentUnit {
    pub fn new(parent: RawRow) -> Self {
        Self {
            parent,
            subsidiaries: Vec::new(),
            by_subsidiary_id: HashMap::new(),
            duplicate_parent_rows: Vec::new(),
        }
    }

    pub fn organisation_id(&self) -> &str {
        &self.parent.organisation_id
    }

    pub fn subsidiaries(&self) -> &[RawRow] {
        &self.subsidiaries
    }

    pub fn subsidiary(&self, subsidiary_id: &str) -> Option<&RawRow> {
        self.by_subsidiary_id
            .get(subsidiary_id)
            .map(|&index| &self.subsidiaries[index])
    }

    /// Append a child row. A repeated subsidiary id is handed back.
    pub fn add_subsidiary(&mut self, row: RawRow) -> Result<(), RawRow> {
        if let Some(id) = row.subsidiary_id() {
            if self.by_subsidiary_id.contains_key(id) {
                return Err(row);
            }
            self.by_subsidiary_id
                .insert(id.to_string(), self.subsidiaries.len());
        }
        self.subsidiaries.push(row);
        Ok(())
    }

    /// Every input row that ends up with this unit's parent verdict or a
    /// verdict of its own
    pub fn row_count(&self) -> usize {
        1 + self.subsidiaries.len() + self.duplicate_parent_rows.len()
    }
}
