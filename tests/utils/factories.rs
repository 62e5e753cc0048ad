/// Test data factories using builder pattern
///
/// Provides convenient methods to create upload files and rows with sensible
/// defaults
use orgsync::modules::ingestion::domain::{RawRow, RecordValidator, ValidatedRecord};
use orgsync::modules::registry::domain::OrganisationReference;
use uuid::Uuid;

pub const HEADER: &str = "organisation_id,subsidiary_id,organisation_name,companies_house_number,parent_child,franchisee_licensee_tenant";

/// Builds CSV upload content line by line
#[derive(Debug, Clone)]
pub struct CsvFactory {
    header: String,
    lines: Vec<String>,
}

impl Default for CsvFactory {
    fn default() -> Self {
        Self {
            header: HEADER.to_string(),
            lines: Vec::new(),
        }
    }
}

impl CsvFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.header = header.to_string();
        self
    }

    pub fn parent(self, organisation_id: &str, name: &str, companies_house: &str) -> Self {
        self.line(&format!(
            "{},,{},{},Parent,",
            organisation_id, name, companies_house
        ))
    }

    pub fn child(
        self,
        organisation_id: &str,
        subsidiary_id: &str,
        name: &str,
        companies_house: &str,
    ) -> Self {
        self.line(&format!(
            "{},{},{},{},Child,",
            organisation_id, subsidiary_id, name, companies_house
        ))
    }

    pub fn line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut content = format!("{}\n", self.header);
        for line in &self.lines {
            content.push_str(line);
            content.push('\n');
        }
        content
    }
}

/// Builds validated rows without going through the CSV reader
#[derive(Debug, Clone)]
pub struct RowFactory {
    row: RawRow,
}

impl RowFactory {
    pub fn parent(row_number: usize, organisation_id: &str, name: &str) -> Self {
        Self {
            row: RawRow {
                row_number,
                organisation_id: organisation_id.to_string(),
                organisation_name: name.to_string(),
                companies_house_number: format!("CH-{}", name),
                parent_child: "Parent".to_string(),
                ..RawRow::default()
            },
        }
    }

    pub fn child(row_number: usize, organisation_id: &str, subsidiary_id: &str, name: &str) -> Self {
        Self {
            row: RawRow {
                row_number,
                organisation_id: organisation_id.to_string(),
                subsidiary_id: subsidiary_id.to_string(),
                organisation_name: name.to_string(),
                companies_house_number: format!("CH-{}", name),
                parent_child: "Child".to_string(),
                ..RawRow::default()
            },
        }
    }

    pub fn companies_house(mut self, number: &str) -> Self {
        self.row.companies_house_number = number.to_string();
        self
    }

    pub fn build(self) -> RawRow {
        self.row
    }

    pub fn validated(self) -> ValidatedRecord {
        RecordValidator::new().validate(self.row)
    }
}

pub fn reference(name: &str, companies_house: Option<&str>) -> OrganisationReference {
    OrganisationReference {
        id: Uuid::new_v4(),
        name: name.to_string(),
        companies_house_number: companies_house.map(str::to_string),
        reference_number: None,
    }
}
