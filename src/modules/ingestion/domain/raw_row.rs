use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Date format used by the joiner_date column
pub const JOINER_DATE_FORMAT: &str = "%d/%m/%Y";

/// Nation codes accepted in the nation_code column
pub const NATION_CODES: [&str; 4] = ["EN", "SC", "WS", "NI"];

/// One CSV data row mapped onto named fields. Values are trimmed; absent
/// required values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based position among the data rows (the header is not counted)
    pub row_number: usize,
    pub organisation_id: String,
    pub subsidiary_id: String,
    pub organisation_name: String,
    pub companies_house_number: String,
    pub parent_child: String,
    pub franchisee_licensee_tenant: String,
    pub joiner_date: Option<String>,
    pub reporting_type: Option<String>,
    pub nation_code: Option<String>,
    /// Why the parser could not map this row cleanly, if it could not
    pub malformed: Option<String>,
    /// Wholly blank row with nothing but blank rows after it
    pub trailing_blank: bool,
}

/// Parent/child marker of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowRole {
    Parent,
    Child,
}

impl FromStr for RowRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parent" => Ok(RowRole::Parent),
            "child" | "subsidiary" => Ok(RowRole::Child),
            other => Err(format!("Unknown parent/child marker '{}'", other)),
        }
    }
}

impl std::fmt::Display for RowRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowRole::Parent => write!(f, "Parent"),
            RowRole::Child => write!(f, "Child"),
        }
    }
}

impl RawRow {
    /// Row the parser could not bind, keeping whatever identity it has
    pub fn malformed(row_number: usize, reason: impl Into<String>) -> Self {
        Self {
            row_number,
            malformed: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn role(&self) -> Option<RowRole> {
        self.parent_child.parse().ok()
    }

    /// True when every mapped column is empty
    pub fn is_blank(&self) -> bool {
        let optional_blank = |value: &Option<String>| value.as_deref().map_or(true, str::is_empty);

        self.organisation_id.is_empty()
            && self.subsidiary_id.is_empty()
            && self.organisation_name.is_empty()
            && self.companies_house_number.is_empty()
            && self.parent_child.is_empty()
            && self.franchisee_licensee_tenant.is_empty()
            && optional_blank(&self.joiner_date)
            && optional_blank(&self.reporting_type)
            && optional_blank(&self.nation_code)
    }

    pub fn companies_house_number(&self) -> Option<&str> {
        non_empty(&self.companies_house_number)
    }

    pub fn subsidiary_id(&self) -> Option<&str> {
        non_empty(&self.subsidiary_id)
    }

    pub fn is_franchisee(&self) -> bool {
        matches!(
            self.franchisee_licensee_tenant.to_lowercase().as_str(),
            "y" | "yes" | "true" | "1"
        )
    }

    pub fn joiner_date(&self) -> Option<Result<NaiveDate, chrono::ParseError>> {
        self.joiner_date
            .as_deref()
            .and_then(non_empty)
            .map(|raw| NaiveDate::parse_from_str(raw, JOINER_DATE_FORMAT))
    }

    pub fn nation_code(&self) -> Option<&str> {
        self.nation_code.as_deref().and_then(non_empty)
    }

    pub fn reporting_type(&self) -> Option<&str> {
        self.reporting_type.as_deref().and_then(non_empty)
    }

    /// Short label for logs
    pub fn describe(&self) -> String {
        match self.subsidiary_id() {
            Some(sub) => format!(
                "row {} ({} / {})",
                self.row_number, self.organisation_id, sub
            ),
            None => format!("row {} ({})", self.row_number, self.organisation_id),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
