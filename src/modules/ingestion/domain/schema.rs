//! Column schema for the subsidiary upload file
//!
//! Binding is table driven: each known column names the setter that copies
//! its value into a [`RawRow`]. Header names match case-insensitively and
//! columns not in the table are ignored.

use super::raw_row::RawRow;
use crate::shared::errors::{AppError, AppResult};
use std::collections::HashMap;

pub struct ColumnSpec {
    pub name: &'static str,
    pub required: bool,
    pub assign: fn(&mut RawRow, String),
}

pub static COLUMNS: [ColumnSpec; 9] = [
    ColumnSpec {
        name: "organisation_id",
        required: true,
        assign: set_organisation_id,
    },
    ColumnSpec {
        name: "subsidiary_id",
        required: true,
        assign: set_subsidiary_id,
    },
    ColumnSpec {
        name: "organisation_name",
        required: true,
        assign: set_organisation_name,
    },
    ColumnSpec {
        name: "companies_house_number",
        required: true,
        assign: set_companies_house_number,
    },
    ColumnSpec {
        name: "parent_child",
        required: true,
        assign: set_parent_child,
    },
    ColumnSpec {
        name: "franchisee_licensee_tenant",
        required: true,
        assign: set_franchisee_licensee_tenant,
    },
    ColumnSpec {
        name: "joiner_date",
        required: false,
        assign: set_joiner_date,
    },
    ColumnSpec {
        name: "reporting_type",
        required: false,
        assign: set_reporting_type,
    },
    ColumnSpec {
        name: "nation_code",
        required: false,
        assign: set_nation_code,
    },
];

fn set_organisation_id(row: &mut RawRow, value: String) {
    row.organisation_id = value;
}

fn set_subsidiary_id(row: &mut RawRow, value: String) {
    row.subsidiary_id = value;
}

fn set_organisation_name(row: &mut RawRow, value: String) {
    row.organisation_name = value;
}

fn set_companies_house_number(row: &mut RawRow, value: String) {
    row.companies_house_number = value;
}

fn set_parent_child(row: &mut RawRow, value: String) {
    row.parent_child = value;
}

fn set_franchisee_licensee_tenant(row: &mut RawRow, value: String) {
    row.franchisee_licensee_tenant = value;
}

fn set_joiner_date(row: &mut RawRow, value: String) {
    row.joiner_date = Some(value);
}

fn set_reporting_type(row: &mut RawRow, value: String) {
    row.reporting_type = Some(value);
}

fn set_nation_code(row: &mut RawRow, value: String) {
    row.nation_code = Some(value);
}

/// Header row bound against [`COLUMNS`]
#[derive(Clone)]
pub struct HeaderSchema {
    bindings: Vec<(usize, &'static ColumnSpec)>,
    header_len: usize,
    ignored: Vec<String>,
}

impl std::fmt::Debug for HeaderSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderSchema")
            .field(
                "bindings",
                &self
                    .bindings
                    .iter()
                    .map(|(idx, spec)| (*idx, spec.name))
                    .collect::<Vec<_>>(),
            )
            .field("header_len", &self.header_len)
            .field("ignored", &self.ignored)
            .finish()
    }
}

impl HeaderSchema {
    /// Match header names to known columns.
    ///
    /// Fails when a required column is missing or a known column appears more
    /// than once.
    pub fn bind<'a, I>(headers: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lookup: HashMap<&'static str, &'static ColumnSpec> =
            COLUMNS.iter().map(|spec| (spec.name, spec)).collect();

        let mut bindings: Vec<(usize, &'static ColumnSpec)> = Vec::new();
        let mut ignored = Vec::new();
        let mut found = Vec::new();
        let mut header_len = 0;

        for (idx, header) in headers.into_iter().enumerate() {
            header_len += 1;
            let normalized = header.trim_start_matches('\u{feff}').trim().to_lowercase();
            found.push(header.trim().to_string());

            match lookup.get(normalized.as_str()) {
                Some(&spec) => {
                    if bindings.iter().any(|(_, bound)| bound.name == spec.name) {
                        return Err(AppError::HeaderValidation(format!(
                            "Duplicate column '{}'",
                            spec.name
                        )));
                    }
                    bindings.push((idx, spec));
                }
                None => ignored.push(header.trim().to_string()),
            }
        }

        let missing: Vec<&str> = COLUMNS
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| !bindings.iter().any(|(_, bound)| bound.name == spec.name))
            .map(|spec| spec.name)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::HeaderValidation(format!(
                "Missing required column(s): {}. Found columns: {}",
                missing.join(", "),
                found.join(", ")
            )));
        }

        if !ignored.is_empty() {
            log::debug!("Ignoring unknown columns: {}", ignored.join(", "));
        }

        Ok(Self {
            bindings,
            header_len,
            ignored,
        })
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn ignored_columns(&self) -> &[String] {
        &self.ignored
    }

    /// Map one record's fields onto a [`RawRow`].
    ///
    /// A field count that differs from the header marks the row malformed; the
    /// fields that are present are still bound so the row keeps its identity.
    pub fn build_row<'a, I>(&self, row_number: usize, fields: I) -> RawRow
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values: Vec<&str> = fields.into_iter().collect();
        let mut row = RawRow {
            row_number,
            ..RawRow::default()
        };

        for (idx, spec) in &self.bindings {
            if let Some(value) = values.get(*idx) {
                (spec.assign)(&mut row, value.trim().to_string());
            }
        }

        if values.len() != self.header_len {
            row.malformed = Some(format!(
                "Row has {} fields but the header has {}.",
                values.len(),
                self.header_len
            ));
        }

        row
    }
}
