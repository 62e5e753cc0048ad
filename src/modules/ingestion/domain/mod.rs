pub mod raw_row;
pub mod record_validator;
pub mod schema;

pub use raw_row::{RawRow, RowRole};
pub use record_validator::{RecordValidator, ValidatedRecord};
pub use schema::HeaderSchema;
