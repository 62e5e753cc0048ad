pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use domain::{HeaderSchema, RawRow, RecordValidator, RowRole, ValidatedRecord};
pub use infrastructure::CsvRowStream;
