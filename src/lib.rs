//! Subsidiary bulk upload pipeline
//!
//! A CSV file describing parent organisations and their subsidiaries is read,
//! validated row by row, grouped into parent units and reconciled against the
//! organisation registry. The outcome of every row is reported back to the
//! uploader through a status sink.

pub mod modules;
pub mod shared;

pub use modules::bulk_upload::{BulkUploadService, UploadResult};
pub use modules::notification::{InMemoryStatusSink, RunStatus, RunSummary, StatusSink};
pub use modules::reconciliation::{OutcomeRecord, RowStatus, RunContext};
pub use shared::{AppError, AppResult, PipelineConfig};
