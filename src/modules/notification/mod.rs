pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{StatusReporter, StatusSink};
pub use domain::{ReportedError, RunStatus, RunSummary, UploadEvent};
pub use infrastructure::InMemoryStatusSink;
