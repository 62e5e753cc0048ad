pub mod events;
pub mod status;

pub use events::UploadEvent;
pub use status::{ReportedError, RunStatus, RunSummary};
