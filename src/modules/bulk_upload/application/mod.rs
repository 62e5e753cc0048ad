pub mod service;

pub use service::{BulkUploadService, UploadResult};
