pub mod application;

pub use application::{BulkUploadService, UploadResult};
