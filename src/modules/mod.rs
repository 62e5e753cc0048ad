pub mod bulk_upload;
pub mod hierarchy;
pub mod ingestion;
pub mod notification;
pub mod reconciliation;
pub mod registry;
