pub mod application;
pub mod domain;

// Re-exports for easy external access
pub use application::{OrganisationResolver, ReconciliationOrchestrator};
pub use domain::{OutcomeRecord, RowStatus, RunContext};
