pub mod outcome;
pub mod run_context;

pub use outcome::{OutcomeRecord, RowStatus};
pub use run_context::RunContext;
