pub mod validation_chain;
pub mod validation_rules;

pub use validation_chain::{RowError, ValidationChain, ValidationResult, ValidationRule};
pub use validation_rules::ValidationChainBuilder;
