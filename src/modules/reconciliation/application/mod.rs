pub mod orchestrator;
pub mod organisation_resolver;
pub mod reference_cache;

pub use orchestrator::ReconciliationOrchestrator;
pub use organisation_resolver::OrganisationResolver;
pub use reference_cache::{CacheKey, ReferenceCache};
