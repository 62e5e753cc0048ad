pub mod pipeline;
pub mod retry_policy;

pub use pipeline::{ResiliencePipeline, RetryEvent, RetryObserver, RetryTier};
pub use retry_policy::RetryPolicy;
