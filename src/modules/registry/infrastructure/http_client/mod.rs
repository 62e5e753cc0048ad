pub mod rate_limit_client;

pub use rate_limit_client::{error_for_status, RateLimitInfo, RegistryHttpClient};
