pub mod configured_identity;
pub mod http_client;
pub mod http_registry;

pub use configured_identity::ConfiguredIdentity;
pub use http_registry::HttpOrganisationRegistry;
