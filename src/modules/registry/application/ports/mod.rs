pub mod organisation_registry;
pub mod system_identity;

pub use organisation_registry::OrganisationRegistry;
pub use system_identity::SystemIdentityProvider;
