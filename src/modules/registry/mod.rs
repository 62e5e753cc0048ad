pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{OrganisationRegistry, SystemIdentityProvider};
pub use domain::{NewOrganisation, OrganisationReference, SubsidiaryLink, SystemIdentity};
pub use infrastructure::{ConfiguredIdentity, HttpOrganisationRegistry};
