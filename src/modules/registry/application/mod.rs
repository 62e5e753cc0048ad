pub mod ports;

pub use ports::{OrganisationRegistry, SystemIdentityProvider};
