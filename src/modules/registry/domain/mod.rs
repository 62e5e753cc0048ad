pub mod organisation;

pub use organisation::{NewOrganisation, OrganisationReference, SubsidiaryLink, SystemIdentity};
