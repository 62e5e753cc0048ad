pub mod extractor;
pub mod parent_unit;

pub use extractor::{Extraction, HierarchyExtractor};
pub use parent_unit::ParentUnit;
