pub mod domain;

pub use domain::{Extraction, HierarchyExtractor, ParentUnit};
