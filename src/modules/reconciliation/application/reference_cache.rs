use dashmap::DashMap;

use crate::modules::registry::domain::OrganisationReference;

/// What a cached reference was found by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CompaniesHouse(String),
    Reference(String),
    Name(String),
}

impl CacheKey {
    pub fn companies_house(number: &str) -> Self {
        CacheKey::CompaniesHouse(number.trim().to_uppercase())
    }

    pub fn reference(reference: &str) -> Self {
        CacheKey::Reference(reference.trim().to_string())
    }

    pub fn name(name: &str) -> Self {
        CacheKey::Name(name.trim().to_lowercase())
    }
}

/// Organisations resolved so far in one run.
///
/// Concurrent units may both miss and both resolve the same organisation;
/// the later insert simply replaces the earlier one.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: DashMap<CacheKey, OrganisationReference>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<OrganisationReference> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a reference under the key it was found by and every key it carries
    pub fn remember(&self, found_by: CacheKey, reference: &OrganisationReference) {
        if let Some(number) = reference.companies_house_number.as_deref() {
            if !number.trim().is_empty() {
                self.entries
                    .insert(CacheKey::companies_house(number), reference.clone());
            }
        }
        self.entries
            .insert(CacheKey::name(&reference.name), reference.clone());
        self.entries.insert(found_by, reference.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
