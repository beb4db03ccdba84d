//! Country-code resolution.
//!
//! Free-text country names from the sources are mapped onto canonical
//! ISO 3166-1 alpha-3 codes, which are the sole join key for every merge
//! after this point. Resolution order: exact registry match, then the
//! externally supplied override table. Names neither knows get the `UNK`
//! sentinel and are queued for registry review; their rows are kept.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::domain::UNKNOWN_COUNTRY_CODE;
use crate::error::{PipelineError, Result};

/// One entry of the canonical name-to-code registry file.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryCodeRecord {
    pub name: String,
    pub code: String,
}

#[derive(Debug)]
pub struct CountryCodeResolver {
    registry: HashMap<String, String>,
    overrides: HashMap<String, String>,
    unresolved: BTreeSet<String>,
}

impl CountryCodeResolver {
    /// Builds a resolver from registry records and an override table.
    ///
    /// A name bound to two different codes, in either table, is rejected
    /// as a configuration error. Several names mapping to the same code
    /// are legitimate (spelling variants of one country) and kept.
    pub fn new(
        records: Vec<CountryCodeRecord>,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut registry = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(existing) = registry.get(&record.name) {
                if *existing != record.code {
                    return Err(PipelineError::Config(format!(
                        "registry binds '{}' to both {} and {}",
                        record.name, existing, record.code
                    )));
                }
                continue;
            }
            registry.insert(record.name, record.code);
        }

        let mut override_map = HashMap::with_capacity(overrides.len());
        for (name, code) in overrides {
            if let Some(canonical) = registry.get(name) {
                if canonical != code {
                    return Err(PipelineError::Config(format!(
                        "override binds '{}' to {} but the registry says {}",
                        name, code, canonical
                    )));
                }
            }
            override_map.insert(name.clone(), code.clone());
        }

        Ok(Self {
            registry,
            overrides: override_map,
            unresolved: BTreeSet::new(),
        })
    }

    /// Loads the registry from its JSON file and applies overrides.
    pub fn from_registry_file<P: AsRef<Path>>(
        path: P,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "failed to read country registry '{}': {}",
                path.display(),
                e
            ))
        })?;
        let records: Vec<CountryCodeRecord> = serde_json::from_str(&content)?;
        Self::new(records, overrides)
    }

    /// Resolves a display name to an ISO3 code. Unresolvable names get the
    /// sentinel code and are remembered for manual registry extension.
    pub fn resolve(&mut self, name: &str) -> String {
        if let Some(code) = self.registry.get(name) {
            return code.clone();
        }
        if let Some(code) = self.overrides.get(name) {
            return code.clone();
        }
        if self.unresolved.insert(name.to_string()) {
            warn!(country = name, "unresolved country name, assigning sentinel code");
        }
        UNKNOWN_COUNTRY_CODE.to_string()
    }

    /// Names that fell through to the sentinel, for registry review.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }
}
