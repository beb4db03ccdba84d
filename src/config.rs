use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Weight given to nationwide (general) applicability when blending an
/// ordinal policy value with its scope flag.
pub const DEFAULT_GENERAL_SCOPE_WEIGHT: f64 = 0.28375;

/// All series are backward-extended to this date so the case and policy
/// sources line up.
pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn default_general_scope_weight() -> f64 {
    DEFAULT_GENERAL_SCOPE_WEIGHT
}

/// Immutable configuration injected at pipeline construction. Fixed
/// constants and override tables live here rather than as process-wide
/// state.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    pub sources: SourceSettings,
    pub registry: RegistrySettings,
    #[serde(default)]
    pub overrides: OverrideSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// Canonical start date of every country's series.
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,
    /// General-scope weight `w` used by the indicator transform.
    #[serde(default = "default_general_scope_weight")]
    pub general_scope_weight: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            general_scope_weight: DEFAULT_GENERAL_SCOPE_WEIGHT,
        }
    }
}

/// Endpoints of the remote row-oriented source tables. The fetcher
/// collaborator resolves these; the core never touches raw bytes itself.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub confirmed_url: String,
    pub deaths_url: String,
    pub recovered_url: String,
    pub indicators_url: String,
    pub population_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    /// Path of the canonical ISO 3166-1 alpha-3 name-to-code registry file.
    pub iso_codes: PathBuf,
}

/// Name variants that are absent from (or spelled differently than) the
/// canonical registry, per source. Fully externally supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverrideSettings {
    #[serde(default)]
    pub cases: BTreeMap<String, String>,
    #[serde(default)]
    pub population: BTreeMap<String, String>,
}

impl PipelineConfig {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: PipelineConfig = toml::from_str(&content)?;
        if !(0.0..=1.0).contains(&config.pipeline.general_scope_weight) {
            return Err(PipelineError::Config(format!(
                "general_scope_weight must be within [0, 1], got {}",
                config.pipeline.general_scope_weight
            )));
        }
        Ok(config)
    }
}
