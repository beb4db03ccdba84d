use async_trait::async_trait;
use serde_json::Value;

use crate::domain::HarmonizedTable;
use crate::error::Result;

/// The remote source tables the pipeline reconciles. Each resolves to a
/// row-oriented long-format table; any wide-to-long pivoting of raw
/// downloads happens upstream of this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    ConfirmedCases,
    ConfirmedDeaths,
    Recovered,
    PolicyIndicators,
    WorldPopulation,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::ConfirmedCases => "confirmed_cases",
            SourceId::ConfirmedDeaths => "confirmed_deaths",
            SourceId::Recovered => "recovered",
            SourceId::PolicyIndicators => "policy_indicators",
            SourceId::WorldPopulation => "world_population",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote dataset fetcher collaborator. A fetch failure is fatal for the
/// current run and must leave the persisted table untouched.
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Returns the source as row-oriented JSON records, one object per row.
    async fn fetch(&self, source: SourceId) -> Result<Vec<Value>>;
}

/// Persisted harmonized table. Implementations own the physical record
/// format; the pipeline only ever replaces the table wholesale, so a
/// failed run never leaves a half-written table behind.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn load(&self) -> Result<Option<HarmonizedTable>>;
    async fn replace(&self, table: HarmonizedTable) -> Result<()>;
}
