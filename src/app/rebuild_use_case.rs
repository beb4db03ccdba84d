//! Full rebuild of the harmonized table from scratch.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::app::ports::{DatasetFetcher, TableStore};
use crate::app::sources::prepare_sources;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::expand::expand_to_epoch;
use crate::pipeline::features::derive_features;
use crate::pipeline::gap_fill;
use crate::pipeline::merge::attach_cases;
use crate::pipeline::population::join_population;

/// Orchestrates every pipeline stage in dependency order and replaces the
/// persisted table wholesale. All-or-nothing: the store is only touched
/// after the whole table has been built, so an abort anywhere leaves the
/// previously persisted table as it was.
pub struct RebuildUseCase {
    fetcher: Arc<dyn DatasetFetcher>,
    store: Arc<dyn TableStore>,
    config: PipelineConfig,
}

#[derive(Debug)]
pub struct RebuildSummary {
    pub countries: usize,
    pub rows: usize,
    pub max_date: Option<NaiveDate>,
    pub unresolved_names: Vec<String>,
}

impl RebuildUseCase {
    pub fn new(
        fetcher: Arc<dyn DatasetFetcher>,
        store: Arc<dyn TableStore>,
        config: PipelineConfig,
    ) -> Self {
        Self { fetcher, store, config }
    }

    pub async fn run(&self) -> Result<RebuildSummary> {
        info!("starting full rebuild");
        let prepared = prepare_sources(self.fetcher.as_ref(), &self.config).await?;

        let cases = expand_to_epoch(prepared.merged_cases, self.config.pipeline.epoch);
        let drafts = attach_cases(prepared.policy, &cases);
        let mut table = gap_fill::fill(drafts);
        join_population(&mut table, &prepared.population);
        derive_features(&mut table);

        let summary = RebuildSummary {
            countries: table.country_count(),
            rows: table.row_count(),
            max_date: table.max_date(),
            unresolved_names: prepared.unresolved_names,
        };
        self.store.replace(table).await?;
        info!(
            countries = summary.countries,
            rows = summary.rows,
            "full rebuild complete"
        );
        Ok(summary)
    }
}
