//! Incremental extension of the persisted table past its watermark.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::app::ports::{DatasetFetcher, TableStore};
use crate::app::sources::prepare_sources;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::features::derive_series;
use crate::pipeline::gap_fill;
use crate::pipeline::merge::attach_cases;
use crate::pipeline::population::join_population;

/// Appends rows newer than the persisted watermark, then reruns the gap
/// filler and feature derivation over each affected country's full
/// series; forward fill and deltas depend on the history preceding the
/// new rows, so the new slice alone is not enough. When upstream has
/// nothing newer the persisted table is left byte-for-byte unchanged.
pub struct UpdateUseCase {
    fetcher: Arc<dyn DatasetFetcher>,
    store: Arc<dyn TableStore>,
    config: PipelineConfig,
}

#[derive(Debug)]
pub struct UpdateSummary {
    pub appended_rows: usize,
    pub affected_countries: usize,
    pub watermark: NaiveDate,
}

/// Outcome of a read-only freshness check against upstream.
#[derive(Debug)]
pub struct UpdateCheck {
    /// Latest date in the persisted table.
    pub watermark: NaiveDate,
    /// Latest date an update could extend the table to; `None` when a
    /// source came back empty.
    pub upstream_max: Option<NaiveDate>,
    pub update_available: bool,
}

impl UpdateUseCase {
    pub fn new(
        fetcher: Arc<dyn DatasetFetcher>,
        store: Arc<dyn TableStore>,
        config: PipelineConfig,
    ) -> Self {
        Self { fetcher, store, config }
    }

    /// Compares the persisted watermark against the latest date upstream
    /// could extend the table to, without writing anything. The table only
    /// advances to dates covered by both the case sources and the policy
    /// spine, so the upstream maximum is the earlier of the two.
    pub async fn check(&self) -> Result<UpdateCheck> {
        let table = self
            .store
            .load()
            .await?
            .ok_or(PipelineError::MissingBaseline)?;
        let watermark = table.max_date().ok_or(PipelineError::MissingBaseline)?;

        let prepared = prepare_sources(self.fetcher.as_ref(), &self.config).await?;
        let case_max = prepared.merged_cases.iter().map(|r| r.date).max();
        let policy_max = prepared.policy.iter().map(|r| r.date).max();
        let upstream_max = case_max.min(policy_max);
        let update_available = upstream_max.is_some_and(|max| max > watermark);

        info!(
            %watermark,
            upstream_max = ?upstream_max,
            update_available,
            "checked upstream freshness"
        );
        Ok(UpdateCheck {
            watermark,
            upstream_max,
            update_available,
        })
    }

    pub async fn run(&self) -> Result<UpdateSummary> {
        let mut table = self
            .store
            .load()
            .await?
            .ok_or(PipelineError::MissingBaseline)?;
        let watermark = table.max_date().ok_or(PipelineError::MissingBaseline)?;
        info!(%watermark, "checking for updates past the persisted watermark");

        let prepared = prepare_sources(self.fetcher.as_ref(), &self.config).await?;

        // Only dates covered by both the policy spine and the case sources
        // can extend the table; truncation mirrors the full rebuild.
        let cases: Vec<_> = prepared
            .merged_cases
            .into_iter()
            .filter(|r| r.date > watermark)
            .collect();
        let policy: Vec<_> = prepared
            .policy
            .into_iter()
            .filter(|r| r.date > watermark)
            .collect();
        if cases.is_empty() || policy.is_empty() {
            info!(%watermark, "no new upstream dates, persisted table unchanged");
            return Ok(UpdateSummary {
                appended_rows: 0,
                affected_countries: 0,
                watermark,
            });
        }

        // The watermark bounds the slice, so expansion back to the epoch is
        // already satisfied by the persisted series; no DateRangeExpander here.
        let drafts = attach_cases(policy, &cases);
        let fresh = gap_fill::fill(drafts);

        let mut affected: BTreeSet<String> = BTreeSet::new();
        let mut appended_rows = 0usize;
        for (code, rows) in fresh.into_series() {
            appended_rows += rows.len();
            affected.insert(code.clone());
            match table.series_mut(&code) {
                Some(series) => {
                    series.extend(rows);
                    series.sort_by_key(|r| r.date);
                }
                // A country first reported after the watermark starts its
                // series there; it was never part of the expanded baseline
                None => table.insert_series(code, rows),
            }
        }

        join_population(&mut table, &prepared.population);
        for code in &affected {
            if let Some(series) = table.series_mut(code) {
                gap_fill::refill_series(series);
                derive_series(series);
            }
        }

        let new_watermark = table.max_date().unwrap_or(watermark);
        let summary = UpdateSummary {
            appended_rows,
            affected_countries: affected.len(),
            watermark: new_watermark,
        };
        self.store.replace(table).await?;
        info!(
            appended = summary.appended_rows,
            countries = summary.affected_countries,
            watermark = %summary.watermark,
            "incremental update complete"
        );
        Ok(summary)
    }
}
