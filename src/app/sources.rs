//! Shared source preparation: fetch, schema-validate, resolve country
//! codes, aggregate provinces, and merge: everything both the full
//! rebuild and the incremental update need before they diverge.

use std::collections::HashMap;

use tracing::info;

use crate::app::ports::{DatasetFetcher, SourceId};
use crate::config::PipelineConfig;
use crate::domain::{CaseObservation, CaseType, PopulationProfile};
use crate::error::Result;
use crate::pipeline::aggregate::aggregate_provinces;
use crate::pipeline::indicators::{transform_indicators, PolicyDayRow};
use crate::pipeline::merge::{merge_series, MergedCaseRow};
use crate::pipeline::population::build_population_index;
use crate::pipeline::resolve::CountryCodeResolver;
use crate::pipeline::schema::{
    extract_case_rows, extract_indicator_rows, extract_population_rows, RawCaseRow,
};

pub(crate) struct PreparedSources {
    pub merged_cases: Vec<MergedCaseRow>,
    pub policy: Vec<PolicyDayRow>,
    pub population: HashMap<String, PopulationProfile>,
    /// Names the resolvers could not place, queued for registry review.
    pub unresolved_names: Vec<String>,
}

fn resolve_case_rows(
    rows: Vec<RawCaseRow>,
    resolver: &mut CountryCodeResolver,
) -> Vec<CaseObservation> {
    rows.into_iter()
        .map(|row| CaseObservation {
            country_code: resolver.resolve(&row.country_region),
            country_region: row.country_region,
            province: row.province,
            date: row.date,
            value: row.value,
        })
        .collect()
}

/// Fetches every source concurrently and runs the per-source stages.
/// Any fetch or schema failure aborts the whole run here, before anything
/// could touch the persisted table.
pub(crate) async fn prepare_sources(
    fetcher: &dyn DatasetFetcher,
    config: &PipelineConfig,
) -> Result<PreparedSources> {
    let (confirmed_raw, deaths_raw, recovered_raw, indicators_raw, population_raw) = tokio::try_join!(
        fetcher.fetch(SourceId::ConfirmedCases),
        fetcher.fetch(SourceId::ConfirmedDeaths),
        fetcher.fetch(SourceId::Recovered),
        fetcher.fetch(SourceId::PolicyIndicators),
        fetcher.fetch(SourceId::WorldPopulation),
    )?;
    info!(
        confirmed = confirmed_raw.len(),
        deaths = deaths_raw.len(),
        recovered = recovered_raw.len(),
        indicators = indicators_raw.len(),
        population = population_raw.len(),
        "fetched source tables"
    );

    let mut case_resolver = CountryCodeResolver::from_registry_file(
        &config.registry.iso_codes,
        &config.overrides.cases,
    )?;
    let mut population_resolver = CountryCodeResolver::from_registry_file(
        &config.registry.iso_codes,
        &config.overrides.population,
    )?;

    let confirmed = resolve_case_rows(
        extract_case_rows(SourceId::ConfirmedCases, CaseType::Confirmed, &confirmed_raw)?,
        &mut case_resolver,
    );
    let deaths = resolve_case_rows(
        extract_case_rows(SourceId::ConfirmedDeaths, CaseType::Deaths, &deaths_raw)?,
        &mut case_resolver,
    );
    let recovered = resolve_case_rows(
        extract_case_rows(SourceId::Recovered, CaseType::Recovered, &recovered_raw)?,
        &mut case_resolver,
    );

    let merged_cases = merge_series(
        aggregate_provinces(confirmed),
        aggregate_provinces(deaths),
        aggregate_provinces(recovered),
    );

    let policy = transform_indicators(
        extract_indicator_rows(&indicators_raw)?,
        config.pipeline.general_scope_weight,
    );

    let population = build_population_index(
        extract_population_rows(&population_raw)?,
        &mut population_resolver,
    );

    let mut unresolved_names: Vec<String> = case_resolver
        .unresolved()
        .chain(population_resolver.unresolved())
        .map(str::to_string)
        .collect();
    unresolved_names.sort();
    unresolved_names.dedup();

    Ok(PreparedSources {
        merged_cases,
        policy,
        population,
        unresolved_names,
    })
}
