//! Attaches static demographic attributes to the harmonized table.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::{HarmonizedTable, PopulationProfile, UNKNOWN_COUNTRY_CODE};
use crate::pipeline::resolve::CountryCodeResolver;
use crate::pipeline::schema::RawPopulationRow;

/// Resolves the demographic rows to country codes and indexes them.
/// Rows without a resolvable code or a population figure cannot join
/// anything and are skipped; the names stay queued on the resolver.
pub fn build_population_index(
    rows: Vec<RawPopulationRow>,
    resolver: &mut CountryCodeResolver,
) -> HashMap<String, PopulationProfile> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        let code = resolver.resolve(&row.country_name);
        if code == UNKNOWN_COUNTRY_CODE {
            continue;
        }
        let Some(population) = row.population else {
            debug!(country = %row.country_name, "population row without a population figure");
            continue;
        };
        index.insert(
            code,
            PopulationProfile {
                population,
                density: row.density.unwrap_or(0.0),
                land_area: row.land_area.unwrap_or(0.0),
                median_age: row.median_age.unwrap_or(0.0),
                urban_pct: row.urban_pct.unwrap_or(0.0),
            },
        );
    }
    index
}

/// Left join on country_code. Countries without a demographic match keep
/// every case and indicator value, with demographics left undefined:
/// case data is primary and never dropped here.
pub fn join_population(table: &mut HarmonizedTable, profiles: &HashMap<String, PopulationProfile>) {
    let mut unmatched = 0usize;
    for (code, series) in table.iter_mut() {
        match profiles.get(code) {
            Some(profile) => {
                for record in series.iter_mut() {
                    record.demographics = Some(profile.clone());
                }
            }
            None => unmatched += 1,
        }
    }
    info!(
        countries = table.country_count(),
        without_demographics = unmatched,
        "joined population profiles"
    );
}
