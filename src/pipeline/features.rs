//! Derived per-day features: active cases, population-relative ratios,
//! daily deltas, and days since the first confirmed case.

use crate::domain::{DailyFeatureRecord, HarmonizedTable};

/// Derives all feature columns for every country in the table.
pub fn derive_features(table: &mut HarmonizedTable) {
    for (_, series) in table.iter_mut() {
        derive_series(series);
    }
}

/// Derives features for one country's series, in date order. Recomputes
/// from the cumulative columns, so it is safe to rerun after an update
/// appends rows.
pub fn derive_series(series: &mut [DailyFeatureRecord]) {
    for record in series.iter_mut() {
        record.active = record.confirmed - record.deaths - record.recovered;

        let population = record.demographics.as_ref().map(|d| d.population);
        record.relative_confirmed = population.map(|p| record.confirmed / p);
        record.relative_deaths = population.map(|p| record.deaths / p);
        record.relative_recovered = population.map(|p| record.recovered / p);
        record.relative_active = population.map(|p| record.active / p);
    }

    // Day-over-day deltas; the first element of a series is 0, not undefined
    let mut previous: Option<(f64, f64, f64, f64)> = None;
    for record in series.iter_mut() {
        let current = (record.confirmed, record.deaths, record.recovered, record.active);
        match previous {
            Some((confirmed, deaths, recovered, active)) => {
                record.daily_confirmed = record.confirmed - confirmed;
                record.daily_deaths = record.deaths - deaths;
                record.daily_recovered = record.recovered - recovered;
                record.daily_active = record.active - active;
            }
            None => {
                record.daily_confirmed = 0.0;
                record.daily_deaths = 0.0;
                record.daily_recovered = 0.0;
                record.daily_active = 0.0;
            }
        }
        previous = Some(current);
    }

    let first_case_date = series.iter().find(|r| r.confirmed > 0.0).map(|r| r.date);
    for record in series.iter_mut() {
        record.days_since_first_case = match first_case_date {
            Some(first) if record.confirmed > 0.0 => (record.date - first).num_days(),
            _ => 0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PopulationProfile;
    use chrono::NaiveDate;

    fn series_with_confirmed(values: &[f64]) -> Vec<DailyFeatureRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(i as u64);
                let mut record = DailyFeatureRecord::empty("DEU".into(), "Germany".into(), date);
                record.confirmed = v;
                record
            })
            .collect()
    }

    #[test]
    fn daily_deltas_start_at_zero() {
        let mut series = series_with_confirmed(&[10.0, 10.0, 15.0, 15.0, 20.0]);
        derive_series(&mut series);
        let deltas: Vec<f64> = series.iter().map(|r| r.daily_confirmed).collect();
        assert_eq!(deltas, vec![0.0, 0.0, 5.0, 0.0, 5.0]);
    }

    #[test]
    fn active_is_confirmed_minus_deaths_minus_recovered() {
        let mut series = series_with_confirmed(&[100.0]);
        series[0].deaths = 10.0;
        series[0].recovered = 30.0;
        derive_series(&mut series);
        assert_eq!(series[0].active, 60.0);
    }

    #[test]
    fn relative_ratios_need_a_population_match() {
        let mut series = series_with_confirmed(&[100.0, 200.0]);
        series[0].demographics = Some(PopulationProfile {
            population: 1000.0,
            density: 10.0,
            land_area: 100.0,
            median_age: 40.0,
            urban_pct: 75.0,
        });
        derive_series(&mut series);

        assert_eq!(series[0].relative_confirmed, Some(0.1));
        // Second day has no demographics: undefined, never an abort
        assert_eq!(series[1].relative_confirmed, None);
    }

    #[test]
    fn days_count_starts_at_first_confirmed_case() {
        let mut series = series_with_confirmed(&[0.0, 0.0, 3.0, 5.0, 9.0]);
        derive_series(&mut series);
        let days: Vec<i64> = series.iter().map(|r| r.days_since_first_case).collect();
        assert_eq!(days, vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn derive_is_idempotent() {
        let mut series = series_with_confirmed(&[1.0, 4.0, 9.0]);
        derive_series(&mut series);
        let once: Vec<f64> = series.iter().map(|r| r.daily_confirmed).collect();
        derive_series(&mut series);
        let twice: Vec<f64> = series.iter().map(|r| r.daily_confirmed).collect();
        assert_eq!(once, twice);
    }
}
