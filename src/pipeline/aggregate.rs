//! Collapses sub-national case rows into one national row per date.
//!
//! Some countries report only through provinces, with no national row at
//! all; for those the national series is synthesized by summing the
//! provinces per date. A country that already publishes a row without a
//! province is taken at its word, no synthesis, so province rows are never
//! double counted.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::CaseObservation;

/// Reduces one case-type series to exactly one row per (country, date).
/// Idempotent: the output contains only province-free rows, so a second
/// pass finds nothing to do.
pub fn aggregate_provinces(rows: Vec<CaseObservation>) -> Vec<CaseObservation> {
    // Group-by-country partition, computed once
    let mut by_country: BTreeMap<String, Vec<CaseObservation>> = BTreeMap::new();
    for row in rows {
        by_country.entry(row.country_code.clone()).or_default().push(row);
    }

    let mut national = Vec::new();
    for (code, mut rows) in by_country {
        let mut per_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for row in &rows {
            *per_date.entry(row.date).or_default() += 1;
        }
        let provincial = per_date.values().any(|&count| count > 1);
        let has_national_row = rows.iter().any(|r| r.province.is_none());

        if provincial && !has_national_row {
            debug!(country = %code, "synthesizing national series from province rows");
            let region = rows[0].country_region.clone();
            let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for row in &rows {
                *sums.entry(row.date).or_default() += row.value;
            }
            national.extend(sums.into_iter().map(|(date, value)| CaseObservation {
                country_code: code.clone(),
                country_region: region.clone(),
                province: None,
                date,
                value,
            }));
        } else {
            rows.retain(|r| r.province.is_none());
            rows.sort_by_key(|r| r.date);
            national.extend(rows);
        }
    }
    national
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(code: &str, province: Option<&str>, day: u32, value: f64) -> CaseObservation {
        CaseObservation {
            country_code: code.to_string(),
            country_region: format!("{code}-region"),
            province: province.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
            value,
        }
    }

    #[test]
    fn sums_provinces_when_no_national_row_exists() {
        let rows = vec![
            obs("AUS", Some("New South Wales"), 1, 10.0),
            obs("AUS", Some("Victoria"), 1, 20.0),
            obs("AUS", Some("Queensland"), 1, 30.0),
            obs("AUS", Some("New South Wales"), 2, 15.0),
            obs("AUS", Some("Victoria"), 2, 25.0),
            obs("AUS", Some("Queensland"), 2, 35.0),
        ];
        let national = aggregate_provinces(rows);

        assert_eq!(national.len(), 2);
        assert!(national.iter().all(|r| r.province.is_none()));
        assert_eq!(national[0].value, 60.0);
        assert_eq!(national[1].value, 75.0);
    }

    #[test]
    fn existing_national_row_is_authoritative() {
        // Mainland row has no province; overseas territories do. Summing
        // would double count, so the national row must pass unchanged.
        let rows = vec![
            obs("FRA", None, 1, 100.0),
            obs("FRA", Some("Guadeloupe"), 1, 5.0),
            obs("FRA", Some("Martinique"), 1, 7.0),
        ];
        let national = aggregate_provinces(rows);

        assert_eq!(national.len(), 1);
        assert_eq!(national[0].value, 100.0);
    }

    #[test]
    fn direct_reporting_country_is_untouched() {
        let rows = vec![obs("DEU", None, 1, 50.0), obs("DEU", None, 2, 60.0)];
        let national = aggregate_provinces(rows.clone());
        assert_eq!(national.len(), 2);
        assert_eq!(national[0].value, 50.0);
        assert_eq!(national[1].value, 60.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = vec![
            obs("AUS", Some("New South Wales"), 1, 10.0),
            obs("AUS", Some("Victoria"), 1, 20.0),
            obs("DEU", None, 1, 50.0),
        ];
        let once = aggregate_provinces(rows);
        let twice = aggregate_provinces(once.clone());

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.country_code, b.country_code);
            assert_eq!(a.date, b.date);
            assert_eq!(a.value, b.value);
        }
    }
}
