//! Joins of the prepared sources.
//!
//! The three case-type series join with inner semantics: a (country, date)
//! pair absent from any one series drops out entirely, which fixes the
//! effective date coverage before expansion. The later case-to-policy
//! attachment instead keeps the policy table as the spine and left-joins
//! case values onto it.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{CaseObservation, SIGNAL_COUNT};
use crate::pipeline::indicators::PolicyDayRow;

/// One (country, date) after the three case series are joined.
#[derive(Debug, Clone)]
pub struct MergedCaseRow {
    pub country_code: String,
    pub country_region: String,
    pub date: NaiveDate,
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
}

/// A pre-fill output row: identity plus raw values where nulls are still
/// distinguishable from zeros. The gap filler materializes these.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub country_code: String,
    pub country_name: String,
    pub date: NaiveDate,
    pub confirmed: Option<f64>,
    pub deaths: Option<f64>,
    pub recovered: Option<f64>,
    pub stringency: Option<f64>,
    pub signals: [Option<f64>; SIGNAL_COUNT],
}

type CaseKey = (String, String, NaiveDate);

fn index(rows: Vec<CaseObservation>) -> HashMap<CaseKey, f64> {
    rows.into_iter()
        .map(|r| ((r.country_code, r.country_region, r.date), r.value))
        .collect()
}

/// Inner join of the three aggregated case-type series on
/// (date, country_code, country_region). Not a union: a pair missing from
/// any series is dropped.
pub fn merge_series(
    confirmed: Vec<CaseObservation>,
    deaths: Vec<CaseObservation>,
    recovered: Vec<CaseObservation>,
) -> Vec<MergedCaseRow> {
    let total = confirmed.len();
    let deaths = index(deaths);
    let recovered = index(recovered);

    let mut merged = Vec::with_capacity(total);
    for row in confirmed {
        let key = (row.country_code, row.country_region, row.date);
        let (Some(&dead), Some(&rec)) = (deaths.get(&key), recovered.get(&key)) else {
            continue;
        };
        let (country_code, country_region, date) = key;
        merged.push(MergedCaseRow {
            country_code,
            country_region,
            date,
            confirmed: row.value,
            deaths: dead,
            recovered: rec,
        });
    }
    merged.sort_by(|a, b| (&a.country_code, a.date).cmp(&(&b.country_code, b.date)));

    if merged.len() < total {
        debug!(
            dropped = total - merged.len(),
            "case rows missing from at least one series were dropped by the merge"
        );
    }
    merged
}

/// Attaches the merged case series to the policy table. The policy rows,
/// already epoch-complete, form the spine; rows past the case sources'
/// latest date are cut off, and case values join by (country, date).
pub fn attach_cases(policy: Vec<PolicyDayRow>, cases: &[MergedCaseRow]) -> Vec<RecordDraft> {
    let case_max = cases.iter().map(|r| r.date).max();
    let by_key: HashMap<(&str, NaiveDate), &MergedCaseRow> = cases
        .iter()
        .map(|r| ((r.country_code.as_str(), r.date), r))
        .collect();

    let mut drafts = Vec::with_capacity(policy.len());
    for row in policy {
        if case_max.is_some_and(|max| row.date > max) {
            continue;
        }
        let case = by_key.get(&(row.country_code.as_str(), row.date));
        drafts.push(RecordDraft {
            confirmed: case.map(|c| c.confirmed),
            deaths: case.map(|c| c.deaths),
            recovered: case.map(|c| c.recovered),
            country_code: row.country_code,
            country_name: row.country_name,
            date: row.date,
            stringency: row.stringency,
            signals: row.signals,
        });
    }
    info!(rows = drafts.len(), "attached case series to policy spine");
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(code: &str, day: u32, value: f64) -> CaseObservation {
        CaseObservation {
            country_code: code.to_string(),
            country_region: format!("{code}-region"),
            province: None,
            date: NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
            value,
        }
    }

    #[test]
    fn pair_missing_from_one_series_is_dropped() {
        let confirmed = vec![obs("DEU", 1, 10.0), obs("DEU", 2, 12.0)];
        let deaths = vec![obs("DEU", 1, 1.0), obs("DEU", 2, 1.0)];
        // Recovered has no row for March 2nd
        let recovered = vec![obs("DEU", 1, 3.0)];

        let merged = merge_series(confirmed, deaths, recovered);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(merged[0].confirmed, 10.0);
        assert_eq!(merged[0].deaths, 1.0);
        assert_eq!(merged[0].recovered, 3.0);
    }

    #[test]
    fn policy_spine_is_truncated_to_case_coverage() {
        let day = |d| NaiveDate::from_ymd_opt(2020, 3, d).unwrap();
        let policy = vec![
            PolicyDayRow {
                country_code: "DEU".into(),
                country_name: "Germany".into(),
                date: day(1),
                stringency: Some(30.0),
                signals: [Some(0.5); SIGNAL_COUNT],
            },
            PolicyDayRow {
                country_code: "DEU".into(),
                country_name: "Germany".into(),
                date: day(3),
                stringency: Some(40.0),
                signals: [Some(0.6); SIGNAL_COUNT],
            },
        ];
        let cases = vec![MergedCaseRow {
            country_code: "DEU".into(),
            country_region: "Germany".into(),
            date: day(1),
            confirmed: 10.0,
            deaths: 1.0,
            recovered: 2.0,
        }];

        let drafts = attach_cases(policy, &cases);
        // The day-3 policy row is past the case sources' latest date
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].date, day(1));
        assert_eq!(drafts[0].confirmed, Some(10.0));
        assert_eq!(drafts[0].stringency, Some(30.0));
    }

    #[test]
    fn policy_row_without_case_match_keeps_null_cases() {
        let day = |d| NaiveDate::from_ymd_opt(2020, 3, d).unwrap();
        let policy = vec![PolicyDayRow {
            country_code: "ABW".into(),
            country_name: "Aruba".into(),
            date: day(1),
            stringency: None,
            signals: [None; SIGNAL_COUNT],
        }];
        let cases = vec![MergedCaseRow {
            country_code: "DEU".into(),
            country_region: "Germany".into(),
            date: day(1),
            confirmed: 10.0,
            deaths: 1.0,
            recovered: 2.0,
        }];

        let drafts = attach_cases(policy, &cases);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].confirmed, None);
    }
}
