//! Backward extension of every country's case series to the canonical
//! epoch, so the case series lines up with the policy table, which starts
//! reporting at the epoch for every country.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::pipeline::merge::MergedCaseRow;

/// Prepends one synthetic row per day in [epoch, first report) to each
/// country's series, cloning the earliest row's case values verbatim.
/// Backward fill with the earliest known value, not zero.
pub fn expand_to_epoch(rows: Vec<MergedCaseRow>, epoch: NaiveDate) -> Vec<MergedCaseRow> {
    let mut by_country: BTreeMap<String, Vec<MergedCaseRow>> = BTreeMap::new();
    for row in rows {
        by_country.entry(row.country_code.clone()).or_default().push(row);
    }

    let mut expanded = Vec::new();
    for (code, mut series) in by_country {
        series.sort_by_key(|r| r.date);
        let first = series[0].clone();
        if first.date > epoch {
            let missing = (first.date - epoch).num_days();
            debug!(country = %code, days = missing, "backfilling series to epoch");
            let mut date = epoch;
            while date < first.date {
                expanded.push(MergedCaseRow { date, ..first.clone() });
                date = date.succ_opt().expect("date within chrono range");
            }
        }
        expanded.append(&mut series);
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, date: NaiveDate, confirmed: f64) -> MergedCaseRow {
        MergedCaseRow {
            country_code: code.to_string(),
            country_region: code.to_string(),
            date,
            confirmed,
            deaths: confirmed / 10.0,
            recovered: confirmed / 5.0,
        }
    }

    #[test]
    fn series_starts_at_epoch_with_no_gaps_or_duplicates() {
        let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let first_report = NaiveDate::from_ymd_opt(2020, 1, 25).unwrap();
        let last = NaiveDate::from_ymd_opt(2020, 1, 27).unwrap();
        let rows = vec![
            row("DEU", first_report, 10.0),
            row("DEU", first_report.succ_opt().unwrap(), 12.0),
            row("DEU", last, 15.0),
        ];

        let expanded = expand_to_epoch(rows, epoch);

        let expected_days = (last - epoch).num_days() + 1;
        assert_eq!(expanded.len() as i64, expected_days);
        let mut date = epoch;
        for record in &expanded {
            assert_eq!(record.date, date);
            date = date.succ_opt().unwrap();
        }
        // Synthetic rows clone the earliest report verbatim
        assert!(expanded
            .iter()
            .take_while(|r| r.date < first_report)
            .all(|r| r.confirmed == 10.0));
        assert_eq!(expanded.last().unwrap().confirmed, 15.0);
    }

    #[test]
    fn series_already_at_epoch_is_unchanged() {
        let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let rows = vec![row("DEU", epoch, 1.0), row("DEU", epoch.succ_opt().unwrap(), 2.0)];
        let expanded = expand_to_epoch(rows, epoch);
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].confirmed, 1.0);
    }
}
