//! Fixed column layout of the persisted flat table.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::DailyFeatureRecord;

/// Column order of the persisted table. Downstream consumers index by
/// position, so this order is part of the external contract.
pub const OUTPUT_COLUMNS: &[&str] = &[
    "Date",
    "Country_Code",
    "CountryName",
    "ConfirmedCases",
    "ConfirmedDeaths",
    "Recovered",
    "Active",
    "StringencyIndex",
    "S1",
    "S2",
    "S3",
    "S4",
    "S5",
    "S6",
    "S7",
    "S8",
    "S9",
    "mt",
    "Mt",
    "pt",
    "Pt",
    "st",
    "St",
    "Population",
    "Density",
    "LandArea",
    "MedAge",
    "UrbanPop",
    "RelativeConfirmedCases",
    "RelativeConfirmedDeaths",
    "RelativeRecovered",
    "RelativeActive",
    "DailyConfirmedCases",
    "DailyConfirmedDeaths",
    "DailyRecovered",
    "DailyActive",
    "DaysCountFromFirstCase",
];

/// Position of each column by name, for consumers that index rows.
pub static COLUMN_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    OUTPUT_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect()
});

fn fmt_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map(fmt_number).unwrap_or_default()
}

/// Flattens one record into the `OUTPUT_COLUMNS` order, dates as ISO
/// strings and undefined fields as empty cells.
pub fn flatten_record(record: &DailyFeatureRecord) -> Vec<String> {
    let demographics = record.demographics.as_ref();
    let mut row = Vec::with_capacity(OUTPUT_COLUMNS.len());
    row.push(record.date.format("%Y-%m-%d").to_string());
    row.push(record.country_code.clone());
    row.push(record.country_name.clone());
    row.push(fmt_number(record.confirmed));
    row.push(fmt_number(record.deaths));
    row.push(fmt_number(record.recovered));
    row.push(fmt_number(record.active));
    row.push(fmt_number(record.stringency));
    for signal in record.signals {
        row.push(fmt_number(signal));
    }
    row.push(fmt_number(record.mobility_mean));
    row.push(fmt_number(record.mobility_sum));
    row.push(fmt_number(record.permissiveness));
    row.push(fmt_number(record.permissiveness_sum));
    row.push(fmt_number(record.stringency_norm));
    row.push(fmt_number(record.stringency_sum));
    row.push(fmt_optional(demographics.map(|d| d.population)));
    row.push(fmt_optional(demographics.map(|d| d.density)));
    row.push(fmt_optional(demographics.map(|d| d.land_area)));
    row.push(fmt_optional(demographics.map(|d| d.median_age)));
    row.push(fmt_optional(demographics.map(|d| d.urban_pct)));
    row.push(fmt_optional(record.relative_confirmed));
    row.push(fmt_optional(record.relative_deaths));
    row.push(fmt_optional(record.relative_recovered));
    row.push(fmt_optional(record.relative_active));
    row.push(fmt_number(record.daily_confirmed));
    row.push(fmt_number(record.daily_deaths));
    row.push(fmt_number(record.daily_recovered));
    row.push(fmt_number(record.daily_active));
    row.push(record.days_since_first_case.to_string());
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn flattened_row_matches_column_count_and_order() {
        let date = NaiveDate::from_ymd_opt(2020, 4, 15).unwrap();
        let mut record = DailyFeatureRecord::empty("DEU".into(), "Germany".into(), date);
        record.confirmed = 132210.0;
        let row = flatten_record(&record);

        assert_eq!(row.len(), OUTPUT_COLUMNS.len());
        assert_eq!(row[0], "2020-04-15");
        assert_eq!(row[1], "DEU");
        assert_eq!(row[2], "Germany");
        assert_eq!(row[3], "132210");
        // No population match: demographic and relative cells stay empty
        assert_eq!(row[COLUMN_INDEX["Population"]], "");
        assert_eq!(row[COLUMN_INDEX["RelativeConfirmedCases"]], "");
    }

    #[test]
    fn column_index_covers_every_column() {
        assert_eq!(COLUMN_INDEX.len(), OUTPUT_COLUMNS.len());
        assert_eq!(COLUMN_INDEX["Date"], 0);
        assert_eq!(
            COLUMN_INDEX["DaysCountFromFirstCase"],
            OUTPUT_COLUMNS.len() - 1
        );
    }
}
