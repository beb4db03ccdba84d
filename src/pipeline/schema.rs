//! Schema validation of fetched source tables.
//!
//! Downstream stages assume fixed column identities, so a missing column is
//! fatal here, before any merge. Null cells are legal where the source is
//! known to leave gaps; those flow through as `None` and are handled by the
//! gap filler.

use chrono::NaiveDate;
use serde_json::Value;

use crate::app::ports::SourceId;
use crate::domain::{CaseType, Indicator, IndicatorObservation, ScopeFlag};
use crate::error::{PipelineError, Result};

/// A case-count row as fetched, before country-code resolution.
#[derive(Debug, Clone)]
pub struct RawCaseRow {
    pub country_region: String,
    pub province: Option<String>,
    pub date: NaiveDate,
    pub value: f64,
}

/// One policy-source row: all nine indicator observations of one country
/// on one day plus the composite stringency index.
#[derive(Debug, Clone)]
pub struct IndicatorDayRow {
    pub country_code: String,
    pub country_name: String,
    pub date: NaiveDate,
    pub stringency: Option<f64>,
    pub observations: Vec<IndicatorObservation>,
}

/// A demographic row as fetched, before country-code resolution.
#[derive(Debug, Clone)]
pub struct RawPopulationRow {
    pub country_name: String,
    pub population: Option<f64>,
    pub density: Option<f64>,
    pub land_area: Option<f64>,
    pub median_age: Option<f64>,
    pub urban_pct: Option<f64>,
}

fn require<'a>(source: SourceId, record: &'a Value, column: &str) -> Result<&'a Value> {
    record.get(column).ok_or_else(|| PipelineError::SchemaMismatch {
        source: source.to_string(),
        column: column.to_string(),
    })
}

fn string_field(source: SourceId, record: &Value, column: &str) -> Result<String> {
    let value = require(source, record, column)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PipelineError::MalformedValue {
            source: source.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn optional_string(source: SourceId, record: &Value, column: &str) -> Result<Option<String>> {
    let value = require(source, record, column)?;
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_str()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| PipelineError::MalformedValue {
            source: source.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn optional_number(source: SourceId, record: &Value, column: &str) -> Result<Option<f64>> {
    let value = require(source, record, column)?;
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| PipelineError::MalformedValue {
            source: source.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn date_field(source: SourceId, record: &Value, column: &str) -> Result<NaiveDate> {
    let raw = string_field(source, record, column)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| PipelineError::MalformedValue {
        source: source.to_string(),
        column: column.to_string(),
        value: raw,
    })
}

/// Extracts the long-format rows of one case-type source.
pub fn extract_case_rows(
    source: SourceId,
    case_type: CaseType,
    records: &[Value],
) -> Result<Vec<RawCaseRow>> {
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let value = optional_number(source, record, case_type.column())?.unwrap_or(0.0);
        rows.push(RawCaseRow {
            country_region: string_field(source, record, "Country_Region")?,
            province: optional_string(source, record, "Province_State")?,
            date: date_field(source, record, "Date")?,
            value,
        });
    }
    Ok(rows)
}

fn scope_flag(source: SourceId, record: &Value, column: &str) -> Result<Option<ScopeFlag>> {
    match optional_number(source, record, column)? {
        None => Ok(None),
        Some(v) if v == 0.0 => Ok(Some(ScopeFlag::Targeted)),
        Some(v) if v == 1.0 => Ok(Some(ScopeFlag::General)),
        Some(v) => Err(PipelineError::MalformedValue {
            source: source.to_string(),
            column: column.to_string(),
            value: v.to_string(),
        }),
    }
}

/// Extracts the policy-indicator source: per row, the nine ordinal
/// observations with their scope flags and the stringency index.
pub fn extract_indicator_rows(records: &[Value]) -> Result<Vec<IndicatorDayRow>> {
    let source = SourceId::PolicyIndicators;
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let country_code = string_field(source, record, "Country_Code")?;
        let country_name = string_field(source, record, "CountryName")?;
        let date = date_field(source, record, "Date")?;
        let stringency = optional_number(source, record, "StringencyIndex")?;

        let mut observations = Vec::with_capacity(Indicator::ALL.len());
        for indicator in Indicator::ALL {
            let ordinal = optional_number(source, record, indicator.source_column())?;
            let flag = match indicator.flag_column() {
                Some(column) => scope_flag(source, record, column)?,
                None => None,
            };
            observations.push(IndicatorObservation {
                country_code: country_code.clone(),
                date,
                indicator,
                ordinal,
                flag,
            });
        }

        rows.push(IndicatorDayRow {
            country_code,
            country_name,
            date,
            stringency,
            observations,
        });
    }
    Ok(rows)
}

/// Extracts the static demographic source.
pub fn extract_population_rows(records: &[Value]) -> Result<Vec<RawPopulationRow>> {
    let source = SourceId::WorldPopulation;
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        rows.push(RawPopulationRow {
            country_name: string_field(source, record, "CountryName")?,
            population: optional_number(source, record, "Population")?,
            density: optional_number(source, record, "Density")?,
            land_area: optional_number(source, record, "LandArea")?,
            median_age: optional_number(source, record, "MedAge")?,
            urban_pct: optional_number(source, record, "UrbanPop")?,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_column_is_a_schema_mismatch() {
        let records = vec![json!({
            "Country_Region": "Germany",
            "Province_State": null,
            "Date": "2020-03-01"
            // ConfirmedCases column absent
        })];
        let err =
            extract_case_rows(SourceId::ConfirmedCases, CaseType::Confirmed, &records).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SchemaMismatch { ref column, .. } if column == "ConfirmedCases"
        ));
    }

    #[test]
    fn null_cells_are_allowed_where_the_source_leaves_gaps() {
        let records = vec![json!({
            "Country_Region": "Germany",
            "Province_State": null,
            "Date": "2020-03-01",
            "ConfirmedCases": null
        })];
        let rows =
            extract_case_rows(SourceId::ConfirmedCases, CaseType::Confirmed, &records).unwrap();
        assert_eq!(rows[0].value, 0.0);
        assert!(rows[0].province.is_none());
    }

    #[test]
    fn indicator_row_carries_all_nine_observations() {
        let mut record = serde_json::Map::new();
        record.insert("Country_Code".into(), json!("DEU"));
        record.insert("CountryName".into(), json!("Germany"));
        record.insert("Date".into(), json!("2020-03-20"));
        record.insert("StringencyIndex".into(), json!(73.15));
        for indicator in Indicator::ALL {
            record.insert(indicator.source_column().into(), json!(2.0));
            if let Some(flag) = indicator.flag_column() {
                record.insert(flag.into(), json!(1.0));
            }
        }

        let rows = extract_indicator_rows(&[Value::Object(record)]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].observations.len(), 9);
        assert_eq!(rows[0].stringency, Some(73.15));
        let travel = &rows[0].observations[Indicator::TravelControls.slot()];
        assert!(travel.flag.is_none());
    }

    #[test]
    fn out_of_range_scope_flag_is_malformed() {
        let mut record = serde_json::Map::new();
        record.insert("Country_Code".into(), json!("DEU"));
        record.insert("CountryName".into(), json!("Germany"));
        record.insert("Date".into(), json!("2020-03-20"));
        record.insert("StringencyIndex".into(), json!(null));
        for indicator in Indicator::ALL {
            record.insert(indicator.source_column().into(), json!(null));
            if let Some(flag) = indicator.flag_column() {
                record.insert(flag.into(), json!(null));
            }
        }
        record.insert("C1_Flag".into(), json!(2.0));

        let err = extract_indicator_rows(&[Value::Object(record)]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedValue { .. }));
    }
}
