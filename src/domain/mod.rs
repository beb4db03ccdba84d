use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod columns;

/// Sentinel ISO3 code assigned to names the resolver cannot place.
/// "UNK" is unassigned in ISO 3166-1, so it can never shadow a real country.
pub const UNKNOWN_COUNTRY_CODE: &str = "UNK";

/// Number of continuous policy signals (S1..S9) in the output table.
pub const SIGNAL_COUNT: usize = 9;

/// The three cumulative case series published by the epidemiological source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseType {
    Confirmed,
    Deaths,
    Recovered,
}

impl CaseType {
    pub const ALL: [CaseType; 3] = [CaseType::Confirmed, CaseType::Deaths, CaseType::Recovered];

    /// Column name the source table carries the cumulative value under.
    pub fn column(&self) -> &'static str {
        match self {
            CaseType::Confirmed => "ConfirmedCases",
            CaseType::Deaths => "ConfirmedDeaths",
            CaseType::Recovered => "Recovered",
        }
    }
}

/// One cumulative case-count observation. Province-level rows exist only
/// transiently before aggregation collapses them into national rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseObservation {
    pub country_code: String,
    pub country_region: String,
    pub province: Option<String>,
    pub date: NaiveDate,
    pub value: f64,
}

/// Whether a policy measure applies nationwide or only in some regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeFlag {
    Targeted,
    General,
}

impl ScopeFlag {
    /// Encoding used by the severity blend: targeted = 0, general = 1.
    pub fn as_multiplier(self) -> f64 {
        match self {
            ScopeFlag::Targeted => 0.0,
            ScopeFlag::General => 1.0,
        }
    }
}

/// The nine ordinal policy indicators tracked by the policy source, in
/// output-slot order (S1..S9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    SchoolClosing,
    WorkplaceClosing,
    EventCancellation,
    GatheringsRestriction,
    TransportClosure,
    StayHomeRequirements,
    InternalMovementRestriction,
    TravelControls,
    InformationCampaigns,
}

/// Explicit per-indicator table: ordinal scale and whether the indicator
/// carries a scope flag. Replaces any inference from source column names.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSpec {
    /// Maximum ordinal value the source can report.
    pub scale: f64,
    /// Travel controls is the one indicator without scope semantics.
    pub uses_scope_flag: bool,
}

impl Indicator {
    pub const ALL: [Indicator; SIGNAL_COUNT] = [
        Indicator::SchoolClosing,
        Indicator::WorkplaceClosing,
        Indicator::EventCancellation,
        Indicator::GatheringsRestriction,
        Indicator::TransportClosure,
        Indicator::StayHomeRequirements,
        Indicator::InternalMovementRestriction,
        Indicator::TravelControls,
        Indicator::InformationCampaigns,
    ];

    pub fn spec(self) -> IndicatorSpec {
        match self {
            Indicator::SchoolClosing => IndicatorSpec { scale: 3.0, uses_scope_flag: true },
            Indicator::WorkplaceClosing => IndicatorSpec { scale: 3.0, uses_scope_flag: true },
            Indicator::EventCancellation => IndicatorSpec { scale: 2.0, uses_scope_flag: true },
            Indicator::GatheringsRestriction => IndicatorSpec { scale: 4.0, uses_scope_flag: true },
            Indicator::TransportClosure => IndicatorSpec { scale: 2.0, uses_scope_flag: true },
            Indicator::StayHomeRequirements => IndicatorSpec { scale: 3.0, uses_scope_flag: true },
            Indicator::InternalMovementRestriction => {
                IndicatorSpec { scale: 2.0, uses_scope_flag: true }
            }
            Indicator::TravelControls => IndicatorSpec { scale: 4.0, uses_scope_flag: false },
            Indicator::InformationCampaigns => IndicatorSpec { scale: 2.0, uses_scope_flag: true },
        }
    }

    /// Index of this indicator's continuous signal in `signals` (S1..S9).
    pub fn slot(self) -> usize {
        match self {
            Indicator::SchoolClosing => 0,
            Indicator::WorkplaceClosing => 1,
            Indicator::EventCancellation => 2,
            Indicator::GatheringsRestriction => 3,
            Indicator::TransportClosure => 4,
            Indicator::StayHomeRequirements => 5,
            Indicator::InternalMovementRestriction => 6,
            Indicator::TravelControls => 7,
            Indicator::InformationCampaigns => 8,
        }
    }

    /// Column the policy source reports the ordinal value under.
    pub fn source_column(self) -> &'static str {
        match self {
            Indicator::SchoolClosing => "C1_School_closing",
            Indicator::WorkplaceClosing => "C2_Workplace_closing",
            Indicator::EventCancellation => "C3_Cancel_public_events",
            Indicator::GatheringsRestriction => "C4_Restrictions_on_gatherings",
            Indicator::TransportClosure => "C5_Close_public_transport",
            Indicator::StayHomeRequirements => "C6_Stay_at_home_requirements",
            Indicator::InternalMovementRestriction => "C7_Restrictions_on_internal_movement",
            Indicator::TravelControls => "C8_International_travel_controls",
            Indicator::InformationCampaigns => "H1_Public_information_campaigns",
        }
    }

    /// Column of the accompanying scope flag, when the indicator has one.
    pub fn flag_column(self) -> Option<&'static str> {
        match self {
            Indicator::SchoolClosing => Some("C1_Flag"),
            Indicator::WorkplaceClosing => Some("C2_Flag"),
            Indicator::EventCancellation => Some("C3_Flag"),
            Indicator::GatheringsRestriction => Some("C4_Flag"),
            Indicator::TransportClosure => Some("C5_Flag"),
            Indicator::StayHomeRequirements => Some("C6_Flag"),
            Indicator::InternalMovementRestriction => Some("C7_Flag"),
            Indicator::TravelControls => None,
            Indicator::InformationCampaigns => Some("H1_Flag"),
        }
    }
}

/// One ordinal policy observation for one indicator on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorObservation {
    pub country_code: String,
    pub date: NaiveDate,
    pub indicator: Indicator,
    /// Missing in the source when the indicator was not yet measured.
    pub ordinal: Option<f64>,
    /// Absent for indicators without scope semantics, and for days the
    /// source left the flag blank.
    pub flag: Option<ScopeFlag>,
}

/// Static demographic attributes of one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationProfile {
    pub population: f64,
    pub density: f64,
    pub land_area: f64,
    pub median_age: f64,
    pub urban_pct: f64,
}

/// One row of the final harmonized table: everything known about one
/// country on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFeatureRecord {
    pub date: NaiveDate,
    pub country_code: String,
    pub country_name: String,

    // Cumulative case counts, carried through from the source unmodified
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
    pub active: f64,

    /// Composite stringency index as reported by the policy source (0..100).
    pub stringency: f64,
    /// Continuous severity signals S1..S9 in slot order.
    pub signals: [f64; SIGNAL_COUNT],

    /// mt: mean of S1..S9 for the day.
    pub mobility_mean: f64,
    /// Mt: running sum of mt since the start of this country's series.
    pub mobility_sum: f64,
    /// pt = 1 - mt.
    pub permissiveness: f64,
    /// Pt: running sum of pt.
    pub permissiveness_sum: f64,
    /// st = stringency / 100.
    pub stringency_norm: f64,
    /// St: running sum of st.
    pub stringency_sum: f64,

    /// Demographics, absent when the population source has no match.
    pub demographics: Option<PopulationProfile>,

    // Population-relative ratios, undefined without a population match
    pub relative_confirmed: Option<f64>,
    pub relative_deaths: Option<f64>,
    pub relative_recovered: Option<f64>,
    pub relative_active: Option<f64>,

    // Day-over-day differences of the cumulative columns
    pub daily_confirmed: f64,
    pub daily_deaths: f64,
    pub daily_recovered: f64,
    pub daily_active: f64,

    /// Days since this country's first confirmed case; 0 before it.
    pub days_since_first_case: i64,
}

impl DailyFeatureRecord {
    /// An all-zero row, the state of a day nothing has been observed for.
    pub fn empty(country_code: String, country_name: String, date: NaiveDate) -> Self {
        Self {
            date,
            country_code,
            country_name,
            confirmed: 0.0,
            deaths: 0.0,
            recovered: 0.0,
            active: 0.0,
            stringency: 0.0,
            signals: [0.0; SIGNAL_COUNT],
            mobility_mean: 0.0,
            mobility_sum: 0.0,
            permissiveness: 0.0,
            permissiveness_sum: 0.0,
            stringency_norm: 0.0,
            stringency_sum: 0.0,
            demographics: None,
            relative_confirmed: None,
            relative_deaths: None,
            relative_recovered: None,
            relative_active: None,
            daily_confirmed: 0.0,
            daily_deaths: 0.0,
            daily_recovered: 0.0,
            daily_active: 0.0,
            days_since_first_case: 0,
        }
    }
}

/// The harmonized table as a group-by-country partition, computed once and
/// processed per country. Each country's rows are kept in ascending date
/// order; a full rebuild replaces the partition wholesale, an incremental
/// update extends series in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarmonizedTable {
    countries: BTreeMap<String, Vec<DailyFeatureRecord>>,
}

impl HarmonizedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups flat records by country code and sorts each series by date.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DailyFeatureRecord>,
    {
        let mut countries: BTreeMap<String, Vec<DailyFeatureRecord>> = BTreeMap::new();
        for record in records {
            countries
                .entry(record.country_code.clone())
                .or_default()
                .push(record);
        }
        for series in countries.values_mut() {
            series.sort_by_key(|r| r.date);
        }
        Self { countries }
    }

    pub fn series(&self, country_code: &str) -> Option<&[DailyFeatureRecord]> {
        self.countries.get(country_code).map(Vec::as_slice)
    }

    pub fn series_mut(&mut self, country_code: &str) -> Option<&mut Vec<DailyFeatureRecord>> {
        self.countries.get_mut(country_code)
    }

    pub fn insert_series(&mut self, country_code: String, series: Vec<DailyFeatureRecord>) {
        self.countries.insert(country_code, series);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<DailyFeatureRecord>)> {
        self.countries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<DailyFeatureRecord>)> {
        self.countries.iter_mut()
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn row_count(&self) -> usize {
        self.countries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// The watermark: latest date present anywhere in the table.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.countries
            .values()
            .filter_map(|series| series.last().map(|r| r.date))
            .max()
    }

    /// Flattens the partition back into rows, countries in code order.
    pub fn into_records(self) -> Vec<DailyFeatureRecord> {
        self.countries.into_values().flatten().collect()
    }

    /// Consumes the table into its per-country series.
    pub fn into_series(self) -> impl Iterator<Item = (String, Vec<DailyFeatureRecord>)> {
        self.countries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, date: NaiveDate) -> DailyFeatureRecord {
        DailyFeatureRecord::empty(code.to_string(), code.to_string(), date)
    }

    #[test]
    fn from_records_groups_and_sorts_by_date() {
        let d1 = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let table = HarmonizedTable::from_records(vec![
            record("DEU", d1),
            record("DEU", d2),
            record("FRA", d1),
        ]);

        assert_eq!(table.country_count(), 2);
        let deu = table.series("DEU").unwrap();
        assert_eq!(deu[0].date, d2);
        assert_eq!(deu[1].date, d1);
        assert_eq!(table.max_date(), Some(d1));
    }

    #[test]
    fn indicator_table_matches_known_scales() {
        assert_eq!(Indicator::GatheringsRestriction.spec().scale, 4.0);
        assert_eq!(Indicator::TravelControls.spec().scale, 4.0);
        assert!(!Indicator::TravelControls.spec().uses_scope_flag);
        assert_eq!(Indicator::SchoolClosing.spec().scale, 3.0);
        assert_eq!(Indicator::TransportClosure.spec().scale, 2.0);
        for (i, indicator) in Indicator::ALL.iter().enumerate() {
            assert_eq!(indicator.slot(), i);
        }
    }
}
