//! Transforms ordinal policy indicators into continuous severity signals.
//!
//! The nine indicators use incompatible ordinal scales and scope
//! semantics, so their raw values cannot be averaged. Each is mapped to a
//! common basis: the severity ratio v/scale, blended with a fixed bonus
//! for nationwide applicability.

use chrono::NaiveDate;

use crate::domain::{IndicatorObservation, SIGNAL_COUNT};
use crate::pipeline::schema::IndicatorDayRow;

/// One country-day of continuous signals, still nullable where the source
/// had not measured the indicator yet.
#[derive(Debug, Clone)]
pub struct PolicyDayRow {
    pub country_code: String,
    pub country_name: String,
    pub date: NaiveDate,
    pub stringency: Option<f64>,
    pub signals: [Option<f64>; SIGNAL_COUNT],
}

/// Computes one continuous signal from an ordinal observation.
///
/// Scope-aware indicators blend severity with scope:
/// `signal = (v/scale)·(1−w) + w·f`, f targeted = 0, general = 1.
/// Travel controls has no scope flag and reduces to `v/scale`.
/// `None` when the ordinal (or a required flag) is missing; the gap
/// filler decides what a missing signal becomes.
pub fn mobility_signal(obs: &IndicatorObservation, general_weight: f64) -> Option<f64> {
    let ordinal = obs.ordinal?;
    let spec = obs.indicator.spec();
    if !spec.uses_scope_flag {
        return Some(ordinal / spec.scale);
    }
    let flag = obs.flag?.as_multiplier();
    Some((ordinal / spec.scale) * (1.0 - general_weight) + general_weight * flag)
}

/// Transforms the indicator table into S1..S9 signal rows.
pub fn transform_indicators(rows: Vec<IndicatorDayRow>, general_weight: f64) -> Vec<PolicyDayRow> {
    rows.into_iter()
        .map(|row| {
            let mut signals = [None; SIGNAL_COUNT];
            for obs in &row.observations {
                signals[obs.indicator.slot()] = mobility_signal(obs, general_weight);
            }
            PolicyDayRow {
                country_code: row.country_code,
                country_name: row.country_name,
                date: row.date,
                stringency: row.stringency,
                signals,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENERAL_SCOPE_WEIGHT;
    use crate::domain::{Indicator, ScopeFlag};

    fn obs(indicator: Indicator, ordinal: Option<f64>, flag: Option<ScopeFlag>) -> IndicatorObservation {
        IndicatorObservation {
            country_code: "DEU".into(),
            date: NaiveDate::from_ymd_opt(2020, 3, 20).unwrap(),
            indicator,
            ordinal,
            flag,
        }
    }

    #[test]
    fn travel_controls_at_full_scale_is_one_regardless_of_flag() {
        let signal = mobility_signal(
            &obs(Indicator::TravelControls, Some(4.0), None),
            DEFAULT_GENERAL_SCOPE_WEIGHT,
        );
        assert_eq!(signal, Some(1.0));
    }

    #[test]
    fn zero_ordinal_with_general_flag_yields_the_scope_weight() {
        let signal = mobility_signal(
            &obs(Indicator::SchoolClosing, Some(0.0), Some(ScopeFlag::General)),
            DEFAULT_GENERAL_SCOPE_WEIGHT,
        );
        assert_eq!(signal, Some(DEFAULT_GENERAL_SCOPE_WEIGHT));
    }

    #[test]
    fn targeted_measures_earn_no_scope_bonus() {
        let signal = mobility_signal(
            &obs(Indicator::GatheringsRestriction, Some(2.0), Some(ScopeFlag::Targeted)),
            DEFAULT_GENERAL_SCOPE_WEIGHT,
        )
        .unwrap();
        assert!((signal - 0.5 * (1.0 - DEFAULT_GENERAL_SCOPE_WEIGHT)).abs() < 1e-12);
    }

    #[test]
    fn missing_ordinal_or_flag_yields_no_signal() {
        assert_eq!(
            mobility_signal(
                &obs(Indicator::SchoolClosing, None, Some(ScopeFlag::General)),
                DEFAULT_GENERAL_SCOPE_WEIGHT
            ),
            None
        );
        assert_eq!(
            mobility_signal(
                &obs(Indicator::SchoolClosing, Some(2.0), None),
                DEFAULT_GENERAL_SCOPE_WEIGHT
            ),
            None
        );
    }

    #[test]
    fn signals_land_in_their_slots() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 20).unwrap();
        let observations = Indicator::ALL
            .iter()
            .map(|&indicator| {
                let flag = indicator.spec().uses_scope_flag.then_some(ScopeFlag::General);
                obs(indicator, Some(indicator.spec().scale), flag)
            })
            .collect();
        let rows = vec![IndicatorDayRow {
            country_code: "DEU".into(),
            country_name: "Germany".into(),
            date,
            stringency: Some(80.0),
            observations,
        }];

        let out = transform_indicators(rows, DEFAULT_GENERAL_SCOPE_WEIGHT);
        assert_eq!(out.len(), 1);
        // Every indicator at its full scale with a general flag: scope-aware
        // slots all blend to 1.0, and so does C8 without a flag.
        for signal in out[0].signals {
            assert!((signal.unwrap() - 1.0).abs() < 1e-12);
        }
    }
}
