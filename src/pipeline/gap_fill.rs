//! Fills gaps and computes running aggregates.
//!
//! The sources encode "not yet measured" as zero, which is
//! indistinguishable from a true zero. A zero is therefore treated as a
//! missing-value sentinel and forward-filled with the most recent
//! strictly-earlier nonzero value of the same country; a run of leading
//! zeros stays, since the absence of any policy or case yet is a
//! legitimate zero. This is lossy by construction and kept for
//! compatibility with the published dataset.

use tracing::warn;

use crate::domain::{DailyFeatureRecord, HarmonizedTable, SIGNAL_COUNT};
use crate::pipeline::merge::RecordDraft;

/// Pass 1: materializes drafts, every remaining null numeric field
/// becoming 0. Pass 2 runs per country via [`refill_series`].
pub fn fill(drafts: Vec<RecordDraft>) -> HarmonizedTable {
    let records = drafts.into_iter().map(|draft| {
        let mut record = DailyFeatureRecord::empty(draft.country_code, draft.country_name, draft.date);
        record.confirmed = draft.confirmed.unwrap_or(0.0);
        record.deaths = draft.deaths.unwrap_or(0.0);
        record.recovered = draft.recovered.unwrap_or(0.0);
        record.stringency = draft.stringency.unwrap_or(0.0);
        for (slot, signal) in draft.signals.into_iter().enumerate() {
            record.signals[slot] = signal.unwrap_or(0.0);
        }
        record
    });

    let mut table = HarmonizedTable::from_records(records);
    for (_, series) in table.iter_mut() {
        refill_series(series);
    }
    table
}

/// Pass 2 plus aggregates for one country's series, in date order.
/// Idempotent, and rerun over the full series on incremental updates,
/// because the fill depends on history preceding any new rows.
pub fn refill_series(series: &mut [DailyFeatureRecord]) {
    for slot in 0..SIGNAL_COUNT {
        forward_fill(series, |r| r.signals[slot], move |r, v| r.signals[slot] = v);
    }
    forward_fill(series, |r| r.stringency, |r, v| r.stringency = v);
    forward_fill(series, |r| r.confirmed, |r, v| r.confirmed = v);
    forward_fill(series, |r| r.deaths, |r, v| r.deaths = v);
    forward_fill(series, |r| r.recovered, |r, v| r.recovered = v);

    flag_non_monotonic(series);

    let mut mobility_sum = 0.0;
    let mut permissiveness_sum = 0.0;
    let mut stringency_sum = 0.0;
    for record in series.iter_mut() {
        record.mobility_mean = record.signals.iter().sum::<f64>() / SIGNAL_COUNT as f64;
        record.permissiveness = 1.0 - record.mobility_mean;
        record.stringency_norm = record.stringency / 100.0;

        mobility_sum += record.mobility_mean;
        permissiveness_sum += record.permissiveness;
        stringency_sum += record.stringency_norm;
        record.mobility_sum = mobility_sum;
        record.permissiveness_sum = permissiveness_sum;
        record.stringency_sum = stringency_sum;
    }
}

fn forward_fill<G, S>(series: &mut [DailyFeatureRecord], get: G, set: S)
where
    G: Fn(&DailyFeatureRecord) -> f64,
    S: Fn(&mut DailyFeatureRecord, f64),
{
    let mut last_nonzero = 0.0;
    for record in series.iter_mut() {
        let value = get(record);
        if value == 0.0 {
            if last_nonzero != 0.0 {
                set(record, last_nonzero);
            }
        } else {
            last_nonzero = value;
        }
    }
}

/// Cumulative counts that shrink are a source data-quality concern. They
/// are passed through unmodified, never corrected.
fn flag_non_monotonic(series: &[DailyFeatureRecord]) {
    let Some(first) = series.first() else { return };
    for (name, get) in [
        ("ConfirmedCases", (|r| r.confirmed) as fn(&DailyFeatureRecord) -> f64),
        ("ConfirmedDeaths", |r| r.deaths),
        ("Recovered", |r| r.recovered),
    ] {
        if series.windows(2).any(|w| get(&w[1]) < get(&w[0])) {
            warn!(
                country = %first.country_code,
                column = name,
                "non-monotonic cumulative counts in source data"
            );
        }
    }
}
