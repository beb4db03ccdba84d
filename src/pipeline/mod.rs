//! The reconciliation pipeline, one module per stage, in dependency
//! order: schema validation, country-code resolution, province
//! aggregation, series merging, date-range expansion, indicator
//! transformation, gap filling, feature derivation, population join.

pub mod aggregate;
pub mod expand;
pub mod features;
pub mod gap_fill;
pub mod indicators;
pub mod merge;
pub mod population;
pub mod resolve;
pub mod schema;
