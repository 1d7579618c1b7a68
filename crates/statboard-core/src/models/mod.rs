//! Data models for statboard.
//!
//! - `Indicator` and its vocabulary enums (`Frequency`, `ChartType`, ...)
//! - `StatsResponse`: one time-series record returned by the stats API
//! - `Entity`: the organizational unit stats are fetched for

pub mod entity;
pub mod indicator;
pub mod stats;

pub use entity::{Entity, EntityLevel};
pub use indicator::{ApiType, ChartType, Frequency, Indicator, IndicatorApi, ParseError, Profile};
pub use stats::{AccessType, GroupKey, StatsResponse};
