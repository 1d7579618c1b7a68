//! statboard-core - shared library for the statboard dashboard.
//!
//! Contains the stats API client, indicator catalogue, per-entity cache,
//! chart grouping helpers and configuration. Front ends (the CLI, or a web
//! layer through the `ts` feature's generated types) build on top of this.

pub mod api;
pub mod cache;
pub mod chart;
pub mod config;
pub mod date;
pub mod export;
pub mod indicators;
pub mod models;
pub mod utils;

pub use api::{ApiError, StatsApiClient, StatsSource};
pub use cache::{CacheData, CacheIndicator, CacheService, CacheStore};
pub use config::Config;
pub use models::{
    AccessType, ApiType, ChartType, Entity, EntityLevel, Frequency, Indicator, IndicatorApi,
    Profile, StatsResponse,
};
