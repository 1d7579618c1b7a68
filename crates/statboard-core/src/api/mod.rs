//! REST client for the statistics API.
//!
//! `StatsApiClient` queries `/stats/list` for time-series records of one
//! indicator endpoint (`accounts` or `access`). The `StatsSource` trait is
//! the seam the cache service fetches through.

pub mod client;
pub mod error;

use std::future::Future;

use anyhow::Result;

use crate::models::{EntityLevel, Frequency, IndicatorApi, StatsResponse};

pub use client::StatsApiClient;
pub use error::ApiError;

/// Anything that can answer a stats query.
pub trait StatsSource {
    fn get_stats(
        &self,
        api: IndicatorApi,
        since: &str,
        frequency: Frequency,
        entity_level: EntityLevel,
        entity_ids: &[String],
    ) -> impl Future<Output = Result<Vec<StatsResponse>>> + Send;
}
