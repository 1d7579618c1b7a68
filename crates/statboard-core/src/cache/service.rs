//! Fetch-or-reuse logic over an entity's `CacheData`.

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::api::StatsSource;
use crate::chart::{
    self, ChartDataGroupedByKey, ChartDataGroupedByKeys, ChartDataGroupedWithDate,
};
use crate::date::{self, DEFAULT_SINCE_MONTHS};
use crate::indicators::{ACTIVATED_ACCOUNTS, CONNECTIONS, MOST_USED_APP, MOST_USED_CONNECTOR};
use crate::models::{
    AccessType, Entity, Frequency, GroupKey, Indicator, IndicatorApi, Profile, StatsResponse,
};

use super::data::{CacheData, CacheIndicator, CACHE_STALE_MINUTES};

pub struct CacheService<S> {
    source: S,
    ttl: Duration,
    since_months: u32,
}

impl<S: StatsSource> CacheService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            ttl: Duration::minutes(CACHE_STALE_MINUTES),
            since_months: DEFAULT_SINCE_MONTHS,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_since_months(mut self, months: u32) -> Self {
        self.since_months = months;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// `from` parameter for queries issued now.
    pub fn since(&self) -> String {
        date::since_query_param(Utc::now(), self.since_months)
    }

    async fn fetch(&self, api: IndicatorApi, frequency: Frequency, entity: &Entity) -> Result<Vec<StatsResponse>> {
        self.source
            .get_stats(
                api,
                &self.since(),
                frequency,
                entity.level,
                std::slice::from_ref(&entity.id),
            )
            .await
    }

    /// Fetch month data for both endpoints and rebuild the entity cache with
    /// one entry (and total, where one applies) per indicator.
    pub async fn init_entity_month_cache_data(&self, indicators: &[Indicator], entity: &mut Entity) -> Result<()> {
        let target: &Entity = entity;
        let (accounts_data, access_data) = futures::try_join!(
            self.fetch(IndicatorApi::Accounts, Frequency::Month, target),
            self.fetch(IndicatorApi::Access, Frequency::Month, target),
        )?;

        let mut cache_data = CacheData::default();
        for indicator in indicators {
            let data: Vec<StatsResponse> = match indicator.api {
                IndicatorApi::Accounts => accounts_data.clone(),
                IndicatorApi::Access => match indicator.name.as_str() {
                    MOST_USED_APP => filter_type(&access_data, AccessType::Access),
                    MOST_USED_CONNECTOR => filter_type(&access_data, AccessType::Connector),
                    _ => access_data.clone(),
                },
            };

            let total_value = total_for(indicator, &data);
            cache_data.indicators.push(CacheIndicator {
                name: indicator.name.clone(),
                api_type: indicator.api_type,
                data,
                frequency: Frequency::Month,
                total_value,
            });
        }
        cache_data.touch(Utc::now());

        info!(
            entity = %entity.id,
            level = %entity.level,
            indicators = cache_data.indicators.len(),
            "Initialized entity month cache"
        );
        entity.cache_data = cache_data;
        Ok(())
    }

    /// Cached records for the indicator at its current frequency, fetched
    /// from the API when missing or stale.
    pub async fn get_data_from_cache_or_api(&self, indicator: &Indicator, entity: &mut Entity) -> Result<Vec<StatsResponse>> {
        if !self.needs_refresh(&entity.cache_data) {
            if let Some(cached) = entity.cache_data.find(&indicator.name, indicator.frequency) {
                debug!(indicator = %indicator.name, frequency = %indicator.frequency, "Cache hit");
                return Ok(cached.data.clone());
            }
        }

        debug!(indicator = %indicator.name, frequency = %indicator.frequency, "Cache miss, fetching");
        let response = self.fetch(indicator.api, indicator.frequency, entity).await?;

        entity.cache_data.upsert(CacheIndicator {
            name: indicator.name.clone(),
            api_type: indicator.api_type,
            data: response.clone(),
            frequency: indicator.frequency,
            total_value: None,
        });
        entity.cache_data.touch(Utc::now());

        Ok(response)
    }

    /// Raw records for indicators that filter before grouping.
    pub async fn get_indicator_data(&self, indicator: &Indicator, entity: &mut Entity) -> Result<Vec<StatsResponse>> {
        self.get_data_from_cache_or_api(indicator, entity).await
    }

    pub async fn get_data_grouped_by_profile(&self, indicator: &Indicator, entity: &mut Entity) -> Result<ChartDataGroupedByKey> {
        let data = self.get_data_from_cache_or_api(indicator, entity).await?;
        Ok(chart::group_by_key(&data, GroupKey::Profile, indicator.api_type.as_str()))
    }

    pub async fn get_data_grouped_by_profile_with_date(&self, indicator: &Indicator, entity: &mut Entity) -> Result<ChartDataGroupedWithDate> {
        let data = self.get_data_from_cache_or_api(indicator, entity).await?;
        Ok(chart::group_by_profile_with_date(&data, indicator.api_type.as_str()))
    }

    pub async fn get_data_grouped_by_profile_and_module(&self, indicator: &Indicator, entity: &mut Entity) -> Result<ChartDataGroupedByKeys> {
        let data = self.get_data_from_cache_or_api(indicator, entity).await?;
        Ok(chart::group_by_keys(
            &data,
            GroupKey::Profile,
            GroupKey::Module,
            indicator.api_type.as_str(),
        ))
    }

    pub fn needs_refresh(&self, cache_data: &CacheData) -> bool {
        cache_data.needs_refresh(self.ttl)
    }
}

fn filter_type(data: &[StatsResponse], kind: AccessType) -> Vec<StatsResponse> {
    data.iter().filter(|d| d.is_type(kind)).cloned().collect()
}

/// Headline number shown next to an indicator, when it has one.
fn total_for(indicator: &Indicator, data: &[StatsResponse]) -> Option<f64> {
    match indicator.name.as_str() {
        CONNECTIONS => Some(data.iter().map(|d| d.metric(indicator.api_type.as_str())).sum()),
        // activated is cumulative: take each profile's latest value
        ACTIVATED_ACCOUNTS => Some(
            Profile::ACCOUNT_PROFILES
                .iter()
                .map(|profile| {
                    let by_profile: Vec<StatsResponse> = data
                        .iter()
                        .filter(|d| d.profile.as_deref() == Some(profile.as_str()))
                        .cloned()
                        .collect();
                    match date::max_date(&by_profile) {
                        Some(max) => by_profile
                            .iter()
                            .filter(|d| d.parsed_date() == Some(max))
                            .map(|d| d.metric("activated"))
                            .sum(),
                        None => 0.0,
                    }
                })
                .sum(),
        ),
        _ => None,
    }
}
