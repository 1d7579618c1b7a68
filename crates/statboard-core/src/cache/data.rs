use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ApiType, Frequency, StatsResponse};
use crate::utils::format_age;

/// Consider cache stale after 1 hour.
pub const CACHE_STALE_MINUTES: i64 = 60;

/// Last fetch of one indicator at one frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheIndicator {
    pub name: String,
    pub api_type: ApiType,
    pub data: Vec<StatsResponse>,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
}

/// In-memory stats holder for one entity.
///
/// `last_update` is shared by every entry: refreshing one indicator marks
/// the whole entity as fresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    pub indicators: Vec<CacheIndicator>,
    pub last_update: Option<DateTime<Utc>>,
}

impl CacheData {
    pub fn find(&self, name: &str, frequency: Frequency) -> Option<&CacheIndicator> {
        self.indicators
            .iter()
            .find(|i| i.name == name && i.frequency == frequency)
    }

    /// Insert `entry`, replacing any entry with the same name and frequency.
    pub fn upsert(&mut self, entry: CacheIndicator) {
        self.indicators
            .retain(|i| !(i.name == entry.name && i.frequency == entry.frequency));
        self.indicators.push(entry);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_update = Some(now);
    }

    /// Cached total of an indicator, from the month-frequency summary.
    pub fn total_value(&self, name: &str) -> Option<f64> {
        self.indicators
            .iter()
            .find(|i| i.name == name && i.total_value.is_some())
            .and_then(|i| i.total_value)
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.last_update.map(|ts| (Utc::now() - ts).num_minutes())
    }

    pub fn age_display(&self) -> String {
        match self.age_minutes() {
            Some(minutes) => format_age(minutes),
            None => "never".to_string(),
        }
    }

    /// True when never fetched or older than `ttl`.
    pub fn needs_refresh(&self, ttl: Duration) -> bool {
        needs_refresh(self.last_update, ttl)
    }
}

pub fn needs_refresh(last_update: Option<DateTime<Utc>>, ttl: Duration) -> bool {
    match last_update {
        Some(ts) => crate::date::older_than(ts, Utc::now(), ttl),
        None => true,
    }
}
