//! Chart-ready groupings of stats records.
//!
//! All functions aggregate by key over the in-memory record list; records
//! missing the grouping field are skipped.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date::parse_record_date;
use crate::models::{GroupKey, StatsResponse};

/// `key -> sum`
pub type ChartDataGroupedByKey = BTreeMap<String, f64>;

/// `key1 -> key2 -> sum`, e.g. profile then module.
pub type ChartDataGroupedByKeys = BTreeMap<String, BTreeMap<String, f64>>;

/// `key -> series sorted by date`
pub type ChartDataGroupedWithDate = BTreeMap<String, Vec<DatedValue>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DatedValue {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct KeyValue {
    pub key: String,
    pub value: f64,
}

/// Option for the app selector of connector charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AppOption {
    pub key: String,
    pub value: String,
}

/// What an indicator hands to the chart layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "kind", content = "series", rename_all = "snake_case")]
pub enum ChartData {
    /// Line series, one per key.
    ByDate(ChartDataGroupedWithDate),
    /// Bar values, largest first.
    Ranked(Vec<KeyValue>),
}

pub fn group_by_key(data: &[StatsResponse], key: GroupKey, metric: &str) -> ChartDataGroupedByKey {
    let mut grouped = ChartDataGroupedByKey::new();
    for record in data {
        if let Some(k) = record.field(key) {
            *grouped.entry(k.to_string()).or_insert(0.0) += record.metric(metric);
        }
    }
    grouped
}

pub fn group_by_keys(
    data: &[StatsResponse],
    key1: GroupKey,
    key2: GroupKey,
    metric: &str,
) -> ChartDataGroupedByKeys {
    let mut grouped = ChartDataGroupedByKeys::new();
    for record in data {
        if let (Some(k1), Some(k2)) = (record.field(key1), record.field(key2)) {
            *grouped
                .entry(k1.to_string())
                .or_default()
                .entry(k2.to_string())
                .or_insert(0.0) += record.metric(metric);
        }
    }
    grouped
}

/// Sum `metric` per `(key, date)` and return each key's series in date order.
pub fn group_by_key_with_date(
    data: &[StatsResponse],
    key: GroupKey,
    metric: &str,
) -> ChartDataGroupedWithDate {
    let mut sums: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for record in data {
        if let Some(k) = record.field(key) {
            *sums
                .entry(k.to_string())
                .or_default()
                .entry(record.date.clone())
                .or_insert(0.0) += record.metric(metric);
        }
    }

    sums.into_iter()
        .map(|(k, by_date)| {
            let mut series: Vec<DatedValue> = by_date
                .into_iter()
                .map(|(date, value)| DatedValue { date, value })
                .collect();
            series.sort_by_cached_key(|v| date_sort_key(&v.date));
            (k, series)
        })
        .collect()
}

pub fn group_by_profile_with_date(data: &[StatsResponse], metric: &str) -> ChartDataGroupedWithDate {
    group_by_key_with_date(data, GroupKey::Profile, metric)
}

/// `numerator / denominator` per profile and date; 0 where the denominator is 0.
pub fn ratio_by_profile_with_date(
    data: &[StatsResponse],
    numerator: &str,
    denominator: &str,
) -> ChartDataGroupedWithDate {
    let top = group_by_profile_with_date(data, numerator);
    let bottom = group_by_profile_with_date(data, denominator);

    top.into_iter()
        .map(|(profile, series)| {
            let divisors: BTreeMap<&str, f64> = bottom
                .get(&profile)
                .map(|s| s.iter().map(|dv| (dv.date.as_str(), dv.value)).collect())
                .unwrap_or_default();
            let ratios = series
                .iter()
                .map(|dv| {
                    let d = divisors.get(dv.date.as_str()).copied().unwrap_or(0.0);
                    let value = if d == 0.0 { 0.0 } else { dv.value / d };
                    DatedValue {
                        date: dv.date.clone(),
                        value,
                    }
                })
                .collect();
            (profile, ratios)
        })
        .collect()
}

/// Largest `n` entries first; ties keep key order.
pub fn top_n(grouped: &ChartDataGroupedByKey, n: usize) -> Vec<KeyValue> {
    let mut entries: Vec<KeyValue> = grouped
        .iter()
        .map(|(key, value)| KeyValue {
            key: key.clone(),
            value: *value,
        })
        .collect();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries.truncate(n);
    entries
}

/// Distinct module names, sorted, for an app selector.
pub fn app_names(data: &[StatsResponse]) -> Vec<AppOption> {
    data.iter()
        .filter_map(|d| d.field(GroupKey::Module))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|name| AppOption {
            key: name.to_string(),
            value: name.to_string(),
        })
        .collect()
}

/// Chronological where the date parses, raw text otherwise; unparseable
/// dates sort first.
pub(crate) fn date_sort_key(raw: &str) -> (Option<DateTime<Utc>>, String) {
    (parse_record_date(raw), raw.to_string())
}
