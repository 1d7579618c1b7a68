//! The indicator catalogue and per-indicator chart shaping.
//!
//! Descriptors are plain data (see `models::Indicator`); the behaviour that
//! differs between indicators lives in `chart_data` and `post_init`, keyed
//! on the indicator name.

pub mod bar;
pub mod line;

use anyhow::Result;
use tracing::debug;

use crate::api::StatsSource;
use crate::cache::CacheService;
use crate::chart::{self, AppOption, ChartData};
use crate::models::{AccessType, ApiType, Entity, GroupKey, Indicator, Profile, StatsResponse};

pub use bar::{most_used_app, most_used_connector};
pub use line::{
    activated_accounts, connections, connections_by_unique_visitors, connector_details, devices,
    unique_visitors,
};

pub const CONNECTIONS: &str = "stats.connections";
pub const UNIQUE_VISITORS: &str = "stats.uniqueVisitors";
pub const CONNECTIONS_BY_UNIQUE_VISITORS: &str = "stats.connectionsByUniqueVisitors";
pub const ACTIVATED_ACCOUNTS: &str = "stats.activatedAccounts";
pub const DEVICES: &str = "stats.devices";
pub const CONNECTOR_DETAILS: &str = "stats.connectorDetails";
pub const MOST_USED_APP: &str = "stats.mostUsedApp";
pub const MOST_USED_CONNECTOR: &str = "stats.mostUsedConnector";

/// How many modules a ranking bar chart shows.
pub const TOP_MODULES: usize = 10;

/// Every indicator, in dashboard order.
pub fn all() -> Vec<Indicator> {
    vec![
        connections(),
        unique_visitors(),
        connections_by_unique_visitors(),
        activated_accounts(),
        devices(),
        most_used_app(),
        most_used_connector(),
        connector_details(),
    ]
}

pub fn find(name: &str) -> Option<Indicator> {
    all().into_iter().find(|i| i.name == name)
}

/// Restrict records to the indicator's selected profile, if any.
fn filter_profile(indicator: &Indicator, data: Vec<StatsResponse>) -> Vec<StatsResponse> {
    match indicator.chart_profile {
        Some(profile) if profile != Profile::Total => data
            .into_iter()
            .filter(|d| d.profile.as_deref() == Some(profile.as_str()))
            .collect(),
        _ => data,
    }
}

fn of_type(data: Vec<StatsResponse>, kind: AccessType) -> Vec<StatsResponse> {
    data.into_iter().filter(|d| d.is_type(kind)).collect()
}

/// Chart-ready data for `indicator` on `entity`, going through the cache.
///
/// `selected_app` picks the connector for `stats.connectorDetails`; when
/// absent the first connector by name is used.
pub async fn chart_data<S: StatsSource>(
    indicator: &Indicator,
    entity: &mut Entity,
    cache: &CacheService<S>,
    selected_app: Option<&str>,
) -> Result<ChartData> {
    let data = filter_profile(indicator, cache.get_indicator_data(indicator, entity).await?);
    debug!(indicator = %indicator.name, records = data.len(), "Shaping chart data");

    let shaped = match indicator.name.as_str() {
        CONNECTIONS_BY_UNIQUE_VISITORS => ChartData::ByDate(chart::ratio_by_profile_with_date(
            &data,
            ApiType::Authentications.as_str(),
            ApiType::UniqueVisitors.as_str(),
        )),
        DEVICES => ChartData::ByDate(chart::group_by_key_with_date(
            &data,
            GroupKey::DeviceType,
            ApiType::Authentications.as_str(),
        )),
        CONNECTOR_DETAILS => {
            let connectors = of_type(data, AccessType::Connector);
            let app = match selected_app {
                Some(app) => Some(app.to_string()),
                None => chart::app_names(&connectors).into_iter().next().map(|a| a.key),
            };
            let selected: Vec<StatsResponse> = connectors
                .into_iter()
                .filter(|d| app.is_some() && d.module == app)
                .collect();
            ChartData::ByDate(chart::group_by_profile_with_date(&selected, indicator.api_type.as_str()))
        }
        MOST_USED_APP | MOST_USED_CONNECTOR => {
            let kind = if indicator.name == MOST_USED_APP {
                AccessType::Access
            } else {
                AccessType::Connector
            };
            let grouped = chart::group_by_key(&of_type(data, kind), GroupKey::Module, indicator.api_type.as_str());
            ChartData::Ranked(chart::top_n(&grouped, TOP_MODULES))
        }
        _ => ChartData::ByDate(chart::group_by_profile_with_date(&data, indicator.api_type.as_str())),
    };
    Ok(shaped)
}

/// Selector options derived from freshly loaded API data.
///
/// Only `stats.connectorDetails` has a selector: its connector names.
pub fn post_init(indicator: &Indicator, api_data: &[StatsResponse]) -> Vec<AppOption> {
    if indicator.name != CONNECTOR_DETAILS {
        return Vec::new();
    }
    let connectors: Vec<StatsResponse> = api_data
        .iter()
        .filter(|d| d.is_type(AccessType::Connector))
        .cloned()
        .collect();
    chart::app_names(&connectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityLevel, Frequency, IndicatorApi};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        accounts: Vec<StatsResponse>,
        access: Vec<StatsResponse>,
        calls: AtomicUsize,
    }

    impl StatsSource for FixedSource {
        async fn get_stats(
            &self,
            api: IndicatorApi,
            _since: &str,
            _frequency: Frequency,
            _entity_level: EntityLevel,
            _entity_ids: &[String],
        ) -> Result<Vec<StatsResponse>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match api {
                IndicatorApi::Accounts => self.accounts.clone(),
                IndicatorApi::Access => self.access.clone(),
            })
        }
    }

    fn records(values: serde_json::Value) -> Vec<StatsResponse> {
        serde_json::from_value(values).expect("records")
    }

    fn service() -> CacheService<FixedSource> {
        CacheService::new(FixedSource {
            accounts: records(json!([
                {"date": "2024-01-01", "profile": "Teacher", "device_type": "mobile", "authentications": 8, "unique_visitors": 4},
                {"date": "2024-01-01", "profile": "Teacher", "device_type": "desktop", "authentications": 2, "unique_visitors": 1},
                {"date": "2024-01-01", "profile": "Student", "device_type": "mobile", "authentications": 9, "unique_visitors": 3},
            ])),
            access: records(json!([
                {"date": "2024-01-01", "profile": "Teacher", "module": "Blog", "type": "ACCESS", "access": 4},
                {"date": "2024-01-01", "profile": "Student", "module": "Wiki", "type": "ACCESS", "access": 9},
                {"date": "2024-01-01", "profile": "Teacher", "module": "Pronote", "type": "CONNECTOR", "access": 6},
                {"date": "2024-02-01", "profile": "Teacher", "module": "Pronote", "type": "CONNECTOR", "access": 1},
                {"date": "2024-01-01", "profile": "Student", "module": "Moodle", "type": "CONNECTOR", "access": 3},
            ])),
            calls: AtomicUsize::new(0),
        })
    }

    fn by_date(data: ChartData) -> chart::ChartDataGroupedWithDate {
        match data {
            ChartData::ByDate(series) => series,
            other => panic!("expected ByDate, got {other:?}"),
        }
    }

    fn ranked(data: ChartData) -> Vec<chart::KeyValue> {
        match data {
            ChartData::Ranked(values) => values,
            other => panic!("expected Ranked, got {other:?}"),
        }
    }

    #[test]
    fn test_catalogue_names_unique_and_findable() {
        let all = all();
        assert_eq!(all.len(), 8);
        for indicator in &all {
            assert_eq!(find(&indicator.name).as_ref(), Some(indicator));
        }
        assert!(find("stats.unknown").is_none());

        let filtered: Vec<String> = all.into_iter().filter(|i| i.profile_filter).map(|i| i.name).collect();
        assert_eq!(filtered, vec![CONNECTOR_DETAILS]);
    }

    #[tokio::test]
    async fn test_plain_line_groups_by_profile() {
        let mut entity = Entity::new("s", EntityLevel::Structure);
        let series = by_date(chart_data(&connections(), &mut entity, &service(), None).await.unwrap());
        assert_eq!(series["Teacher"][0].value, 10.0);
        assert_eq!(series["Student"][0].value, 9.0);
    }

    #[tokio::test]
    async fn test_connections_by_unique_visitors_ratio() {
        let mut entity = Entity::new("s", EntityLevel::Structure);
        let series = by_date(
            chart_data(&connections_by_unique_visitors(), &mut entity, &service(), None)
                .await
                .unwrap(),
        );
        assert_eq!(series["Teacher"][0].value, 2.0);
        assert_eq!(series["Student"][0].value, 3.0);
    }

    #[tokio::test]
    async fn test_devices_by_device_type_with_profile_filter() {
        let mut entity = Entity::new("s", EntityLevel::Structure);
        let series = by_date(chart_data(&devices(), &mut entity, &service(), None).await.unwrap());
        assert_eq!(series["mobile"][0].value, 17.0);
        assert_eq!(series["desktop"][0].value, 2.0);

        let mut students = devices();
        students.chart_profile = Some(Profile::Student);
        let series = by_date(chart_data(&students, &mut entity, &service(), None).await.unwrap());
        assert_eq!(series["mobile"][0].value, 9.0);
        assert!(!series.contains_key("desktop"));
    }

    #[tokio::test]
    async fn test_most_used_rankings() {
        let mut entity = Entity::new("s", EntityLevel::Structure);
        let apps = ranked(chart_data(&most_used_app(), &mut entity, &service(), None).await.unwrap());
        assert_eq!(apps.iter().map(|kv| kv.key.as_str()).collect::<Vec<_>>(), vec!["Wiki", "Blog"]);

        let connectors = ranked(chart_data(&most_used_connector(), &mut entity, &service(), None).await.unwrap());
        assert_eq!(connectors[0].key, "Pronote");
        assert_eq!(connectors[0].value, 7.0);
        assert_eq!(connectors[1].key, "Moodle");
    }

    #[tokio::test]
    async fn test_connector_details_selected_app() {
        let mut entity = Entity::new("s", EntityLevel::Structure);
        let service = service();

        let series = by_date(
            chart_data(&connector_details(), &mut entity, &service, Some("Pronote"))
                .await
                .unwrap(),
        );
        assert_eq!(series["Teacher"].len(), 2);
        assert!(!series.contains_key("Student"));

        // Defaults to the first connector by name
        let series = by_date(chart_data(&connector_details(), &mut entity, &service, None).await.unwrap());
        assert_eq!(series["Student"][0].value, 3.0);
        assert!(!series.contains_key("Teacher"));
    }

    #[tokio::test]
    async fn test_connector_details_charts_from_month_cache() {
        let mut entity = Entity::new("s", EntityLevel::Structure);
        let service = service();
        service.init_entity_month_cache_data(&all(), &mut entity).await.unwrap();
        let fetched = service.source().calls.load(Ordering::SeqCst);
        assert_eq!(fetched, 2);

        let series = by_date(
            chart_data(&connector_details(), &mut entity, &service, Some("Pronote"))
                .await
                .unwrap(),
        );
        let values: Vec<f64> = series["Teacher"].iter().map(|v| v.value).collect();
        assert_eq!(values, vec![6.0, 1.0]);

        let series = by_date(chart_data(&connector_details(), &mut entity, &service, None).await.unwrap());
        assert_eq!(series["Student"][0].value, 3.0);

        assert_eq!(service.source().calls.load(Ordering::SeqCst), fetched);
    }

    #[test]
    fn test_post_init_lists_connectors() {
        let data = records(json!([
            {"date": "2024-01-01", "module": "Pronote", "type": "CONNECTOR"},
            {"date": "2024-01-01", "module": "Blog", "type": "ACCESS"},
            {"date": "2024-01-01", "module": "Moodle", "type": "CONNECTOR"},
        ]));
        let names: Vec<String> = post_init(&connector_details(), &data).into_iter().map(|a| a.key).collect();
        assert_eq!(names, vec!["Moodle", "Pronote"]);
        assert!(post_init(&connections(), &data).is_empty());
    }
}
