//! Bar chart indicators ranking applications and connectors by use.

use crate::models::{ApiType, ChartType, Frequency, Indicator, IndicatorApi};

use super::{MOST_USED_APP, MOST_USED_CONNECTOR};

fn bar(name: &str, title: &str) -> Indicator {
    Indicator {
        name: name.to_string(),
        chart_type: ChartType::Bar,
        since: String::new(),
        icon: "stats-service-icon".to_string(),
        api: IndicatorApi::Access,
        api_type: ApiType::Access,
        chart_title: title.to_string(),
        chart_frequencies: vec![Frequency::Day, Frequency::Week, Frequency::Month],
        frequency: Frequency::Month,
        chart_profile: None,
        chart_profiles: None,
        export_frequency: None,
        data_exportable: false,
        profile_filter: false,
    }
}

pub fn most_used_app() -> Indicator {
    bar(MOST_USED_APP, "stats.labels.mostUsedApps")
}

pub fn most_used_connector() -> Indicator {
    bar(MOST_USED_CONNECTOR, "stats.labels.mostUsedConnectors")
}
