//! Line chart indicators.

use crate::models::{ApiType, ChartType, Frequency, Indicator, IndicatorApi, Profile};

use super::{
    ACTIVATED_ACCOUNTS, CONNECTIONS, CONNECTIONS_BY_UNIQUE_VISITORS, CONNECTOR_DETAILS, DEVICES,
    UNIQUE_VISITORS,
};

const ALL_FREQUENCIES: [Frequency; 3] = [Frequency::Day, Frequency::Week, Frequency::Month];

const FIRST_DAY_OF_MONTH: &str = "stats.firstDayOfMonth";

fn profile_choices() -> Vec<Profile> {
    vec![
        Profile::Total,
        Profile::Teacher,
        Profile::Personnel,
        Profile::Relative,
        Profile::Student,
    ]
}

fn line(name: &str, since: &str, icon: &str, api: IndicatorApi, api_type: ApiType, title: &str) -> Indicator {
    Indicator {
        name: name.to_string(),
        chart_type: ChartType::Line,
        since: since.to_string(),
        icon: icon.to_string(),
        api,
        api_type,
        chart_title: title.to_string(),
        chart_frequencies: ALL_FREQUENCIES.to_vec(),
        frequency: Frequency::Month,
        chart_profile: None,
        chart_profiles: None,
        export_frequency: None,
        data_exportable: false,
        profile_filter: false,
    }
}

pub fn connections() -> Indicator {
    line(
        CONNECTIONS,
        "",
        "connection-icon",
        IndicatorApi::Accounts,
        ApiType::Authentications,
        "stats.labels.connections",
    )
}

pub fn unique_visitors() -> Indicator {
    line(
        UNIQUE_VISITORS,
        FIRST_DAY_OF_MONTH,
        "unique-visitors-icon",
        IndicatorApi::Accounts,
        ApiType::UniqueVisitors,
        "stats.labels.uniqueVisitors",
    )
}

pub fn connections_by_unique_visitors() -> Indicator {
    line(
        CONNECTIONS_BY_UNIQUE_VISITORS,
        FIRST_DAY_OF_MONTH,
        "connection-by-visitors-icon",
        IndicatorApi::Accounts,
        ApiType::Mixed,
        "stats.labels.connectionsByUniqueVisitors",
    )
}

pub fn activated_accounts() -> Indicator {
    Indicator {
        chart_profile: Some(Profile::Total),
        chart_profiles: Some(profile_choices()),
        ..line(
            ACTIVATED_ACCOUNTS,
            "",
            "people-icon",
            IndicatorApi::Accounts,
            ApiType::Activated,
            "stats.labels.activatedAccounts",
        )
    }
}

pub fn devices() -> Indicator {
    Indicator {
        chart_profile: Some(Profile::Total),
        chart_profiles: Some(profile_choices()),
        ..line(
            DEVICES,
            "",
            "device-icon",
            IndicatorApi::Accounts,
            ApiType::Mixed,
            "stats.labels.devices",
        )
    }
}

/// Connector usage over time for the app picked in the selector.
pub fn connector_details() -> Indicator {
    Indicator {
        export_frequency: Some(Frequency::Day),
        data_exportable: true,
        profile_filter: true,
        ..line(
            CONNECTOR_DETAILS,
            "",
            "stats-service-icon",
            IndicatorApi::Access,
            ApiType::Access,
            "stats.labels.mostUsedConnectors",
        )
    }
}
