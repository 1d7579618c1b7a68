//! Indicator descriptors and the small vocabulary enums they are built from.
//!
//! Every enum serializes to the exact string the stats API and the web
//! front end use, so descriptors can be handed to a chart layer as JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` over the wire names.
macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ParseError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Bucket size of the records returned by the stats API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Day,
    Week,
    Month,
}

wire_names!(Frequency, "frequency", {
    Day => "day",
    Week => "week",
    Month => "month",
});

/// Which stats endpoint an indicator reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum IndicatorApi {
    Accounts,
    Access,
}

wire_names!(IndicatorApi, "indicator api", {
    Accounts => "accounts",
    Access => "access",
});

/// The metric column an indicator charts.
///
/// `Mixed` indicators derive their series from more than one column
/// (see `indicators::chart_data`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    Authentications,
    UniqueVisitors,
    Activated,
    Access,
    Mixed,
}

wire_names!(ApiType, "api type", {
    Authentications => "authentications",
    UniqueVisitors => "unique_visitors",
    Activated => "activated",
    Access => "access",
    Mixed => "mixed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Stackedbar,
}

wire_names!(ChartType, "chart type", {
    Line => "line",
    Bar => "bar",
    Stackedbar => "stackedbar",
});

/// Account profiles, plus the `total` pseudo-profile used by chart filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Profile {
    Student,
    Relative,
    Teacher,
    Personnel,
    Guest,
    #[serde(rename = "total")]
    Total,
}

wire_names!(Profile, "profile", {
    Student => "Student",
    Relative => "Relative",
    Teacher => "Teacher",
    Personnel => "Personnel",
    Guest => "Guest",
    Total => "total",
});

impl Profile {
    /// Real account profiles, in the order totals are accumulated.
    pub const ACCOUNT_PROFILES: [Profile; 5] = [
        Profile::Student,
        Profile::Relative,
        Profile::Teacher,
        Profile::Personnel,
        Profile::Guest,
    ];
}

/// Static descriptor of one chart.
///
/// `name`, `since` and `chart_title` are i18n keys and stay opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub name: String,
    pub chart_type: ChartType,
    pub since: String,
    pub icon: String,
    pub api: IndicatorApi,
    pub api_type: ApiType,
    pub chart_title: String,
    pub chart_frequencies: Vec<Frequency>,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_profiles: Option<Vec<Profile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_frequency: Option<Frequency>,
    #[serde(default)]
    pub data_exportable: bool,
    #[serde(default)]
    pub profile_filter: bool,
}

impl Indicator {
    /// Switch the chart frequency. Frequencies the chart does not offer are
    /// rejected and the current one is kept.
    pub fn set_frequency(&mut self, frequency: Frequency) -> bool {
        if self.chart_frequencies.contains(&frequency) {
            self.frequency = frequency;
            true
        } else {
            false
        }
    }

    /// Copy of this indicator at its export frequency (or current one).
    pub fn for_export(&self) -> Self {
        let mut copy = self.clone();
        if let Some(freq) = self.export_frequency {
            copy.frequency = freq;
        }
        copy
    }
}
