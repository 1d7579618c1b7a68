use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date;

/// Kind of an `access` record: an application launch or a connector use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessType {
    Access,
    Connector,
    #[serde(other)]
    Other,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Access => "ACCESS",
            AccessType::Connector => "CONNECTOR",
            AccessType::Other => "OTHER",
        }
    }
}

/// Record field a grouping function can key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Profile,
    Module,
    Type,
    DeviceType,
    Date,
}

/// One row of the stats API response.
///
/// Metric columns vary per endpoint (`authentications`, `unique_visitors`,
/// `activated`, `access`, ...) and are kept in `metrics` as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl StatsResponse {
    /// Numeric value of a metric column; absent or non-numeric reads as 0.
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics
            .get(name)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    /// String value of the field a grouping keys on.
    pub fn field(&self, key: GroupKey) -> Option<&str> {
        match key {
            GroupKey::Profile => self.profile.as_deref(),
            GroupKey::Module => self.module.as_deref(),
            GroupKey::Type => self.access_type.as_ref().map(|t| t.as_str()),
            GroupKey::DeviceType => self.device_type.as_deref(),
            GroupKey::Date => Some(self.date.as_str()),
        }
        .filter(|s| !s.is_empty())
    }

    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        date::parse_record_date(&self.date)
    }

    pub fn is_type(&self, kind: AccessType) -> bool {
        self.access_type == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accounts_record() {
        let json = r#"{"date":"2024-03-01 00:00:00","profile":"Teacher","authentications":42,"unique_visitors":7,"activated":12,"platform_id":"abc"}"#;
        let record: StatsResponse = serde_json::from_str(json).expect("accounts record");
        assert_eq!(record.profile.as_deref(), Some("Teacher"));
        assert_eq!(record.metric("authentications"), 42.0);
        assert_eq!(record.metric("unique_visitors"), 7.0);
        // Non-numeric extras are carried but read as zero
        assert_eq!(record.metric("platform_id"), 0.0);
        assert_eq!(record.metric("missing"), 0.0);
        assert!(record.parsed_date().is_some());
    }

    #[test]
    fn test_parse_access_record_types() {
        let json = r#"[
            {"date":"2024-03-01T00:00:00Z","profile":"Student","module":"Blog","type":"ACCESS","access":3},
            {"date":"2024-03-01T00:00:00Z","profile":"Student","module":"Pronote","type":"CONNECTOR","access":5},
            {"date":"2024-03-01T00:00:00Z","profile":"Student","module":"X","type":"SOMETHING","access":1}
        ]"#;
        let records: Vec<StatsResponse> = serde_json::from_str(json).expect("access records");
        assert!(records[0].is_type(AccessType::Access));
        assert!(records[1].is_type(AccessType::Connector));
        assert_eq!(records[2].access_type, Some(AccessType::Other));
        assert_eq!(records[1].field(GroupKey::Type), Some("CONNECTOR"));
        assert_eq!(records[1].field(GroupKey::Module), Some("Pronote"));
    }

    #[test]
    fn test_empty_field_is_absent() {
        let record: StatsResponse =
            serde_json::from_str(r#"{"date":"2024-03-01","profile":"","module":"Blog"}"#).unwrap();
        assert_eq!(record.field(GroupKey::Profile), None);
        assert_eq!(record.field(GroupKey::DeviceType), None);
        assert_eq!(record.field(GroupKey::Date), Some("2024-03-01"));
    }
}
