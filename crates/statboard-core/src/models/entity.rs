use serde::{Deserialize, Serialize};

use crate::cache::CacheData;

use super::indicator::ParseError;

/// Granularity the stats API aggregates an entity at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum EntityLevel {
    Structure,
    Project,
    Platform,
}

impl EntityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLevel::Structure => "structure",
            EntityLevel::Project => "project",
            EntityLevel::Platform => "platform",
        }
    }
}

impl std::fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structure" => Ok(EntityLevel::Structure),
            "project" => Ok(EntityLevel::Project),
            "platform" => Ok(EntityLevel::Platform),
            other => Err(ParseError {
                kind: "entity level",
                value: other.to_string(),
            }),
        }
    }
}

/// An organizational unit (school, project, platform) and its cached stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub level: EntityLevel,
    #[serde(default)]
    pub cache_data: CacheData,
}

impl Entity {
    pub fn new(id: impl Into<String>, level: EntityLevel) -> Self {
        Self {
            id: id.into(),
            name: None,
            level,
            cache_data: CacheData::default(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
