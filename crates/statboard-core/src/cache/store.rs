use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::{Entity, EntityLevel};

/// On-disk snapshots of entity caches, one JSON file per entity.
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entity_path(&self, level: EntityLevel, id: &str) -> PathBuf {
        // Ids come from the command line; keep them from escaping the directory
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{}_{}.json", level, safe_id))
    }

    pub fn load_entity(&self, level: EntityLevel, id: &str) -> Result<Option<Entity>> {
        let path = self.entity_path(level, id);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
        let entity: Entity = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;

        debug!(entity = id, level = %level, age = %entity.cache_data.age_display(), "Loaded entity cache");
        Ok(Some(entity))
    }

    /// Load the entity's snapshot, or start from an empty cache when there is
    /// none or it cannot be read.
    pub fn load_or_new(&self, level: EntityLevel, id: &str) -> Entity {
        match self.load_entity(level, id) {
            Ok(Some(entity)) => entity,
            Ok(None) => Entity::new(id, level),
            Err(e) => {
                warn!(entity = id, error = %e, "Ignoring unreadable entity cache");
                Entity::new(id, level)
            }
        }
    }

    pub fn save_entity(&self, entity: &Entity) -> Result<()> {
        let path = self.entity_path(entity.level, &entity.id);
        let contents = serde_json::to_string_pretty(entity)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
        Ok(())
    }

    /// Cached entities with their age, for status display.
    pub fn entries(&self) -> Result<Vec<(Entity, String)>> {
        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&self.cache_dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|s| serde_json::from_str::<Entity>(&s).map_err(anyhow::Error::from));
            match parsed {
                Ok(entity) => {
                    let age = entity.cache_data.age_display();
                    entries.push((entity, age));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable cache file"),
            }
        }
        entries.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        Ok(entries)
    }

    /// Remove every snapshot; returns how many files were deleted.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for dir_entry in std::fs::read_dir(&self.cache_dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
