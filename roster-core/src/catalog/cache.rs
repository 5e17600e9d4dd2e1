//! Index version cache
//!
//! Remembers which concrete version of the index module was last
//! resolved so that a session can skip the version lookup round-trip.
//! A record is only reused while it is younger than the TTL and was
//! written for the index module that is configured right now, at a
//! version the configured reference still accepts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ModuleRef;

/// Default cache TTL (24 hours)
pub const INDEX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Persisted cache record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedIndexRecord {
    /// Concrete index module reference, e.g. `github.com/acme/assets/index@v0.4.1`
    pub module: String,

    /// When the version was resolved
    pub cached_at: DateTime<Utc>,
}

impl CachedIndexRecord {
    pub fn new(module: &ModuleRef, cached_at: DateTime<Utc>) -> Self {
        Self {
            module: module.to_string(),
            cached_at,
        }
    }

    /// Parsed concrete module reference, if the record holds one
    pub fn module_ref(&self) -> Option<ModuleRef> {
        let module: ModuleRef = self.module.parse().ok()?;
        module.is_concrete().then_some(module)
    }

    /// Whether this record may stand in for resolving `configured`
    pub fn is_usable(&self, configured: &ModuleRef, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Some(cached) = self.module_ref() else {
            return false;
        };

        if cached.identity() != configured.identity() {
            tracing::debug!(
                "Ignoring index cache for {} (configured {})",
                cached.identity(),
                configured.identity()
            );
            return false;
        }

        let accepted = cached
            .version
            .as_deref()
            .is_some_and(|v| configured.accepts(v));
        if !accepted {
            tracing::debug!("Ignoring index cache {} (configured {})", cached, configured);
            return false;
        }

        let age = now.signed_duration_since(self.cached_at);
        let fresh = age
            .to_std()
            .map(|age| age < ttl)
            .unwrap_or(false);

        if !fresh {
            tracing::debug!("Index cache expired (age: {})", age);
        }
        fresh
    }
}

/// Storage for the cache record
pub trait IndexCache: Send + Sync {
    /// Load the record, `None` when nothing was cached yet
    fn load(&self) -> Result<Option<CachedIndexRecord>>;

    /// Replace the record
    fn store(&self, record: &CachedIndexRecord) -> Result<()>;
}

/// Cache record stored as a YAML file in the data directory
pub struct FileIndexCache {
    path: PathBuf,
}

impl FileIndexCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the cached record
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove cache: {}", self.path.display()))?;
        Ok(true)
    }
}

impl IndexCache for FileIndexCache {
    fn load(&self) -> Result<Option<CachedIndexRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache: {}", self.path.display()))?;

        let record = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse cache: {}", self.path.display()))?;

        Ok(Some(record))
    }

    fn store(&self, record: &CachedIndexRecord) -> Result<()> {
        let parent = self
            .path
            .parent()
            .context("Cache path has no parent directory")?;
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create cache directory: {}", parent.display())
        })?;

        let content = serde_yaml_ng::to_string(record).context("Failed to serialize cache")?;

        // Write beside the target and rename so readers never see a partial record
        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create temporary cache file")?;
        temp.write_all(content.as_bytes())
            .context("Failed to write temporary cache file")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to write cache: {}", self.path.display()))?;

        tracing::debug!("Saved index version to cache: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn configured() -> ModuleRef {
        "github.com/acme/assets/index@v0".parse().unwrap()
    }

    #[test]
    fn test_missing_cache_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileIndexCache::new(temp_dir.path().join("index.yaml"));
        assert!(cache.load().unwrap().is_none());
        assert!(!cache.clear().unwrap());
    }

    #[test]
    fn test_store_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileIndexCache::new(temp_dir.path().join("nested/index.yaml"));

        let record = CachedIndexRecord::new(&configured().with_version("v0.4.1"), Utc::now());
        cache.store(&record).unwrap();

        let loaded = cache.load().unwrap().unwrap();
        assert_eq!(loaded, record);

        // Replacing keeps a single whole record
        let newer = CachedIndexRecord::new(&configured().with_version("v0.5.0"), Utc::now());
        cache.store(&newer).unwrap();
        assert_eq!(cache.load().unwrap().unwrap().module, newer.module);

        assert!(cache.clear().unwrap());
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_fresh_record_for_same_module_is_usable() {
        let now = Utc::now();
        let record = CachedIndexRecord::new(
            &configured().with_version("v0.4.1"),
            now - ChronoDuration::minutes(5),
        );
        assert!(record.is_usable(&configured(), now, INDEX_CACHE_TTL));
    }

    #[test]
    fn test_fresh_record_for_other_module_is_ignored() {
        let now = Utc::now();
        let record = CachedIndexRecord::new(
            &configured().with_version("v0.4.1"),
            now - ChronoDuration::minutes(5),
        );
        let other: ModuleRef = "github.com/other/assets/index@v0".parse().unwrap();
        assert!(!record.is_usable(&other, now, INDEX_CACHE_TTL));
    }

    #[test]
    fn test_record_outside_configured_major_is_ignored() {
        let now = Utc::now();
        let record = CachedIndexRecord::new(&configured().with_version("v0.4.1"), now);
        let next_major: ModuleRef = "github.com/acme/assets/index@v1".parse().unwrap();
        assert!(!record.is_usable(&next_major, now, INDEX_CACHE_TTL));

        let pinned: ModuleRef = "github.com/acme/assets/index@v0.4.1".parse().unwrap();
        assert!(record.is_usable(&pinned, now, INDEX_CACHE_TTL));
    }

    #[test]
    fn test_expired_record_is_ignored() {
        let now = Utc::now();
        let record = CachedIndexRecord::new(
            &configured().with_version("v0.4.1"),
            now - ChronoDuration::hours(25),
        );
        assert!(!record.is_usable(&configured(), now, INDEX_CACHE_TTL));
    }

    #[test]
    fn test_record_without_concrete_version_is_ignored() {
        let now = Utc::now();
        let record = CachedIndexRecord {
            module: "github.com/acme/assets/index@v0".to_string(),
            cached_at: now,
        };
        assert!(!record.is_usable(&configured(), now, INDEX_CACHE_TTL));
    }
}
