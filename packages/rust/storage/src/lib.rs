//! Persisted record of processed samples, used for change detection.
//!
//! The [`BuildCache`] maps a project-relative sample path to the SHA-256 of the
//! contents it had when it was last processed. It is advisory only: a missing,
//! unreadable or outdated record degrades to "process everything".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use samplebuilder_shared::{Result, SampleBuilderError};

/// Current schema version of the cache record.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// One processed sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA-256 (hex) of the sample contents.
    pub hash: String,
    pub recorded_at: DateTime<Utc>,
}

/// On-disk layout of the record.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    schema_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

/// Change detection record for one build destination.
#[derive(Debug, Clone)]
pub struct BuildCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl BuildCache {
    /// An empty record that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the record at `path`. Never fails: problems are logged and an
    /// empty record is returned so every sample gets rebuilt.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no build cache yet");
                return Self::empty(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "build cache unreadable, rebuilding everything");
                return Self::empty(path);
            }
        };

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) if file.schema_version == CACHE_SCHEMA_VERSION => {
                debug!(path = %path.display(), entries = file.entries.len(), "loaded build cache");
                Self {
                    path,
                    entries: file.entries,
                }
            }
            Ok(file) => {
                warn!(
                    path = %path.display(),
                    found = file.schema_version,
                    expected = CACHE_SCHEMA_VERSION,
                    "build cache schema mismatch, rebuilding everything"
                );
                Self::empty(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "build cache invalid, rebuilding everything");
                Self::empty(path)
            }
        }
    }

    /// Hash used to detect content changes.
    pub fn content_hash(contents: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(contents);
        format!("{:x}", hasher.finalize())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Whether `key` was already processed with exactly these contents.
    pub fn is_fresh(&self, key: &str, hash: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.hash == hash)
    }

    /// Remember that `key` was processed with contents hashing to `hash`.
    pub fn record(&mut self, key: impl Into<String>, hash: impl Into<String>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                hash: hash.into(),
                recorded_at: Utc::now(),
            },
        );
    }

    /// Drop `key` so it gets rebuilt next time.
    pub fn forget(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Write the record atomically (temp file, then rename).
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SampleBuilderError::io(parent, e))?;
        }

        let file = CacheFile {
            schema_version: CACHE_SCHEMA_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| SampleBuilderError::Cache(format!("serialization failed: {e}")))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json).map_err(|e| SampleBuilderError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| SampleBuilderError::io(&self.path, e))?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "saved build cache");
        Ok(())
    }

    /// Delete the record file at `path`, if any.
    pub fn remove(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SampleBuilderError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sb-cache-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_record_is_empty() {
        let dir = temp_dir();
        let cache = BuildCache::load(dir.join("nope.json"));
        assert!(cache.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn record_save_load_roundtrip() {
        let dir = temp_dir();
        let path = dir.join(".cache").join("examples.json");

        let hash = BuildCache::content_hash(b"<html>one</html>");
        let mut cache = BuildCache::empty(&path);
        cache.record("examples/source/01-a/one.html", hash.clone());
        cache.save().expect("save");

        let loaded = BuildCache::load(&path);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.is_fresh("examples/source/01-a/one.html", &hash));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn changed_contents_are_not_fresh() {
        let mut cache = BuildCache::empty("/unused.json");
        cache.record("a.html", BuildCache::content_hash(b"v1"));
        assert!(!cache.is_fresh("a.html", &BuildCache::content_hash(b"v2")));
        assert!(!cache.is_fresh("b.html", &BuildCache::content_hash(b"v1")));
    }

    #[test]
    fn forget_drops_entry() {
        let mut cache = BuildCache::empty("/unused.json");
        cache.record("a.html", "h");
        cache.forget("a.html");
        assert!(cache.get("a.html").is_none());
    }

    #[test]
    fn corrupt_record_degrades_to_empty() {
        let dir = temp_dir();
        let path = dir.join("examples.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(BuildCache::load(&path).is_empty());

        std::fs::write(&path, r#"{"schema_version":99,"entries":{}}"#).unwrap();
        assert!(BuildCache::load(&path).is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = temp_dir();
        let path = dir.join("examples.json");
        std::fs::write(&path, "{}").unwrap();
        BuildCache::remove(&path).expect("remove");
        BuildCache::remove(&path).expect("remove again");
        assert!(!path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
