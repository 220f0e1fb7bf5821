use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Persisted key/value storage for session entries, cookie style.
pub trait SessionStore: Send + Sync {
    /// Store `value` under `key`. `expires_at = None` scopes the entry to
    /// the current browsing context.
    fn set(&self, key: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> Result<()>;

    /// Read a live entry
    fn get(&self, key: &str) -> Option<String>;

    /// Delete an entry; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Utc::now() >= exp).unwrap_or(false)
    }

    pub fn is_durable(&self) -> bool {
        self.expires_at.is_some()
    }
}

/// Cookie-jar style store.
///
/// Entries with an expiry are written to `session.json` and reloaded on the
/// next start until they expire. Entries without one stay in memory and are
/// gone once the jar is dropped.
pub struct CookieJar {
    path: Option<PathBuf>,
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl CookieJar {
    /// Open the jar under `cache_dir`, loading unexpired durable entries.
    /// A corrupt session file is logged and ignored.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        let path = cache_dir.join(SESSION_FILE);
        let mut entries = HashMap::new();

        if path.exists() {
            match Self::read_file(&path) {
                Ok(stored) => {
                    let total = stored.len();
                    entries.extend(stored.into_iter().filter(|(_, e)| e.is_durable() && !e.is_expired()));
                    debug!(loaded = entries.len(), pruned = total - entries.len(), "Session jar loaded");
                }
                // Unusable jar: start empty, the next save overwrites it
                Err(e) => warn!(error = %e, "Ignoring unreadable session file"),
            }
        }

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    fn read_file(path: &Path) -> Result<HashMap<String, StoredEntry>> {
        let contents = std::fs::read_to_string(path)
            .context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    /// A jar that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Raw entry, expired or not
    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write the durable subset to disk
    fn save(&self, entries: &HashMap<String, StoredEntry>) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        let durable: HashMap<&String, &StoredEntry> = entries
            .iter()
            .filter(|(_, e)| e.is_durable() && !e.is_expired())
            .collect();

        if durable.is_empty() {
            if path.exists() {
                std::fs::remove_file(path).context("Failed to remove session file")?;
            }
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&durable)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl SessionStore for CookieJar {
    fn set(&self, key: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        self.save(&entries)
    }

    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let expired = entries.get(key)?.is_expired();
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_in_memory_set_get_remove() {
        let jar = CookieJar::in_memory();
        jar.set("token", "abc", None).unwrap();
        assert_eq!(jar.get("token").as_deref(), Some("abc"));

        jar.remove("token").unwrap();
        assert_eq!(jar.get("token"), None);
        // Removing again is fine
        jar.remove("token").unwrap();
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let jar = CookieJar::in_memory();
        jar.set("token", "abc", Some(Utc::now() - Duration::minutes(1))).unwrap();
        assert_eq!(jar.get("token"), None);
        assert!(jar.entry("token").is_none());
    }

    #[test]
    fn test_durable_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let jar = CookieJar::open(dir.path()).unwrap();
            jar.set("token", "abc", Some(Utc::now() + Duration::days(1))).unwrap();
            jar.set("userId", "1", Some(Utc::now() + Duration::days(1))).unwrap();
        }

        let jar = CookieJar::open(dir.path()).unwrap();
        assert_eq!(jar.get("token").as_deref(), Some("abc"));
        assert_eq!(jar.get("userId").as_deref(), Some("1"));
    }

    #[test]
    fn test_ephemeral_entries_never_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let jar = CookieJar::open(dir.path()).unwrap();
            jar.set("token", "abc", None).unwrap();
            assert_eq!(jar.get("token").as_deref(), Some("abc"));
        }
        assert!(!dir.path().join(SESSION_FILE).exists());

        let jar = CookieJar::open(dir.path()).unwrap();
        assert_eq!(jar.get("token"), None);
    }

    #[test]
    fn test_ephemeral_overwrite_drops_durable_copy() {
        let dir = tempfile::tempdir().unwrap();
        {
            let jar = CookieJar::open(dir.path()).unwrap();
            jar.set("token", "old", Some(Utc::now() + Duration::days(1))).unwrap();
            jar.set("token", "new", None).unwrap();
        }

        let jar = CookieJar::open(dir.path()).unwrap();
        assert_eq!(jar.get("token"), None);
    }

    #[test]
    fn test_expired_entries_pruned_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let stale = HashMap::from([(
            "token".to_string(),
            StoredEntry {
                value: "abc".to_string(),
                expires_at: Some(Utc::now() - Duration::hours(1)),
            },
        )]);
        std::fs::write(
            dir.path().join(SESSION_FILE),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        let jar = CookieJar::open(dir.path()).unwrap();
        assert!(jar.entry("token").is_none());
    }

    #[test]
    fn test_corrupt_session_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let jar = CookieJar::open(dir.path()).unwrap();
        assert_eq!(jar.get("token"), None);

        // Next durable write replaces the bad file
        jar.set("token", "abc", Some(Utc::now() + Duration::days(1))).unwrap();
        let reopened = CookieJar::open(dir.path()).unwrap();
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));
    }
}
