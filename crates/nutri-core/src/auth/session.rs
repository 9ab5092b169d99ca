use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub stored_at: DateTime<Utc>,
}

/// Token slot persisted as JSON in the cache directory, so a login survives
/// restarts of the host.
pub struct FileTokenStore {
    cache_dir: PathBuf,
    // Serializes read-modify-write of the session file.
    io: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            io: Mutex::new(()),
        }
    }

    /// Load the stored session record, if any
    pub fn load_data(&self) -> Result<Option<SessionData>> {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.load_data()?.map(|d| d.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        let data = SessionData {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let contents = serde_json::to_string_pretty(&data)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);
        store.save("token-1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("token-1"));

        let data = store.load_data().unwrap().unwrap();
        assert!(data.stored_at <= Utc::now());

        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Removing twice is fine
        store.remove().unwrap();
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());
        assert!(store.load().is_err());
    }
}
