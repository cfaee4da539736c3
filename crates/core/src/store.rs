//! Persistent key-value store.
//!
//! Preferences, the first-run flag and session tokens are string values under fixed
//! keys (see [`crate::constants`]). [`FileStore`] keeps them in one YAML mapping on
//! disk:
//!
//! ```text
//! is_first_time: 'false'
//! language: en
//! theme: dark
//! activeLogin: '{"access_token":"…","profile":"Practitioner/1"}'
//! ```
//!
//! Writes go to a sibling temporary file which is then renamed over the store, so a
//! crash mid-write leaves the previous contents intact.

use crate::constants::ACTIVE_LOGIN_KEY;
use crate::{CoreError, CoreResult};
use medview_client::{ClientError, ClientResult, LoginState, TokenStore};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

// ============================================================================
// FILE STORE
// ============================================================================

/// YAML file backed store.
///
/// Every operation reads the file afresh; the lock serialises writers within the
/// process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (without creating) the store at `path`.
    ///
    /// The parent directory is created if needed; the file itself appears on first write.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(CoreError::StorageDirCreation)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> CoreResult<BTreeMap<String, String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(CoreError::FileRead(e)),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&text).map_err(CoreError::YamlDeserialization)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> CoreResult<()> {
        let text = serde_yaml::to_string(map).map_err(CoreError::YamlSerialization)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(CoreError::FileWrite)?;
        fs::rename(&tmp, &self.path).map_err(CoreError::FileWrite)
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> CoreResult<()> {
        let _guard = self.lock.lock().map_err(|_| CoreError::StoreLock)?;
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| CoreError::StoreLock)?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        tracing::debug!(key, path = %self.path.display(), "store set");
        self.update(|map| {
            map.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        tracing::debug!(key, path = %self.path.display(), "store remove");
        self.update(|map| {
            map.remove(key);
        })
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// Process-local store for tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let values = self.values.lock().map_err(|_| CoreError::StoreLock)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut values = self.values.lock().map_err(|_| CoreError::StoreLock)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut values = self.values.lock().map_err(|_| CoreError::StoreLock)?;
        values.remove(key);
        Ok(())
    }
}

// ============================================================================
// SESSION TOKENS
// ============================================================================

/// Session tokens kept under [`ACTIVE_LOGIN_KEY`] as JSON text.
#[derive(Clone)]
pub struct StoredTokens {
    store: Arc<dyn KeyValueStore>,
}

impl StoredTokens {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load_state(&self) -> CoreResult<Option<LoginState>> {
        self.store
            .get(ACTIVE_LOGIN_KEY)?
            .map(|text| serde_json::from_str(&text).map_err(CoreError::Deserialization))
            .transpose()
    }

    fn save_state(&self, state: &LoginState) -> CoreResult<()> {
        let text = serde_json::to_string(state).map_err(CoreError::Serialization)?;
        self.store.set(ACTIVE_LOGIN_KEY, &text)
    }
}

fn token_error(e: CoreError) -> ClientError {
    ClientError::TokenStore(e.to_string())
}

impl TokenStore for StoredTokens {
    fn load(&self) -> ClientResult<Option<LoginState>> {
        self.load_state().map_err(token_error)
    }

    fn save(&self, state: &LoginState) -> ClientResult<()> {
        self.save_state(state).map_err(token_error)
    }

    fn clear(&self) -> ClientResult<()> {
        self.store.remove(ACTIVE_LOGIN_KEY).map_err(token_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state() -> LoginState {
        LoginState {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: None,
            profile: Some("Practitioner/1".into()),
        }
    }

    #[test]
    fn test_file_store_round_trips_and_survives_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("medview.yaml");

        let store = FileStore::open(&path).expect("open should succeed");
        assert_eq!(store.get("theme").unwrap(), None);
        store.set("theme", "dark").unwrap();
        store.set("language", "ar").unwrap();
        assert!(path.is_file(), "store file should be created on first write");

        let reopened = FileStore::open(&path).expect("reopen should succeed");
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get("language").unwrap().as_deref(), Some("ar"));

        reopened.remove("theme").unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
        assert!(!temp_dir.path().join("nested").join("medview.yaml.tmp").exists());
    }

    #[test]
    fn test_file_store_keeps_values_that_look_like_yaml_scalars() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path().join("s.yaml")).unwrap();
        store.set("is_first_time", "false").unwrap();
        store.set("json", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get("is_first_time").unwrap().as_deref(), Some("false"));
        assert_eq!(store.get("json").unwrap().as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("s.yaml");
        fs::write(&path, "- not\n- a mapping\n").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert!(matches!(
            store.get("theme"),
            Err(CoreError::YamlDeserialization(_))
        ));
    }

    #[test]
    fn test_stored_tokens_use_active_login_key() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let tokens = StoredTokens::new(store.clone());

        assert_eq!(tokens.load().unwrap(), None);
        tokens.save(&state()).unwrap();
        let raw = store.get(ACTIVE_LOGIN_KEY).unwrap().expect("tokens stored");
        assert!(raw.contains("Practitioner/1"));
        assert_eq!(tokens.load().unwrap(), Some(state()));

        tokens.clear().unwrap();
        assert_eq!(store.get(ACTIVE_LOGIN_KEY).unwrap(), None);
    }

    #[test]
    fn test_stored_tokens_surface_corrupt_json() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(ACTIVE_LOGIN_KEY, "not json").unwrap();
        let tokens = StoredTokens::new(store);
        assert!(matches!(tokens.load(), Err(ClientError::TokenStore(_))));
    }
}
