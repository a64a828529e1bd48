//! Session id persistence
//!
//! The session id correlates every analytics record of one visitor. It is
//! created once per session lifetime and stays stable across game restarts,
//! so it lives in a small key/value store outside the game state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::clock::Clock;

/// Store key under which the session id is kept.
pub const SESSION_ID_KEY: &str = "ar-game-session-id";

/// Key/value persistence for the session id.
///
/// Implementations swallow their own failures: a store that cannot read
/// returns `None`, one that cannot write drops the value.
pub trait SessionStore {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value.
    fn set(&self, key: &str, value: &str);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }
}

/// Store keeping one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`; the directory is created on write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let value = std::fs::read_to_string(self.path(key)).ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    }

    fn set(&self, key: &str, value: &str) {
        let result = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(self.path(key), value));
        if let Err(e) = result {
            debug!(key, error = %e, "session store write failed");
        }
    }
}

/// Returns the stored session id, creating and storing one if absent.
///
/// New ids look like `session_<epoch millis>_<9 lowercase alphanumerics>`.
pub fn obtain_session_id(store: &dyn SessionStore, key: &str, clock: &dyn Clock) -> String {
    if let Some(id) = store.get(key) {
        return id;
    }
    let id = generate_session_id(clock);
    store.set(key, &id);
    debug!(session_id = %id, "new session id");
    id
}

/// Generates a fresh session id.
#[must_use]
pub fn generate_session_id(clock: &dyn Clock) -> String {
    let millis = clock.wall().timestamp_millis();
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect();
    format!("session_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_generated_id_format() {
        let id = generate_session_id(&ManualClock::default());
        let parts: Vec<_> = id.splitn(3, '_').collect();
        assert_eq!(parts[0], "session");
        assert_eq!(parts[1], "0");
        assert_eq!(parts[2].len(), 9);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_id_is_stable_within_store() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let first = obtain_session_id(&store, SESSION_ID_KEY, &clock);
        let second = obtain_session_id(&store, SESSION_ID_KEY, &clock);
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_stores_get_distinct_ids() {
        let clock = ManualClock::default();
        let a = obtain_session_id(&MemoryStore::new(), SESSION_ID_KEY, &clock);
        let b = obtain_session_id(&MemoryStore::new(), SESSION_ID_KEY, &clock);
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::default();
        let first = obtain_session_id(&FileStore::new(dir.path()), SESSION_ID_KEY, &clock);
        let second = obtain_session_id(&FileStore::new(dir.path()), SESSION_ID_KEY, &clock);
        assert_eq!(first, second);
        assert!(dir.path().join("ar-game-session-id").exists());
    }

    #[test]
    fn test_unreadable_file_store_yields_fresh_id() {
        let store = FileStore::new("/proc/definitely/not/writable");
        let id = obtain_session_id(&store, SESSION_ID_KEY, &ManualClock::default());
        assert!(id.starts_with("session_"));
    }
}
