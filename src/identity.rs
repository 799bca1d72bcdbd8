//! Session identity.
//!
//! Identity is owned elsewhere (a sign-in flow writes it to a key/value store);
//! the monitor only reads two keys: `isGuest` and `username`.

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

pub const KEY_IS_GUEST: &str = "isGuest";
pub const KEY_USERNAME: &str = "username";

/// Read-only key/value access to session storage.
pub trait IdentityStore {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl IdentityStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Flat JSON object on disk, e.g. `{"isGuest": "false", "username": "ana"}`.
///
/// Non-string scalars are stored as their JSON text, so `true` reads as "true".
#[derive(Clone, Debug, Default)]
pub struct JsonFileStore {
    values: HashMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read session file {}: {}", path.display(), e))?;
        let parsed: HashMap<String, Value> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid session file {}: {}", path.display(), e))?;
        let values = parsed
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                Value::Null => None,
                other => Some((key, other.to_string())),
            })
            .collect();
        Ok(Self { values })
    }
}

impl IdentityStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub is_guest: bool,
    pub username: Option<String>,
}

impl SessionIdentity {
    pub fn guest() -> Self {
        Self {
            is_guest: true,
            username: None,
        }
    }

    pub fn user(username: &str) -> Self {
        Self {
            is_guest: false,
            username: Some(username.to_string()),
        }
    }

    pub fn from_store(store: &dyn IdentityStore) -> Self {
        let is_guest = store.get(KEY_IS_GUEST).as_deref() == Some("true");
        let username = store.get(KEY_USERNAME).filter(|name| !name.is_empty());
        Self { is_guest, username }
    }

    /// Identity line used in exported reports.
    pub fn report_identity(&self) -> &str {
        if self.is_guest {
            "Guest (No email)"
        } else {
            self.username.as_deref().unwrap_or("Unknown User")
        }
    }

    /// Short name for the status display.
    pub fn display_name(&self) -> &str {
        if self.is_guest {
            "Guest"
        } else {
            self.username.as_deref().unwrap_or("User")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_flag_wins_over_username() {
        let store = MemoryStore::new()
            .with(KEY_IS_GUEST, "true")
            .with(KEY_USERNAME, "ana@example.com");
        let identity = SessionIdentity::from_store(&store);
        assert_eq!(identity.report_identity(), "Guest (No email)");
        assert_eq!(identity.display_name(), "Guest");
    }

    #[test]
    fn username_and_unknown_fallbacks() {
        let named = SessionIdentity::from_store(&MemoryStore::new().with(KEY_USERNAME, "ana"));
        assert_eq!(named.report_identity(), "ana");
        assert_eq!(named.display_name(), "ana");

        let empty = SessionIdentity::from_store(&MemoryStore::new().with(KEY_USERNAME, ""));
        assert_eq!(empty.report_identity(), "Unknown User");
        assert_eq!(empty.display_name(), "User");
    }

    #[test]
    fn json_file_store_reads_strings_and_bools() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"isGuest": true, "username": "ana"}"#)?;
        let identity = SessionIdentity::from_store(&JsonFileStore::open(&path)?);
        assert!(identity.is_guest);
        assert_eq!(identity.username.as_deref(), Some("ana"));
        Ok(())
    }
}
