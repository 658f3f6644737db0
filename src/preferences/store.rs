//! A single key-value preference store backed by one JSON file
//!
//! Reads come from memory. Writes go through an [`Editor`], and
//! [`Editor::apply`] persists the whole map atomically before publishing it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

use serde_json::Value;

use crate::error::{BooksError, BooksResult};
use crate::storage::{read_json, write_json_atomic};

pub struct SharedPreferences {
    name: String,
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
}

impl SharedPreferences {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(name: impl Into<String>, path: PathBuf) -> BooksResult<Self> {
        let values: BTreeMap<String, Value> = read_json(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            values: RwLock::new(values),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_bool(&self, key: &str, default: bool) -> BooksResult<bool> {
        Ok(self
            .read_lock()?
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default))
    }

    pub fn get_string(&self, key: &str) -> BooksResult<Option<String>> {
        Ok(self
            .read_lock()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn get_i64(&self, key: &str, default: i64) -> BooksResult<i64> {
        Ok(self
            .read_lock()?
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or(default))
    }

    pub fn contains(&self, key: &str) -> BooksResult<bool> {
        Ok(self.read_lock()?.contains_key(key))
    }

    /// Snapshot of every key and value
    pub fn all(&self) -> BooksResult<BTreeMap<String, Value>> {
        Ok(self.read_lock()?.clone())
    }

    pub fn edit(&self) -> Editor<'_> {
        Editor {
            prefs: self,
            clear: false,
            changes: Vec::new(),
        }
    }

    fn read_lock(&self) -> BooksResult<RwLockReadGuard<'_, BTreeMap<String, Value>>> {
        self.values
            .read()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire read lock: {}", e)))
    }
}

impl std::fmt::Debug for SharedPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPreferences")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

enum Change {
    Put(String, Value),
    Remove(String),
}

/// Batches preference changes; nothing is visible until [`Editor::apply`]
#[must_use = "changes are discarded unless apply() is called"]
pub struct Editor<'a> {
    prefs: &'a SharedPreferences,
    clear: bool,
    changes: Vec<Change>,
}

impl Editor<'_> {
    pub fn put_bool(mut self, key: &str, value: bool) -> Self {
        self.changes.push(Change::Put(key.to_string(), Value::Bool(value)));
        self
    }

    pub fn put_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.changes
            .push(Change::Put(key.to_string(), Value::String(value.into())));
        self
    }

    pub fn put_i64(mut self, key: &str, value: i64) -> Self {
        self.changes.push(Change::Put(key.to_string(), Value::from(value)));
        self
    }

    /// Store a raw JSON scalar
    pub fn put_value(mut self, key: &str, value: Value) -> Self {
        self.changes.push(Change::Put(key.to_string(), value));
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.changes.push(Change::Remove(key.to_string()));
        self
    }

    /// Remove every key before the other changes are applied
    pub fn clear(mut self) -> Self {
        self.clear = true;
        self
    }

    /// Persist the changes and publish them to readers
    pub fn apply(self) -> BooksResult<()> {
        let mut values = self
            .prefs
            .values
            .write()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let mut next = if self.clear {
            BTreeMap::new()
        } else {
            values.clone()
        };
        for change in self.changes {
            match change {
                Change::Put(key, value) => {
                    next.insert(key, value);
                }
                Change::Remove(key) => {
                    next.remove(&key);
                }
            }
        }

        write_json_atomic(&self.prefs.path, &next)?;
        *values = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SharedPreferences {
        SharedPreferences::open("book", temp.path().join("book.json")).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp = TempDir::new().unwrap();
        let prefs = open_store(&temp);

        assert!(prefs.all().unwrap().is_empty());
        assert!(prefs.get_bool("anything", true).unwrap());
        assert_eq!(prefs.get_string("anything").unwrap(), None);
        assert!(!prefs.path().exists());
    }

    #[test]
    fn test_changes_invisible_until_apply() {
        let temp = TempDir::new().unwrap();
        let prefs = open_store(&temp);

        let editor = prefs.edit().put_bool("use_double_entry", false);
        assert!(!prefs.contains("use_double_entry").unwrap());

        editor.apply().unwrap();
        assert!(!prefs.get_bool("use_double_entry", true).unwrap());
    }

    #[test]
    fn test_persisted_across_reopen() {
        let temp = TempDir::new().unwrap();
        let prefs = open_store(&temp);
        prefs
            .edit()
            .put_string("default_currency", "EUR")
            .put_i64("last_export", 1_700_000_000)
            .apply()
            .unwrap();

        let reopened = open_store(&temp);
        assert_eq!(
            reopened.get_string("default_currency").unwrap().as_deref(),
            Some("EUR")
        );
        assert_eq!(reopened.get_i64("last_export", 0).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let prefs = open_store(&temp);
        prefs
            .edit()
            .put_bool("a", true)
            .put_bool("b", true)
            .apply()
            .unwrap();

        prefs.edit().remove("a").apply().unwrap();
        assert!(!prefs.contains("a").unwrap());
        assert!(prefs.contains("b").unwrap());

        prefs.edit().clear().put_bool("c", false).apply().unwrap();
        assert_eq!(prefs.all().unwrap().keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let temp = TempDir::new().unwrap();
        let prefs = open_store(&temp);
        prefs.edit().put_string("flag", "yes").apply().unwrap();

        assert!(prefs.get_bool("flag", true).unwrap());
        assert_eq!(prefs.get_i64("flag", 3).unwrap(), 3);
    }
}
