//! Flat ordered key/value dictionary backing a preference store
//!
//! Two instances exist per store: the mutable, persisted `current` map and
//! the `defaults` map rebuilt at construction. Iteration preserves
//! encounter (insertion) order, which the ordered enumeration contract
//! relies on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::keys;
use crate::error::PrefError;
use crate::value::{Encoded, PrefValue};

/// Ordered string-keyed, string-valued property map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    entries: IndexMap<String, String>,
}

/// Derived keys holding the two halves of a dimension preference.
pub(crate) fn dimension_keys(key: &str) -> (String, String) {
    (
        format!("{}{key}", keys::WIDTH_PREFIX),
        format!("{}{key}", keys::HEIGHT_PREFIX),
    )
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entry; returns the previous value if any.
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        self.entries.insert(key.to_string(), value.to_string())
    }

    /// Typed insert: encodes `value` and stores it (both halves for a
    /// dimension). This is the write path for default values, where no
    /// ordering or notification applies.
    pub fn set_value(&mut self, key: &str, value: &PrefValue) -> Result<(), PrefError> {
        match value.encode()? {
            Encoded::Single(text) => {
                self.set(key, &text);
            }
            Encoded::Pair { width, height } => {
                let (width_key, height_key) = dimension_keys(key);
                self.set(&width_key, &width);
                self.set(&height_key, &height);
            }
        }
        Ok(())
    }

    /// Remove an entry; returns its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Move a value from `old` to `new`. Returns false when `old` is absent.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.entries.shift_remove(old) {
            Some(value) => {
                self.entries.insert(new.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// All keys starting with `prefix`, in encounter order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut map = PropertyMap::new();
        assert_eq!(map.set("a", "1"), None);
        assert_eq!(map.set("a", "2"), Some("1".to_string()));
        assert_eq!(map.get("a"), Some("2"));
        assert_eq!(map.remove("a"), Some("2".to_string()));
        assert_eq!(map.get("a"), None);
    }

    #[test]
    fn test_keys_with_prefix_preserves_encounter_order() {
        let mut map = PropertyMap::new();
        map.set("menu.c", "3");
        map.set("other.x", "0");
        map.set("menu.a", "1");
        map.set("menu.b", "2");
        assert_eq!(
            map.keys_with_prefix("menu."),
            vec!["menu.c".to_string(), "menu.a".to_string(), "menu.b".to_string()]
        );
    }

    #[test]
    fn test_rename_moves_value() {
        let mut map = PropertyMap::new();
        map.set("old.key", "v");
        assert!(map.rename("old.key", "new.key"));
        assert_eq!(map.get("old.key"), None);
        assert_eq!(map.get("new.key"), Some("v"));
        assert!(!map.rename("old.key", "elsewhere"));
    }

    #[test]
    fn test_set_value_dimension_writes_both_halves() {
        let mut map = PropertyMap::new();
        map.set_value("win.size", &PrefValue::Dimension { width: 123.0, height: 456.0 })
            .unwrap();
        assert_eq!(map.get("preferences.width.win.size"), Some("123"));
        assert_eq!(map.get("preferences.height.win.size"), Some("456"));
        assert_eq!(map.get("win.size"), None);
    }
}
