//! File persistence for preference maps
//!
//! One TOML file per store: flat key/value pairs (dotted keys quoted),
//! preceded by an optional comment header. The two version markers are
//! always written first. Loads absorb every failure and report `None`;
//! only saves surface errors to the caller.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{error, info};

use crate::constants::{codec::LIST_SEPARATOR, file, keys};
use crate::error::PrefError;
use crate::store::map::PropertyMap;

/// Resolve the on-disk location of a store file. `directory` overrides the
/// platform config dir (used by tests and embedders).
pub fn resolve_path(directory: Option<&Path>, file_name: &str) -> PathBuf {
    match directory {
        Some(dir) => dir.join(file_name),
        None => {
            let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(file::APP_DIR);
            path.push(file_name);
            path
        }
    }
}

/// Serialize a map to the stored document form. Version markers come
/// first, then the remaining entries in map order.
pub fn to_document(
    map: &PropertyMap,
    structure_version: i32,
    model_version: i32,
    comment: Option<&str>,
) -> Result<String, PrefError> {
    let mut out: IndexMap<&str, String> = IndexMap::new();
    out.insert(keys::STRUCTURE_VERSION, structure_version.to_string());
    out.insert(keys::MODEL_VERSION, model_version.to_string());
    for (key, value) in map.iter() {
        if key == keys::STRUCTURE_VERSION || key == keys::MODEL_VERSION {
            continue;
        }
        out.insert(key, value.to_string());
    }

    let body = toml::to_string_pretty(&out).map_err(|source| PrefError::Format { source })?;

    match comment {
        None => Ok(body),
        Some(comment) => {
            let mut text = String::new();
            for line in comment.lines() {
                text.push_str("# ");
                text.push_str(line);
                text.push('\n');
            }
            text.push_str(&body);
            Ok(text)
        }
    }
}

/// Parse a stored document back into a flat map.
///
/// Values of non-string scalar types and nested tables are tolerated
/// (hand-edited files): scalars are stringified, arrays joined on the list
/// separator, and table nesting flattened back to dotted keys.
pub fn from_document(text: &str) -> Result<PropertyMap, toml::de::Error> {
    let parsed: IndexMap<String, toml::Value> = toml::from_str(text)?;
    let mut map = PropertyMap::new();
    for (key, value) in parsed {
        flatten_value(&key, value, &mut map);
    }
    Ok(map)
}

fn flatten_value(key: &str, value: toml::Value, map: &mut PropertyMap) {
    match value {
        toml::Value::String(s) => {
            map.set(key, &s);
        }
        toml::Value::Integer(i) => {
            map.set(key, &i.to_string());
        }
        toml::Value::Float(f) => {
            map.set(key, &f.to_string());
        }
        toml::Value::Boolean(b) => {
            map.set(key, &b.to_string());
        }
        toml::Value::Datetime(d) => {
            map.set(key, &d.to_string());
        }
        toml::Value::Array(elements) => {
            let joined = elements
                .iter()
                .map(|e| match e {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(&LIST_SEPARATOR.to_string());
            map.set(key, &joined);
        }
        toml::Value::Table(table) => {
            for (sub_key, sub_value) in table {
                flatten_value(&format!("{key}.{sub_key}"), sub_value, map);
            }
        }
    }
}

/// Read and parse a store file. Every failure is absorbed: logged, `None`.
pub(crate) fn load_file(path: &Path) -> Option<PropertyMap> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no preference file found, using defaults");
            return None;
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to read preference file, using defaults");
            return None;
        }
    };
    match from_document(&text) {
        Ok(map) => Some(map),
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to parse preference file, using defaults");
            None
        }
    }
}

/// Write a serialized document, creating the directory if needed.
pub(crate) fn save_file(path: &Path, contents: &str) -> Result<(), PrefError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PrefError::Io {
            operation: "create directory for",
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| PrefError::Io {
        operation: "write",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_roundtrip_preserves_order_and_values() {
        let mut map = PropertyMap::new();
        map.set("show.splash", "true");
        map.set("menu.item", "open");
        map.set("weird key with spaces", "kept");

        let doc = to_document(&map, 3, 1, Some("store header")).unwrap();
        assert!(doc.starts_with("# store header\n"));

        let reloaded = from_document(&doc).unwrap();
        assert_eq!(reloaded.get(keys::STRUCTURE_VERSION), Some("3"));
        assert_eq!(reloaded.get(keys::MODEL_VERSION), Some("1"));
        assert_eq!(reloaded.get("show.splash"), Some("true"));
        assert_eq!(reloaded.get("menu.item"), Some("open"));
        assert_eq!(reloaded.get("weird key with spaces"), Some("kept"));
    }

    #[test]
    fn test_version_markers_come_first() {
        let mut map = PropertyMap::new();
        map.set("aaa.first", "v");
        let doc = to_document(&map, 3, 7, None).unwrap();
        let first_key = doc.lines().next().unwrap();
        assert!(first_key.contains(keys::STRUCTURE_VERSION));
    }

    #[test]
    fn test_from_document_flattens_hand_written_tables() {
        let doc = r#"
# hand-edited file
[show]
splash = true
tips = 3
"#;
        let map = from_document(doc).unwrap();
        assert_eq!(map.get("show.splash"), Some("true"));
        assert_eq!(map.get("show.tips"), Some("3"));
    }

    #[test]
    fn test_from_document_joins_arrays() {
        let doc = r#"targets = ["a", "b", "c"]"#;
        let map = from_document(doc).unwrap();
        assert_eq!(map.get("targets"), Some("a|b|c"));
    }

    #[test]
    fn test_load_file_absorbs_missing_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load_file(&path).is_none());

        fs::write(&path, "not [ valid toml").unwrap();
        assert!(load_file(&path).is_none());
    }

    #[test]
    fn test_save_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/prefs.toml");
        save_file(&path, "key = \"value\"\n").unwrap();
        assert_eq!(load_file(&path).unwrap().get("key"), Some("value"));
    }

    #[test]
    fn test_resolve_path_honors_override() {
        let path = resolve_path(Some(Path::new("/tmp/override")), "app.toml");
        assert_eq!(path, PathBuf::from("/tmp/override/app.toml"));
    }
}
