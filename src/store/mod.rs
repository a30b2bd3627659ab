//! Versioned preference store
//!
//! A [`Preferences`] instance owns two flat property maps (current values
//! and defaults), typed accessors over them, ordering bookkeeping for
//! grouped keys, file persistence, and change notification. The
//! application describes its store through a [`PreferenceModel`]: file
//! name, schema version, default values, and upgrade steps.

pub mod map;
mod migration;
mod ordering;
pub mod persist;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::color::HexColor;
use crate::constants::version;
use crate::error::PrefError;
use crate::notify::{Dispatch, ImmediateDispatch, ObserverId, ObserverList};
use crate::value::{self, Encoded, PrefValue};

pub use map::PropertyMap;

use map::dimension_keys;
use migration::MigrationOutcome;

/// Application-side description of one preference store.
///
/// `set_defaults` runs once at construction and is the only writer of the
/// defaults map. `upgrade` is called by the migration engine once per
/// version increment; the default implementation reports failure, which
/// makes any store that declares a version above 0 fall back to defaults
/// when old data is encountered.
pub trait PreferenceModel: Send + Sync {
    /// File name of the store (directory is resolved by the store).
    fn file_name(&self) -> &str;

    /// Declared schema version of the application's preferences.
    fn version(&self) -> i32 {
        1
    }

    /// Populate the defaults map.
    fn set_defaults(&self, defaults: &mut PropertyMap) -> Result<(), PrefError>;

    /// Upgrade stored preferences from `from` to `from + 1`. Return false
    /// when the step cannot be performed.
    fn upgrade(&self, _current: &mut PropertyMap, _from: i32) -> bool {
        false
    }

    /// Comment header written at the top of the store file.
    fn comment(&self) -> Option<&str> {
        None
    }
}

/// A typed, versioned, persisted preference store.
pub struct Preferences {
    model: Box<dyn PreferenceModel>,
    directory: Option<PathBuf>,
    dispatch: Arc<dyn Dispatch>,
    current: PropertyMap,
    defaults: PropertyMap,
    observers: ObserverList,
    notifications_enabled: bool,
}

impl Preferences {
    /// Build a store with its defaults populated; nothing is read from
    /// disk until [`Preferences::load`].
    pub fn new(model: impl PreferenceModel + 'static) -> Result<Self, PrefError> {
        let mut defaults = PropertyMap::new();
        model.set_defaults(&mut defaults)?;
        let current = defaults.clone();
        Ok(Self {
            model: Box::new(model),
            directory: None,
            dispatch: Arc::new(ImmediateDispatch),
            current,
            defaults,
            observers: ObserverList::default(),
            notifications_enabled: true,
        })
    }

    /// Build and immediately load from disk.
    pub fn open(model: impl PreferenceModel + 'static) -> Result<Self, PrefError> {
        let mut prefs = Self::new(model)?;
        prefs.load();
        Ok(prefs)
    }

    /// Override the directory the store file lives in (tests, embedders).
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Replace the notification delivery policy.
    pub fn with_dispatch(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// On-disk location of this store.
    pub fn path(&self) -> PathBuf {
        persist::resolve_path(self.directory.as_deref(), self.model.file_name())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load from disk. Failures are absorbed: on any read or parse
    /// problem the store keeps defaults and only the log knows. Stored
    /// data from an older schema is migrated (and persisted) before use;
    /// data from a newer schema is discarded in favor of defaults.
    pub fn load(&mut self) {
        let stored = persist::load_file(&self.path());
        match stored {
            Some(stored) => {
                // Stored entries overlay the defaults, so keys added since
                // the file was written still read as their default.
                let mut merged = self.defaults.clone();
                for (key, value) in stored.iter() {
                    merged.set(key, value);
                }
                match migration::run(self.model.as_ref(), &mut merged) {
                    MigrationOutcome::Unchanged => {
                        self.current = merged;
                    }
                    MigrationOutcome::Upgraded => {
                        self.current = merged;
                        if let Err(err) = self.save() {
                            warn!(error = %err, "failed to persist migrated preferences");
                        }
                    }
                    MigrationOutcome::ResetToDefaults => {
                        self.current = self.defaults.clone();
                    }
                }
            }
            None => {
                self.current = self.defaults.clone();
            }
        }
        self.notify_observers();
    }

    /// Persist the current map. Version markers are written first.
    pub fn save(&self) -> Result<(), PrefError> {
        self.save_with_comment(self.model.comment())
    }

    /// Persist with an explicit comment header.
    pub fn save_with_comment(&self, comment: Option<&str>) -> Result<(), PrefError> {
        let document = persist::to_document(
            &self.current,
            version::CURRENT_STRUCTURE,
            self.model.version(),
            comment,
        )?;
        persist::save_file(&self.path(), &document)
    }

    /// Drop every current value in favor of the defaults.
    pub fn reset_to_defaults(&mut self) {
        self.current = self.defaults.clone();
        self.notify_observers();
    }

    // ------------------------------------------------------------------
    // Typed writes
    // ------------------------------------------------------------------

    /// Store a value without touching its ordering.
    pub fn set(&mut self, key: &str, value: impl Into<PrefValue>) -> Result<(), PrefError> {
        self.set_entry(key, &value.into(), None)
    }

    /// Store a value and place it at `index` within its group.
    pub fn set_ordered(
        &mut self,
        key: &str,
        value: impl Into<PrefValue>,
        index: i32,
    ) -> Result<(), PrefError> {
        self.set_entry(key, &value.into(), Some(index))
    }

    /// Write a typed default (construction-time hook surface).
    pub fn set_default(&mut self, key: &str, value: impl Into<PrefValue>) -> Result<(), PrefError> {
        self.defaults.set_value(key, &value.into())
    }

    fn set_entry(
        &mut self,
        key: &str,
        value: &PrefValue,
        index: Option<i32>,
    ) -> Result<(), PrefError> {
        // Encoding validates (list separators) before any mutation.
        match value.encode()? {
            Encoded::Pair { width, height } => {
                let (width_key, height_key) = dimension_keys(key);
                self.set_text(&width_key, &width, index);
                self.set_text(&height_key, &height, index);
            }
            Encoded::Single(text) => {
                self.set_text(key, &text, index);
            }
        }
        Ok(())
    }

    fn set_text(&mut self, key: &str, text: &str, index: Option<i32>) {
        let current_order = ordering::order_of(&self.current, key);
        let target_order = index.unwrap_or(current_order);
        if self.current.get(key) == Some(text) && target_order == current_order {
            // Idempotent write: observers must not be spammed.
            debug!(key = %key, "value unchanged, skipping write");
            return;
        }
        self.current.set(key, text);
        if let Some(index) = index {
            ordering::set_order(&mut self.current, key, index);
        }
        self.notify_observers();
    }

    // ------------------------------------------------------------------
    // Typed reads
    // ------------------------------------------------------------------

    fn raw(&self, key: &str) -> Option<&str> {
        self.current.get(key)
    }

    fn required(&self, key: &str) -> Result<&str, PrefError> {
        self.raw(key).ok_or_else(|| PrefError::MissingKey { key: key.to_string() })
    }

    pub fn get_string(&self, key: &str) -> Result<String, PrefError> {
        self.required(key).map(str::to_string)
    }

    pub fn get_string_or_default(&self, key: &str) -> String {
        self.raw(key).unwrap_or_default().to_string()
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, PrefError> {
        self.required(key).map(value::decode_bool)
    }

    pub fn get_bool_or_default(&self, key: &str) -> bool {
        self.raw(key).map(value::decode_bool).unwrap_or(false)
    }

    pub fn get_int(&self, key: &str) -> Result<i64, PrefError> {
        value::decode_int(key, self.required(key)?)
    }

    /// Missing reads as 0; a present but unparseable value still errors.
    pub fn get_int_or_default(&self, key: &str) -> Result<i64, PrefError> {
        match self.raw(key) {
            None => Ok(0),
            Some(text) => value::decode_int(key, text),
        }
    }

    pub fn get_double(&self, key: &str) -> Result<f64, PrefError> {
        value::decode_double(key, self.required(key)?)
    }

    /// Missing reads as NaN; a present but unparseable value still errors.
    pub fn get_double_or_default(&self, key: &str) -> Result<f64, PrefError> {
        match self.raw(key) {
            None => Ok(f64::NAN),
            Some(text) => value::decode_double(key, text),
        }
    }

    pub fn get_color(&self, key: &str) -> Result<HexColor, PrefError> {
        value::decode_color(key, self.required(key)?)
    }

    /// Missing reads as `None`; a present but unparseable value still errors.
    pub fn get_color_or_default(&self, key: &str) -> Result<Option<HexColor>, PrefError> {
        match self.raw(key) {
            None => Ok(None),
            Some(text) => value::decode_color(key, text).map(Some),
        }
    }

    /// Absent or empty decodes to an empty vector, never an error.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.raw(key).map(value::decode_list).unwrap_or_default()
    }

    /// Read a dimension. Both derived halves must be present and numeric;
    /// a stored NaN in either half reports absence.
    pub fn get_dimension(&self, key: &str) -> Result<(f64, f64), PrefError> {
        let (width_key, height_key) = dimension_keys(key);
        let (width_text, height_text) = match (self.raw(&width_key), self.raw(&height_key)) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(PrefError::MissingKey { key: key.to_string() }),
        };
        let width = value::decode_double(&width_key, width_text)?;
        let height = value::decode_double(&height_key, height_text)?;
        if width.is_nan() || height.is_nan() {
            return Err(PrefError::MissingKey { key: key.to_string() });
        }
        Ok((width, height))
    }

    /// Missing reads as a NaN pair; unparseable halves still error.
    pub fn get_dimension_or_default(&self, key: &str) -> Result<(f64, f64), PrefError> {
        match self.get_dimension(key) {
            Ok(dimension) => Ok(dimension),
            Err(err) if err.is_missing() => Ok((f64::NAN, f64::NAN)),
            Err(err) => Err(err),
        }
    }

    /// True when the current value of `key` equals its default.
    pub fn is_default_value(&self, key: &str) -> bool {
        self.current.get(key) == self.defaults.get(key)
    }

    // ------------------------------------------------------------------
    // Ordering, rename, removal
    // ------------------------------------------------------------------

    /// Position of `key` within its group, or -1 when unordered.
    pub fn order_of(&self, key: &str) -> i32 {
        ordering::order_of(&self.current, key)
    }

    /// Place `key` at `index` within its group; a negative index clears
    /// the ordering.
    pub fn set_order(&mut self, key: &str, index: i32) {
        if ordering::order_of(&self.current, key) == index {
            return;
        }
        ordering::set_order(&mut self.current, key, index);
        self.notify_observers();
    }

    /// All keys under `prefix`, in group order (encounter order when any
    /// member is unordered).
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        ordering::enumerate(&self.current, prefix)
    }

    /// Remove a key, closing the positional gap it leaves in its group.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = ordering::remove_with_reindex(&mut self.current, key);
        if removed {
            self.notify_observers();
        }
        removed
    }

    /// Remove every key under `prefix`; returns how many went away.
    pub fn remove_by_prefix(&mut self, prefix: &str) -> usize {
        let removed = ordering::remove_group(&mut self.current, prefix);
        if removed > 0 {
            self.notify_observers();
        }
        removed
    }

    /// Move a value (and its ordering) from `old` to `new`.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let renamed = ordering::rename(&mut self.current, old, new);
        if renamed {
            self.notify_observers();
        }
        renamed
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register a change observer; fires after every successful mutation.
    pub fn subscribe(&mut self, observer: impl Fn() + Send + Sync + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Suppress or restore all notifications (batch initialization paths).
    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// Publish a "changed" notice through the configured dispatch.
    pub fn notify_observers(&self) {
        if !self.notifications_enabled || self.observers.is_empty() {
            return;
        }
        self.observers.notify_all(self.dispatch.as_ref());
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Human-readable listing of current entries with order annotations.
    /// Ordering-index entries are folded into their base key's line.
    pub fn dump(&self) -> String {
        use crate::constants::keys;

        let mut out = String::new();
        for (key, value) in self.current.iter() {
            if key.starts_with(keys::ORDER_PREFIX) {
                continue;
            }
            let order = ordering::order_of(&self.current, key);
            if order >= 0 {
                out.push_str(&format!("{key} = {value}  (order {order})\n"));
            } else {
                out.push_str(&format!("{key} = {value}\n"));
            }
        }
        out
    }
}
