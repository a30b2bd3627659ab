//! Schema migration for freshly loaded preference maps
//!
//! Two version axes are checked in sequence: the structural revision of the
//! file format itself (owned here) and the application schema version
//! (owned by the model). A stored version ahead of the runtime aborts the
//! whole process and the store falls back to defaults; a stored version
//! behind the runtime is walked forward one step at a time. Failures are
//! absorbed by the caller (defaults), never surfaced as errors.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::constants::{keys, version};
use crate::store::PreferenceModel;
use crate::store::map::PropertyMap;

/// What the engine did to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MigrationOutcome {
    /// Both axes were already current.
    Unchanged,
    /// At least one upgrade step was applied; the caller persists the result.
    Upgraded,
    /// Stored data was ahead or a step failed; the caller replaces the map
    /// with defaults.
    ResetToDefaults,
}

/// Parse a stored version marker; absent or unparseable reads as 0.
fn stored_version(map: &PropertyMap, key: &str) -> i32 {
    match map.get(key) {
        None => 0,
        Some(text) => text.trim().parse::<i32>().unwrap_or_else(|_| {
            warn!(key = %key, text = %text, "unparseable version marker, treating as 0");
            0
        }),
    }
}

/// Bring `map` up to the runtime versions on both axes.
pub(crate) fn run(model: &dyn PreferenceModel, map: &mut PropertyMap) -> MigrationOutcome {
    let mut applied = false;

    // Structural axis first; an `ahead` verdict on it aborts everything
    // before the application axis is even read.
    let stored = stored_version(map, keys::STRUCTURE_VERSION);
    match stored.cmp(&version::CURRENT_STRUCTURE) {
        Ordering::Greater => {
            warn!(
                stored = stored,
                runtime = version::CURRENT_STRUCTURE,
                "preference file structure is from a newer build, falling back to defaults"
            );
            return MigrationOutcome::ResetToDefaults;
        }
        Ordering::Less => {
            let mut at = stored;
            while at < version::CURRENT_STRUCTURE {
                if !structural_step(map, at) {
                    warn!(from = at, "structural upgrade step failed, falling back to defaults");
                    return MigrationOutcome::ResetToDefaults;
                }
                at += 1;
                map.set(keys::STRUCTURE_VERSION, &at.to_string());
                info!(to = at, "upgraded preference file structure");
                applied = true;
            }
        }
        Ordering::Equal => {}
    }

    // Application axis.
    let stored = stored_version(map, keys::MODEL_VERSION);
    let runtime = model.version();
    match stored.cmp(&runtime) {
        Ordering::Greater => {
            warn!(
                stored = stored,
                runtime = runtime,
                "preferences are from a newer application version, falling back to defaults"
            );
            return MigrationOutcome::ResetToDefaults;
        }
        Ordering::Less => {
            let mut at = stored;
            while at < runtime {
                // Single-increment stepping is enforced here regardless of
                // how much of the gap the hook claims to cover.
                if !model.upgrade(map, at) {
                    warn!(from = at, "application upgrade step failed, falling back to defaults");
                    return MigrationOutcome::ResetToDefaults;
                }
                at += 1;
                map.set(keys::MODEL_VERSION, &at.to_string());
                info!(to = at, "upgraded application preferences");
                applied = true;
            }
        }
        Ordering::Equal => {}
    }

    if applied {
        MigrationOutcome::Upgraded
    } else {
        MigrationOutcome::Unchanged
    }
}

/// One structural revision step. These are fixed, not extensible.
fn structural_step(map: &mut PropertyMap, from: i32) -> bool {
    match from {
        // 0 -> 1: the structural marker itself was introduced; inserting it
        // is the engine's marker write, nothing else changes.
        0 => true,
        // 1 -> 2: the application version moved from a bare key to its
        // namespaced form.
        1 => {
            if map.contains_key(keys::LEGACY_MODEL_VERSION) {
                map.rename(keys::LEGACY_MODEL_VERSION, keys::MODEL_VERSION);
            }
            true
        }
        // 2 -> 3: ordering indexes moved under the namespaced prefix; the
        // legacy entries are dropped (orderings reset to encounter order).
        2 => {
            let legacy = map.keys_with_prefix(keys::LEGACY_ORDER_PREFIX);
            for key in &legacy {
                map.remove(key);
            }
            if !legacy.is_empty() {
                info!(count = legacy.len(), "dropped legacy ordering-index entries");
            }
            true
        }
        _ => false,
    }
}
