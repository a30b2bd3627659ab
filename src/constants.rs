//! Reserved key names and derived-key prefixes
//!
//! This module contains all magic strings and version numbers used by the
//! preference store, providing a single source of truth for constant values.

/// Reserved keys and derived-key prefixes inside a preference file
pub mod keys {
    /// Key holding the structural revision of the preference file format itself
    pub const STRUCTURE_VERSION: &str = "preferences.structure.version";

    /// Key holding the application-defined preference schema version
    pub const MODEL_VERSION: &str = "preferences.version";

    /// Pre-revision-2 location of the application version number (bare key)
    pub const LEGACY_MODEL_VERSION: &str = "version";

    /// Prefix for ordering-index entries (`<prefix><key>` holds an integer position)
    pub const ORDER_PREFIX: &str = "preferences.order.";

    /// Ordering-index prefix used before structural revision 3
    pub const LEGACY_ORDER_PREFIX: &str = "order.";

    /// Prefix for the width half of a dimension preference
    pub const WIDTH_PREFIX: &str = "preferences.width.";

    /// Prefix for the height half of a dimension preference
    pub const HEIGHT_PREFIX: &str = "preferences.height.";
}

/// Version numbers owned by the store itself
pub mod version {
    /// Structural revision written by this build (revisions 0..=3 are readable)
    pub const CURRENT_STRUCTURE: i32 = 3;
}

/// Encoding constants for the typed codec
pub mod codec {
    /// Separator between elements of a stored string list
    pub const LIST_SEPARATOR: char = '|';
}

/// File placement constants
pub mod file {
    /// Directory created under the platform config dir when no override is given
    pub const APP_DIR: &str = "prefstore";
}

/// Position value meaning "no ordering assigned"
pub const UNORDERED: i32 = -1;
