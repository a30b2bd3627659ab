//! Error types for preference store operations
//!
//! Load failures never surface here: loads absorb every failure internally
//! and fall back to defaults. Only typed reads/writes and saves return errors.

use std::path::PathBuf;
use thiserror::Error;

/// Preference store operation error.
#[derive(Debug, Error)]
pub enum PrefError {
    /// Required key has no stored value ("never configured").
    #[error("no value stored for preference '{key}'")]
    MissingKey {
        key: String,
    },

    /// A list element contains the reserved separator character.
    #[error("list element '{element}' contains the reserved separator '{separator}'")]
    IllegalElement {
        element: String,
        separator: char,
    },

    /// Stored value does not parse as an integer.
    #[error("preference '{key}' is not an integer: '{text}'")]
    ParseInt {
        key: String,
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Stored value does not parse as a floating point number.
    #[error("preference '{key}' is not a number: '{text}'")]
    ParseFloat {
        key: String,
        text: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Stored value is not a recognizable hex color.
    #[error("preference '{key}' is not a color: '{text}'")]
    InvalidColor {
        key: String,
        text: String,
    },

    /// File I/O failure while writing the preference file.
    #[error("failed to {operation} preference file {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure while producing the preference document.
    #[error("failed to serialize preferences")]
    Format {
        #[source]
        source: toml::ser::Error,
    },
}

impl PrefError {
    /// True when the error signals "never configured" rather than corruption.
    pub fn is_missing(&self) -> bool {
        matches!(self, PrefError::MissingKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing_distinguishes_taxonomy() {
        let missing = PrefError::MissingKey { key: "a.b".to_string() };
        assert!(missing.is_missing());

        let illegal = PrefError::IllegalElement { element: "x|y".to_string(), separator: '|' };
        assert!(!illegal.is_missing());
    }

    #[test]
    fn test_display_names_the_key() {
        let err = PrefError::MissingKey { key: "show.splash".to_string() };
        assert!(err.to_string().contains("show.splash"));
    }
}
