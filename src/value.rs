//! Typed codec between native preference values and their stored string form
//!
//! Every supported kind is a variant of [`PrefValue`]; encode and decode are
//! exhaustive matches, so an unsupported kind cannot reach the store at all.
//! Dimension is the one kind whose storage is not a single entry: it encodes
//! to a width/height pair that the store writes under derived keys.

use crate::color::HexColor;
use crate::constants::codec::LIST_SEPARATOR;
use crate::error::PrefError;

/// A preference value of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    Color(HexColor),
    /// Width × height pair, stored as two scalar entries under derived keys
    Dimension { width: f64, height: f64 },
    List(Vec<String>),
}

/// Encoded form of a [`PrefValue`]: a single entry, or the width/height pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Single(String),
    Pair { width: String, height: String },
}

impl PrefValue {
    /// Encode to the canonical stored string form.
    ///
    /// The only failable kind is `List`: elements must not contain the
    /// reserved separator. Validation happens before any store mutation.
    pub fn encode(&self) -> Result<Encoded, PrefError> {
        let text = match self {
            PrefValue::Str(s) => s.clone(),
            PrefValue::Bool(b) => b.to_string(),
            PrefValue::Int(i) => i.to_string(),
            PrefValue::Double(d) => d.to_string(),
            PrefValue::Color(c) => c.to_hex_string(),
            PrefValue::Dimension { width, height } => {
                return Ok(Encoded::Pair {
                    width: width.to_string(),
                    height: height.to_string(),
                });
            }
            PrefValue::List(elements) => {
                for element in elements {
                    if element.contains(LIST_SEPARATOR) {
                        return Err(PrefError::IllegalElement {
                            element: element.clone(),
                            separator: LIST_SEPARATOR,
                        });
                    }
                }
                elements.join(&LIST_SEPARATOR.to_string())
            }
        };
        Ok(Encoded::Single(text))
    }
}

/// Decode a stored string as a boolean. Anything but a case-insensitive
/// "true" reads as false; boolean decoding never fails.
pub fn decode_bool(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("true")
}

/// Decode a stored string as an integer.
pub fn decode_int(key: &str, text: &str) -> Result<i64, PrefError> {
    text.trim().parse::<i64>().map_err(|source| PrefError::ParseInt {
        key: key.to_string(),
        text: text.to_string(),
        source,
    })
}

/// Decode a stored string as a double.
pub fn decode_double(key: &str, text: &str) -> Result<f64, PrefError> {
    text.trim().parse::<f64>().map_err(|source| PrefError::ParseFloat {
        key: key.to_string(),
        text: text.to_string(),
        source,
    })
}

/// Decode a stored string as a hex color.
pub fn decode_color(key: &str, text: &str) -> Result<HexColor, PrefError> {
    HexColor::parse(text).ok_or_else(|| PrefError::InvalidColor {
        key: key.to_string(),
        text: text.to_string(),
    })
}

/// Decode a stored string as a list. Empty input decodes to an empty
/// vector; list decoding never fails.
pub fn decode_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(LIST_SEPARATOR).map(str::to_string).collect()
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::Str(s.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        PrefValue::Str(s)
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Bool(b)
    }
}

impl From<i64> for PrefValue {
    fn from(i: i64) -> Self {
        PrefValue::Int(i)
    }
}

impl From<f64> for PrefValue {
    fn from(d: f64) -> Self {
        PrefValue::Double(d)
    }
}

impl From<HexColor> for PrefValue {
    fn from(c: HexColor) -> Self {
        PrefValue::Color(c)
    }
}

impl From<(f64, f64)> for PrefValue {
    fn from((width, height): (f64, f64)) -> Self {
        PrefValue::Dimension { width, height }
    }
}

impl From<Vec<String>> for PrefValue {
    fn from(list: Vec<String>) -> Self {
        PrefValue::List(list)
    }
}

impl From<&[&str]> for PrefValue {
    fn from(list: &[&str]) -> Self {
        PrefValue::List(list.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(
            PrefValue::Bool(true).encode().unwrap(),
            Encoded::Single("true".to_string())
        );
        assert_eq!(
            PrefValue::Int(-42).encode().unwrap(),
            Encoded::Single("-42".to_string())
        );
        assert_eq!(
            PrefValue::Str("plain".to_string()).encode().unwrap(),
            Encoded::Single("plain".to_string())
        );
    }

    #[test]
    fn test_encode_dimension_is_a_pair() {
        let encoded = PrefValue::Dimension { width: 123.0, height: 456.0 }.encode().unwrap();
        assert_eq!(
            encoded,
            Encoded::Pair { width: "123".to_string(), height: "456".to_string() }
        );
    }

    #[test]
    fn test_encode_list_joins_on_separator() {
        let v = PrefValue::from(["a", "b", "c"].as_slice());
        assert_eq!(v.encode().unwrap(), Encoded::Single("a|b|c".to_string()));
    }

    #[test]
    fn test_encode_list_rejects_separator_in_element() {
        let v = PrefValue::List(vec!["ok".to_string(), "bad|element".to_string()]);
        let err = v.encode().unwrap_err();
        assert!(matches!(err, PrefError::IllegalElement { .. }));
    }

    #[test]
    fn test_decode_bool_is_lenient() {
        assert!(decode_bool("true"));
        assert!(decode_bool("TRUE"));
        assert!(!decode_bool("false"));
        assert!(!decode_bool("garbage"));
    }

    #[test]
    fn test_decode_int_reports_parse_error() {
        assert_eq!(decode_int("k", "17").unwrap(), 17);
        let err = decode_int("k", "seventeen").unwrap_err();
        assert!(matches!(err, PrefError::ParseInt { .. }));
        assert!(!err.is_missing());
    }

    #[test]
    fn test_decode_double_roundtrips_display_form() {
        let d = 0.25_f64;
        assert_eq!(decode_double("k", &d.to_string()).unwrap(), d);
        assert!(decode_double("k", "NaN").unwrap().is_nan());
    }

    #[test]
    fn test_decode_list_empty_is_empty_vec() {
        assert!(decode_list("").is_empty());
        assert_eq!(decode_list("solo"), vec!["solo".to_string()]);
        assert_eq!(
            decode_list("a|b"),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
