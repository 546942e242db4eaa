//! Cell value types

use crate::error::{Error, Result};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Prefix used when an error cell is rendered as text
pub const ERROR_MARKER_PREFIX: &str = "#ERROR:";

/// The value of one cell as seen by readers and writers
///
/// Numbers keep the distinction the worksheet text carries: a value with no
/// fractional part reads back as [`CellValue::Integer`]. Equality is numeric
/// across the two number variants, so `Integer(3) == Number(3.0)`.
#[derive(Debug, Clone, Default)]
pub enum CellValue {
    /// No value (missing cell, or a cell without `<v>`)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Integral number
    Integer(i64),

    /// Floating point number
    Number(f64),

    /// Text
    String(String),

    /// Error cell, carrying the original code such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Decode numeric cell text: integral values narrow to [`CellValue::Integer`]
    ///
    /// Text that does not parse as a finite number is returned as a string so
    /// that odd producers do not lose data.
    pub fn from_numeric_text(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    CellValue::Integer(n as i64)
                } else {
                    CellValue::Number(n)
                }
            }
            _ => CellValue::String(text.to_string()),
        }
    }

    /// Convert a JSON value received at the API boundary
    ///
    /// `null` is empty; arrays and objects are stored as their JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Empty,
            JsonValue::Bool(b) => CellValue::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => CellValue::String(s.clone()),
            other => CellValue::String(other.to_string()),
        }
    }

    /// Reject values that have no representation in a worksheet
    pub fn validate(&self) -> Result<()> {
        match self {
            CellValue::Number(n) if !n.is_finite() => Err(Error::InvalidValue(format!(
                "non-finite number {}",
                n
            ))),
            _ => Ok(()),
        }
    }

    /// Text written into `<v>` for numeric values
    pub fn numeric_text(&self) -> Option<String> {
        match self {
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Number(n) => Some(number_text(*n)),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

}

/// Shortest text that parses back to `n`
///
/// Magnitudes of 1e21 and above, or below 1e-6, use exponent form
/// (`1E+300`, `1E-300`) as Excel writes them.
fn number_text(n: f64) -> String {
    if n != 0.0 && (n.abs() >= 1e21 || n.abs() < 1e-6) {
        let text = format!("{:E}", n);
        match text.split_once('E') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}E+{}", mantissa, exp),
            _ => text,
        }
    } else {
        n.to_string()
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        use CellValue::*;
        match (self, other) {
            (Empty, Empty) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Error(a), Error(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Integer(_) | Number(_), Integer(_) | Number(_)) => {
                self.as_number() == other.as_number()
            }
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Error(code) => write!(f, "{}{}", ERROR_MARKER_PREFIX, code),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Error(code) => {
                serializer.serialize_str(&format!("{}{}", ERROR_MARKER_PREFIX, code))
            }
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(CellValue::from_json(&value))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Integer(n as i64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Empty)
    }
}
