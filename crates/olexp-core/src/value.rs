//! Dynamic property values.
//!
//! Layers carry an open-ended property store (`name`, `opacity`, measurement
//! annotations, arbitrary user keys). [`Value`] is the type-erased container
//! stored there.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A value stored in a layer's property store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A floating point number.
    Number(f64),
    /// A string value.
    Text(String),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Loose truthiness: `false`, `0`, `""` and null are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Number(v) => *v != 0.0 && !v.is_nan(),
            Value::Text(v) => !v.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// An ordered property map, as read and written by item editors.
pub type Properties = BTreeMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(true).is_truthy());
        assert!(Value::from("yes").is_truthy());
        assert!(Value::from(0.5).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(0.75).to_string(), "0.75");
        assert_eq!(Value::from("OSM").to_string(), "OSM");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_untagged_serde() {
        let props: Properties =
            serde_json::from_str(r#"{"name":"OSM","opacity":0.5,"hidden":false,"x":null}"#)
                .unwrap();
        assert_eq!(props["name"], Value::from("OSM"));
        assert_eq!(props["opacity"].as_number(), Some(0.5));
        assert_eq!(props["hidden"].as_bool(), Some(false));
        assert!(props["x"].is_null());
    }
}
