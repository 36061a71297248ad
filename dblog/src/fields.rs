// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Structured fields attached to log messages.

use std::fmt;
use time::Duration;

/// Value of a structured field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A free-form string.
    Str(String),

    /// A signed integer.
    I64(i64),

    /// An unsigned integer.
    U64(u64),

    /// A boolean.
    Bool(bool),

    /// A time span, such as the time it took to run a statement.
    Duration(Duration),

    /// The rendered message of an error.
    Error(String),
}

impl FieldValue {
    /// Captures the message of `err` as a field value.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        FieldValue::Error(err.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::I64(i) => write!(f, "{}", i),
            FieldValue::U64(u) => write!(f, "{}", u),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Duration(d) => write!(f, "{:.3}ms", d.as_seconds_f64() * 1000.0),
            FieldValue::Error(e) => write!(f, "{:?}", e),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::I64(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::U64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Duration> for FieldValue {
    fn from(value: Duration) -> Self {
        FieldValue::Duration(value)
    }
}

/// A key/value pair attached to a log message.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Name of the field.
    pub key: &'static str,

    /// Value of the field.
    pub value: FieldValue,
}

impl Field {
    /// Creates a new field named `key` with `value`.
    pub fn new<V: Into<FieldValue>>(key: &'static str, value: V) -> Self {
        Self { key, value: value.into() }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Renders a list of `fields` as space-separated `key=value` pairs.
pub fn display_fields(fields: &[Field]) -> String {
    fields.iter().map(Field::to_string).collect::<Vec<String>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display() {
        assert_eq!("\"a \\\"b\\\"\"", FieldValue::from("a \"b\"").to_string());
        assert_eq!("-1", FieldValue::from(-1i64).to_string());
        assert_eq!("42", FieldValue::from(42u64).to_string());
        assert_eq!("true", FieldValue::from(true).to_string());
        assert_eq!("1.500ms", FieldValue::from(Duration::microseconds(1500)).to_string());
        assert_eq!(
            "\"Entity not found\"",
            FieldValue::Error("Entity not found".to_owned()).to_string()
        );
    }

    #[test]
    fn test_field_value_from_error() {
        let err = std::io::Error::other("disk on fire");
        assert_eq!(FieldValue::Error("disk on fire".to_owned()), FieldValue::from_error(&err));
    }

    #[test]
    fn test_display_fields() {
        assert_eq!("", display_fields(&[]));
        assert_eq!(
            "sql=\"SELECT 1\" rows=1",
            display_fields(&[Field::new("sql", "SELECT 1"), Field::new("rows", 1i64)])
        );
    }
}
