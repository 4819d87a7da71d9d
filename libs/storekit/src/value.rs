//! Typed filter values.
//!
//! Values carried by filters and extracted from stored records are compared
//! per type. The only cross-type coercions are a string against a UUID or a
//! timestamp, where the string is parsed rather than the other side printed.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    String(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Convert a JSON value coming from a request.
    ///
    /// Strings stay strings; they are coerced only when compared against a
    /// typed counterpart.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value as J;
        match value {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(*b),
            J::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            J::String(s) => Self::String(s.clone()),
            J::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            J::Object(_) => Self::String(value.to_string()),
        }
    }

    /// Convert a JSON value read back from storage.
    ///
    /// Stored timestamps are RFC 3339 strings with a variable number of
    /// fractional digits, so they are lifted to `Timestamp` to order correctly.
    #[must_use]
    pub fn from_stored(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s).map_or_else(
                |_| Self::String(s.clone()),
                |dt| Self::Timestamp(dt.with_timezone(&Utc)),
            ),
            other => Self::from_json(other),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Self::Null => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(J::Null, J::Number),
            Self::Uuid(u) => J::String(u.to_string()),
            Self::Timestamp(ts) => J::String(ts.to_rfc3339()),
            Self::String(s) => J::String(s.clone()),
            Self::List(items) => J::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text form used by pattern operators. Only strings and UUIDs have one.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Uuid(u) => Some(Cow::Owned(u.to_string())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Per-type comparison. `None` means the two values are not comparable.
    #[must_use]
    pub fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::String(s)) => Uuid::parse_str(s).ok().map(|b| a.cmp(&b)),
            (Self::String(s), Self::Uuid(b)) => Uuid::parse_str(s).ok().map(|a| a.cmp(b)),
            (Self::Timestamp(a), Self::String(s)) => parse_timestamp(s).map(|b| a.cmp(&b)),
            (Self::String(s), Self::Timestamp(b)) => parse_timestamp(s).map(|a| a.cmp(b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn equals(&self, other: &FilterValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FilterValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
