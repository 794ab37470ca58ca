use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed cell values. API data arrives as JSON and database data arrives as
/// driver values; both are narrowed to this set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Convert a JSON scalar. Arrays and objects are kept as their JSON text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Text(n.to_string())
                }
            }
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Null => FieldValue::Null,
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Render as a JSON value. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Null => Value::Null,
        }
    }

    /// Extract as string, returning None for anything but `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer conversion with `astype(int)` semantics: floats truncate,
    /// text must parse as a whole number, booleans map to 0/1, null fails.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            FieldValue::Float(_) => None,
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Boolean(b) => Some(i64::from(*b)),
            FieldValue::Null => None,
        }
    }

    /// Narrow this value to the storage representation of `kind`.
    pub fn coerce(&self, kind: ColumnKind) -> FieldValue {
        match (kind, self) {
            (_, FieldValue::Null) => FieldValue::Null,
            (ColumnKind::Float, FieldValue::Integer(i)) => FieldValue::Float(*i as f64),
            (ColumnKind::Text, FieldValue::Text(_)) => self.clone(),
            (ColumnKind::Text, other) => FieldValue::Text(other.to_json().to_string()),
            _ => self.clone(),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            // Bitwise so that Eq and Hash agree (NaN == NaN here).
            (FieldValue::Float(a), FieldValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Null, FieldValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Boolean(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "NULL"),
        }
    }
}

/// Storage type of a column, inferred from its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    /// Infer the narrowest kind that holds every value. All-null columns are text.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a FieldValue>) -> Self {
        let mut kind: Option<ColumnKind> = None;
        for value in values {
            let this = match value {
                FieldValue::Null => continue,
                FieldValue::Integer(_) => ColumnKind::Integer,
                FieldValue::Float(_) => ColumnKind::Float,
                FieldValue::Boolean(_) => ColumnKind::Boolean,
                FieldValue::Text(_) => return ColumnKind::Text,
            };
            kind = Some(match (kind, this) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnKind::Integer), ColumnKind::Float)
                | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
                _ => return ColumnKind::Text,
            });
        }
        kind.unwrap_or(ColumnKind::Text)
    }

    /// SQL column type understood by both MySQL and SQLite.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "BIGINT",
            ColumnKind::Float => "DOUBLE",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Text => "TEXT",
        }
    }
}
