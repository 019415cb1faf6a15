use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::helpers::parse_helpers::{parse_float_cell, parse_int_cell, split_list_cell};
use crate::engine::Result;

/// Physical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
    List,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Int64 => "integer",
            ColumnType::Float64 => "float",
            ColumnType::Str => "text",
            ColumnType::List => "list",
        };
        f.write_str(s)
    }
}

/// A single cell. `Null` is the one null sentinel used everywhere,
/// including unmatched join sides.
#[derive(Debug, Clone, Default)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
    #[default]
    Null,
}

impl Value {
    /// Converts user-entered text into an operand for a column of type `ty`.
    ///
    /// Empty input or the literal `null` (any case) becomes [`Value::Null`] for
    /// numeric columns. Fractional text for an integer column becomes a
    /// [`Value::Float`], which still compares numerically.
    pub fn parse_for(ty: ColumnType, text: &str) -> Result<Value> {
        match ty {
            ColumnType::Int64 => match parse_int_cell(text) {
                Ok(v) => Ok(v.map_or(Value::Null, Value::Int)),
                Err(_) => Ok(parse_float_cell(text)?.map_or(Value::Null, Value::Float)),
            },
            ColumnType::Float64 => Ok(parse_float_cell(text)?.map_or(Value::Null, Value::Float)),
            ColumnType::Str => Ok(Value::Str(text.to_string())),
            ColumnType::List => Ok(Value::List(split_list_cell(text))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Natural ordering between two values of compatible tags.
    ///
    /// Integers and floats compare numerically with each other; every other
    /// cross-tag pair is incomparable. Null sorts below everything.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Int(a), Value::Float(b)) => Some((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Int(b)) => Some(a.total_cmp(&(*b as f64))),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
            Value::List(v) => v.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::List(v) => f.write_str(&v.join("|")),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
