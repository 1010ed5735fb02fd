use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    Any,
    Int,
    Float,
    Bool,
    String,
    List,
}

/// Value flowing through slots and stored as node parameters.
///
/// `Invalid` is the sentinel a node produces on every output when it could not
/// be calculated. It is never written to disk as a parameter.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub enum Value {
    #[default]
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    List(Vec<Value>),
    Invalid,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Invalid, Value::Invalid) => true,
            (Value::Int(left), Value::Int(right)) => left == right,
            (Value::Float(left), Value::Float(right)) => left.to_bits() == right.to_bits(),
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::List(left), Value::List(right)) => left == right,
            _ => false,
        }
    }
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::None | Value::Invalid => DataType::Any,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
            Value::List(_) => DataType::List,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }
    /// Ints are widened, everything else is `None`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Converts the value for an input slot of type `dst`. Returns `None` when
    /// there is no sensible conversion; `None` and `Invalid` pass through
    /// untouched so the receiving node can see them.
    pub fn convert_type(self, dst: DataType) -> Option<Value> {
        let converted = match (self, dst) {
            (value @ (Value::None | Value::Invalid), _) => value,
            (value, DataType::Any) => value,

            (value @ Value::Bool(_), DataType::Bool) => value,
            (Value::Bool(v), DataType::Int) => Value::Int(v as i64),
            (Value::Bool(v), DataType::Float) => Value::Float(v as i64 as f64),
            (Value::Bool(v), DataType::String) => Value::String(v.to_string()),

            (value @ Value::Int(_), DataType::Int) => value,
            (Value::Int(v), DataType::Bool) => Value::Bool(v != 0),
            (Value::Int(v), DataType::Float) => Value::Float(v as f64),
            (Value::Int(v), DataType::String) => Value::String(v.to_string()),

            (value @ Value::Float(_), DataType::Float) => value,
            (Value::Float(v), DataType::Bool) => Value::Bool(v.abs() > f64::EPSILON),
            (Value::Float(v), DataType::Int) => Value::Int(v as i64),
            (Value::Float(v), DataType::String) => Value::String(v.to_string()),

            (value @ Value::String(_), DataType::String) => value,
            (Value::String(s), DataType::Int) => Value::Int(s.trim().parse().ok()?),
            (Value::String(s), DataType::Float) => Value::Float(s.trim().parse().ok()?),
            (Value::String(s), DataType::Bool) => Value::Bool(s == "true" || s == "1"),

            (value @ Value::List(_), DataType::List) => value,
            (value, DataType::List) => Value::List(vec![value]),

            (Value::List(_), _) => return None,
        };

        Some(converted)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Invalid => write!(f, "invalid"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::List(values) => {
                write!(f, "[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}
