//! Field values
//!
//! A slot holds one `Value`. `Value::Undef` is the unset state: it is what
//! a freshly constructed instance carries in every slot without a default,
//! what predicates test against, and what validation skips.

use std::fmt;

use serde_json::json;

use super::instance::Object;
use crate::schema::{AttrError, AttrResult};

/// A value stored in an instance slot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Unset / undefined
    #[default]
    Undef,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Another instance, owned by this slot
    Object(Box<Object>),
}

impl Value {
    /// Returns true unless the value is `Undef`
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undef)
    }

    /// Returns the runtime type name
    ///
    /// Objects report their class name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Undef => "Undef",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::Object(obj) => obj.class_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Converts to JSON; nested objects render as their class and raw slots
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undef => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::Str(s) => json!(s),
            Value::Object(obj) => {
                let slots: Vec<serde_json::Value> = obj.slots().iter().map(Value::to_json).collect();
                json!({ "class": obj.class_name(), "slots": slots })
            }
        }
    }
}

/// Textual form used by pattern rules and validation messages
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "{}=OBJECT", obj.class_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(Box::new(obj))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Undef)
    }
}

/// Literal values from class definition files
impl TryFrom<&serde_json::Value> for Value {
    type Error = AttrError;

    fn try_from(json: &serde_json::Value) -> AttrResult<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Undef),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(AttrError::Argument(format!("number out of range: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            other => Err(AttrError::Argument(format!(
                "only scalar literals can be stored in a field, got {}",
                other
            ))),
        }
    }
}
