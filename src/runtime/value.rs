//! Promise payload values
//!
//! A single dynamically typed [`Value`] is carried both as the fulfilled value
//! and as the rejection reason of a promise, the same way a scripting host
//! treats them.

use crate::error::Result;
use crate::outcome::Outcome;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Type alias for native function implementations
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A promise payload value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// undefined, also "no replacement" when returned from a handler
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Ordered list of values (the fulfilled value of `all`)
    Array(Vec<Value>),
    /// Outcomes in input order (the fulfilled value of `allSettled`)
    Outcomes(Vec<Outcome>),
    /// A non-thrown runtime error converted into a rejection reason
    Error(String),
}

impl Value {
    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is nullish (null or undefined)
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_outcomes(&self) -> Option<&[Outcome]> {
        match self {
            Value::Outcomes(outcomes) => Some(outcomes),
            _ => None,
        }
    }

    /// Return `self`, or `original` when `self` is undefined.
    ///
    /// A handler that returns nothing leaves the carried value untouched.
    pub fn or_original(self, original: Value) -> Value {
        if self.is_undefined() {
            original
        } else {
            self
        }
    }

    /// Render the value through serde_json
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Convert to a display string
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(true) => "true".to_string(),
            Value::Boolean(false) => "false".to_string(),
            Value::Number(n) => {
                if n.is_nan() {
                    "NaN".to_string()
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        "Infinity".to_string()
                    } else {
                        "-Infinity".to_string()
                    }
                } else if *n == 0.0 {
                    "0".to_string()
                } else {
                    format!("{}", n)
                }
            }
            Value::String(s) => s.clone(),
            Value::Array(values) => {
                let elements: Vec<String> = values.iter().map(|v| v.to_js_string()).collect();
                elements.join(",")
            }
            Value::Outcomes(outcomes) => {
                let elements: Vec<String> = outcomes.iter().map(|o| o.to_string()).collect();
                elements.join(",")
            }
            Value::Error(message) => message.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_js_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Vec<Outcome>> for Value {
    fn from(outcomes: Vec<Outcome>) -> Self {
        Value::Outcomes(outcomes)
    }
}
