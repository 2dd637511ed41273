use std::borrow::Cow;
use std::fmt::{self, Display};

use thisisplural::Plural;

use crate::object::Object;

/// Shared `undefined` returned for missing properties.
pub static UNDEFINED: Value = Value::Undefined;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value. Missing properties read as `Undefined`.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
}

#[derive(Debug, Clone, PartialEq, Default, Plural)]
#[plural(len, is_empty, iter, into_iter, into_iter_ref, new)]
pub struct Array(pub Vec<Value>);

impl Array {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(Vec::from_iter(iter))
    }
}

impl Value {
    /// Name of the runtime type, as used in explanations.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// `true` for `null` and `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Property lookup. Arrays accept canonical decimal indices; anything
    /// missing reads as `undefined`.
    pub fn get(&self, key: &str) -> &Value {
        let found = match self {
            Value::Object(object) => object.get(key),
            Value::Array(array) => parse_index(key).and_then(|i| array.get(i)),
            _ => None,
        };
        found.unwrap_or(&UNDEFINED)
    }

    /// Own enumerable property names, in enumeration order.
    ///
    /// Objects yield their keys in insertion order and arrays yield their
    /// indices. Every other value has no own keys.
    pub fn own_keys(&self) -> Vec<Cow<'_, str>> {
        match self {
            Value::Object(object) => object.keys().map(Cow::Borrowed).collect(),
            Value::Array(array) => (0..array.len())
                .map(|i| Cow::Owned(i.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Length of a string (in chars) or an array.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(a) => Some(a.len()),
            _ => None,
        }
    }
}

fn parse_index(key: &str) -> Option<usize> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}

pub(crate) fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}Infinity", if n < 0.0 { "-" } else { "" })
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

pub(crate) fn fmt_string(s: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => fmt_string(s, f),
            Value::Array(array) => {
                write!(f, "[")?;
                for (i, item) in array.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(object) => write!(f, "{object}"),
        }
    }
}

// ============================================================================
// From implementations for Value
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
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

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
