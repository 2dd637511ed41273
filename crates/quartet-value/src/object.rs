use std::fmt::{self, Display};

use indexmap::IndexMap;
use thisisplural::Plural;

use crate::value::{Value, fmt_string};

/// Ordered string-keyed map. Enumeration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Plural)]
#[plural(len, is_empty, iter, into_iter, into_iter_ref, new)]
pub struct Object(IndexMap<String, Value>);

impl FromIterator<(String, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

impl Object {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// O(n) removal, preserves insertion order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            fmt_string(key, f)?;
            write!(f, ": {value}")?;
        }
        write!(f, "}}")
    }
}
