//! String utilities shared by the compiler and the source renderer

use std::fmt::{self, Display};
use std::sync::LazyLock;

use ahash::RandomState;
use indexmap::IndexSet;
use quartet_value::Value;
use regex::Regex;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// Access fragment for a property name.
///
/// Identifier-safe names use dotted form (`.name`), everything else is
/// bracketed and quoted (`["my-key"]`).
pub fn key_accessor(key: &str) -> String {
    if IDENTIFIER.is_match(key) {
        format!(".{key}")
    } else {
        format!("[{}]", quote(key))
    }
}

/// Double-quoted, escaped string literal.
pub fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

/// Constant-time membership set built from an ordered key sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(IndexSet<String, RandomState>);

impl KeySet {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, key) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: true", quote(key))?;
        }
        write!(f, "}}")
    }
}

/// Build a [`KeySet`] from keys. Duplicates collapse; first occurrence wins
/// the position.
pub fn to_dict<I, S>(keys: I) -> KeySet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    KeySet(keys.into_iter().map(Into::into).collect())
}

/// Indent every line of `code` by `unit` spaces.
pub fn add_tabs(code: &str, unit: usize) -> String {
    let pad = " ".repeat(unit);
    code.split('\n')
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
