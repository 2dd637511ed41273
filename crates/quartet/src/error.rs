//! Error types for the quartet crate
//!
//! Two categories:
//! - `SchemaError`: the schema itself is malformed; raised while compiling
//! - `AssertionError`: raised by the assertion adapter, never by validators

use thiserror::Error;

/// Configuration errors detected while classifying or compiling a schema.
///
/// No partial validator is produced when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// An omit list was given to an object schema that has no rest schema
    #[error("omit list [{}] given without a rest schema at {at}", .keys.join(", "))]
    OmitWithoutRest { keys: Vec<String>, at: String },

    /// A `pattern` method received an invalid regular expression
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl SchemaError {
    /// Re-root a location relative to `value` under `prefix`.
    pub(crate) fn rebase(self, prefix: &str) -> Self {
        match self {
            SchemaError::OmitWithoutRest { keys, at } => {
                let rest = at.strip_prefix("value").unwrap_or(&at);
                SchemaError::OmitWithoutRest {
                    at: format!("{prefix}{rest}"),
                    keys,
                }
            }
            other => other,
        }
    }
}

/// Failure of a predicate wrapped by the assertion adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
}
