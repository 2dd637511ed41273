//! Explanations recorded by validators running in explain mode
//!
//! An explanation is an ordinary value, not an error: validators never fail
//! with it, they push it onto the context and return `false`.

use std::fmt::{self, Display};

use thiserror::Error;
use thisisplural::Plural;

use crate::utils::key_accessor;

// =============================================================================
// Path
// =============================================================================

/// Location of a value inside the candidate, rendered as `value.a["b-c"][0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Plural)]
#[plural(len, is_empty, iter, into_iter, new)]
pub struct Path(Vec<PathSegment>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl Path {
    /// The candidate value itself.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    /// Prepend `outer`, turning a path relative to a nested validator into
    /// one relative to the enclosing candidate.
    pub fn rebase(&mut self, outer: &Path) {
        if outer.is_root() {
            return;
        }
        let mut segments = outer.0.clone();
        segments.append(&mut self.0);
        self.0 = segments;
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, "{}", key_accessor(key))?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Explanation
// =============================================================================

/// One alternative of a variant that did not match.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedAlternative {
    /// Short label of the alternative schema
    pub schema: String,
    /// What the alternative reported, empty for pure alternatives
    pub explanations: Vec<Explanation>,
}

/// Human-readable description of one validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Explanation {
    #[error("{path}: expected {expected}, got {actual}")]
    Mismatch {
        path: Path,
        expected: String,
        actual: String,
    },

    #[error("{path}: expected exactly {expected}, got {actual}")]
    NotEqual {
        path: Path,
        expected: String,
        actual: String,
    },

    #[error("{path}: expected an object, got {actual}")]
    NotAnObject { path: Path, actual: String },

    #[error("{path}: {actual} matched none of [{}]", labels(.alternatives))]
    NoVariantMatched {
        path: Path,
        actual: String,
        alternatives: Vec<RejectedAlternative>,
    },

    #[error("{path}: {message}")]
    Custom { path: Path, message: String },

    /// Failure reported by a check that carries no explanation of its own.
    #[error("{path}: value was rejected")]
    Rejected { path: Path },
}

fn labels(alternatives: &[RejectedAlternative]) -> String {
    alternatives
        .iter()
        .map(|a| a.schema.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Explanation {
    pub fn path(&self) -> &Path {
        match self {
            Explanation::Mismatch { path, .. }
            | Explanation::NotEqual { path, .. }
            | Explanation::NotAnObject { path, .. }
            | Explanation::NoVariantMatched { path, .. }
            | Explanation::Custom { path, .. }
            | Explanation::Rejected { path } => path,
        }
    }

    fn path_mut(&mut self) -> &mut Path {
        match self {
            Explanation::Mismatch { path, .. }
            | Explanation::NotEqual { path, .. }
            | Explanation::NotAnObject { path, .. }
            | Explanation::NoVariantMatched { path, .. }
            | Explanation::Custom { path, .. }
            | Explanation::Rejected { path } => path,
        }
    }

    /// Re-root this explanation (and any nested ones) under `outer`.
    pub fn rebase(&mut self, outer: &Path) {
        self.path_mut().rebase(outer);
        if let Explanation::NoVariantMatched { alternatives, .. } = self {
            for alternative in alternatives {
                for nested in &mut alternative.explanations {
                    nested.rebase(outer);
                }
            }
        }
    }
}
