//! Dynamic value model for Quartet validators.
//!
//! Candidate values handed to a compiled validator are [`Value`] trees. The
//! model follows the usual dynamic-language shape: `undefined` and `null` are
//! distinct, numbers are IEEE doubles, and objects keep insertion order.

mod object;

/// The [`Value`] type and its collections.
pub mod value;

#[cfg(feature = "json")]
mod json;

pub use object::Object;
pub use value::{Array, Value};
