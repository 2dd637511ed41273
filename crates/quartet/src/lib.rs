//! Schema-driven validator compiler.
//!
//! A [`Schema`] tree is compiled by a [`Quartet`] into a [`Validator`] that
//! checks candidate [`Value`]s and, in explain mode, reports every violation
//! as an [`Explanation`].
//!
//! ```
//! use quartet::{ObjectSchema, Quartet, Schema};
//! use quartet::value::Value;
//!
//! let q = Quartet::explain();
//! let schema: Schema = ObjectSchema::new()
//!     .field("name", q.string())
//!     .field("kind", Schema::variant([Schema::from("a"), Schema::from("b")]))
//!     .into();
//! let validator = q.compile(&schema).unwrap();
//!
//! let mut value = quartet::value::Object::default();
//! value.insert("name".to_string(), Value::from("x"));
//! value.insert("kind".to_string(), Value::from("c"));
//! let output = validator.explain(&value.into());
//! assert!(!output.is_valid);
//! assert_eq!(output.explanations.len(), 1);
//! ```

mod classify;
mod compile;
mod constant;
mod context;
mod describe;
mod error;
mod explanation;
mod methods;
mod program;
mod quartet;
mod schema;
mod settings;
mod throw_error;
pub mod utils;
mod validator;

pub use quartet_value as value;
pub use quartet_value::Value;

pub use classify::{SchemaKind, classify};
pub use constant::{Literal, constant_to_function};
pub use context::{Context, Preparation, Slot, SlotInit, SlotKey};
pub use describe::describe;
pub use error::{AssertionError, SchemaError};
pub use explanation::{Explanation, Path, PathSegment, RejectedAlternative};
pub use program::{FunctionSite, Program};
pub use quartet::Quartet;
pub use schema::{Check, Descriptor, ErrorHandler, FunctionSchema, ObjectSchema, Schema};
pub use settings::{Mode, Settings};
pub use throw_error::throw_error;
pub use validator::{Validation, ValidationOutput, Validator};
