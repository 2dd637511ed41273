//! Compiled validators

use std::sync::Arc;

use quartet_value::Value;

use crate::error::AssertionError;
use crate::explanation::{Explanation, Path};
use crate::program::Program;
use crate::settings::Mode;
use crate::throw_error::throw_error;

/// Result of an explaining validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutput {
    pub is_valid: bool,
    /// Empty iff `is_valid`
    pub explanations: Vec<Explanation>,
}

/// Mode-dependent result of [`Validator::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(bool),
    Explained(ValidationOutput),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        match self {
            Validation::Valid(valid) => *valid,
            Validation::Explained(output) => output.is_valid,
        }
    }
}

/// A compiled, reusable validator. Cheap to clone and safe to share
/// between threads; every call runs in its own context.
#[derive(Debug, Clone)]
pub struct Validator {
    program: Arc<Program>,
    mode: Mode,
}

impl Validator {
    pub(crate) fn new(program: Arc<Program>, mode: Mode) -> Self {
        Self { program, mode }
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.program.check(value)
    }

    pub fn explain(&self, value: &Value) -> ValidationOutput {
        let (is_valid, mut explanations) = self.program.run(value);
        if !is_valid && explanations.is_empty() {
            explanations.push(Explanation::Rejected { path: Path::root() });
        }
        ValidationOutput {
            is_valid,
            explanations,
        }
    }

    pub fn validate(&self, value: &Value) -> Validation {
        match self.mode {
            Mode::Fast => Validation::Valid(self.is_valid(value)),
            Mode::Explain => Validation::Explained(self.explain(value)),
        }
    }

    /// Return `value` if it is valid, otherwise fail with `message`.
    pub fn assert(&self, value: Value, message: impl Into<String>) -> Result<Value, AssertionError> {
        throw_error(|value: &Value| self.is_valid(value), message)(value)
    }

    pub fn source(&self) -> &str {
        self.program.source()
    }

    pub fn is_pure(&self) -> bool {
        self.program.is_pure()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectSchema, Quartet};
    use serde_json::json;

    #[test]
    fn test_validate_follows_mode() {
        let fast = Quartet::fast();
        let validator = fast.compile(&fast.string()).unwrap();
        assert_eq!(validator.validate(&"a".into()), Validation::Valid(true));
        assert_eq!(validator.validate(&1.into()), Validation::Valid(false));

        let explain = Quartet::explain();
        let validator = explain.compile(&explain.string()).unwrap();
        let Validation::Explained(output) = validator.validate(&1.into()) else {
            panic!("explain mode returns explanations");
        };
        assert!(!output.is_valid);
        assert_eq!(output.explanations.len(), 1);
    }

    #[test]
    fn test_pure_failure_is_still_explained() {
        let q = Quartet::fast();
        let schema = ObjectSchema::new().field("n", q.number()).into();
        let validator = q.compile(&schema).unwrap();
        assert!(validator.is_pure());
        let output = validator.explain(&json!({"n": "x"}).into());
        assert_eq!(
            output.explanations,
            vec![Explanation::Rejected { path: Path::root() }]
        );
        assert!(validator.explain(&json!({"n": 1}).into()).explanations.is_empty());
    }

    #[test]
    fn test_assert() {
        let q = Quartet::fast();
        let validator = q.compile(&q.string()).unwrap();
        assert_eq!(validator.assert("a".into(), "not a string"), Ok(Value::from("a")));
        assert_eq!(
            validator.assert(Value::Null, "not a string"),
            Err(AssertionError {
                message: "not a string".to_string()
            })
        );
    }
}
