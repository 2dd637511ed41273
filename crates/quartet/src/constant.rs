//! Literal constants and their rewrite into Function schemas

use std::fmt::{self, Display};
use std::sync::Arc;

use quartet_value::Value;

use crate::Quartet;
use crate::context::SlotInit;
use crate::explanation::Explanation;
use crate::schema::{Check, Descriptor, ErrorHandler, FunctionSchema};

/// A value accepted by a Constant schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Literal {
    /// Strict equality: no coercion between kinds, `NaN` never equal,
    /// `0` and `-0` equal.
    pub fn strict_eq(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Undefined, Value::Undefined) => true,
            (Literal::Null, Value::Null) => true,
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::Number(a), Value::Number(b)) => a == b,
            (Literal::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Number(value.into())
    }
}

/// Rewrite a literal into a Function schema comparing against a context slot.
///
/// The literal is stored once in a `constant` slot; the rendered check
/// reads `value === ctx.constant4` and never re-embeds the literal text.
pub fn constant_to_function(quartet: &Quartet, literal: &Literal) -> FunctionSchema {
    let quartet = quartet.clone();
    let literal = Arc::new(literal.clone());
    let explain = quartet.settings().is_explain();
    FunctionSchema::new(literal.to_string(), move || {
        let (slot, prepare) = quartet.to_context("constant", SlotInit::Literal(literal.clone()));
        let name = slot.name().to_string();
        let check = {
            let slot = slot.clone();
            let name = name.clone();
            Check::new(
                move |value, ctx| ctx.literal(&slot).is_some_and(|l| l.strict_eq(value)),
                move |v, c| format!("{v} === {c}.{name}"),
            )
        };
        let not = {
            let slot = slot.clone();
            let name = name.clone();
            Check::new(
                move |value, ctx| !ctx.literal(&slot).is_some_and(|l| l.strict_eq(value)),
                move |v, c| format!("{v} !== {c}.{name}"),
            )
        };
        let mut descriptor = Descriptor::new(check).with_not(not).with_prepare(prepare);
        if explain {
            let expected = literal.to_string();
            descriptor = descriptor.with_handle_error(ErrorHandler::new(
                move |value, path, ctx| {
                    ctx.record(Explanation::NotEqual {
                        path: path.clone(),
                        expected: expected.clone(),
                        actual: value.to_string(),
                    })
                },
                move |v, c| format!("{c}.explanations.push(`${{{v}}} !== ${{{c}.{name}}}`)"),
            ));
        }
        descriptor
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn test_strict_eq_distinguishes_falsy_values() {
        let candidates = [
            Value::Number(0.0),
            Value::from(""),
            Value::Bool(false),
            Value::Null,
            Value::Undefined,
        ];
        let literals = [
            Literal::Number(0.0),
            Literal::from(""),
            Literal::Bool(false),
            Literal::Null,
            Literal::Undefined,
        ];
        for (i, literal) in literals.iter().enumerate() {
            for (j, value) in candidates.iter().enumerate() {
                assert_eq!(literal.strict_eq(value), i == j, "{literal} vs {value}");
            }
        }
    }

    #[test]
    fn test_strict_eq_numbers() {
        assert!(Literal::Number(0.0).strict_eq(&Value::Number(-0.0)));
        assert!(!Literal::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
        assert!(!Literal::from(1).strict_eq(&Value::from("1")));
    }

    #[test]
    fn test_constant_reads_literal_from_slot() {
        let quartet = Quartet::fast();
        let function = constant_to_function(&quartet, &Literal::from("a"));
        assert_eq!(function.name(), "\"a\"");

        let descriptor = function.descriptor();
        let prepare = descriptor.prepare.clone().expect("constant registers a slot");
        let name = prepare.key().name().to_string();
        assert!(name.starts_with("constant"));
        assert_eq!(descriptor.check.render("value", "ctx"), format!("value === ctx.{name}"));
        assert!(descriptor.handle_error.is_none());

        let mut ctx = Context::prepare(&[prepare]);
        assert!(descriptor.check.eval(&Value::from("a"), &mut ctx));
        assert!(!descriptor.check.eval(&Value::from("b"), &mut ctx));
    }

    #[test]
    fn test_each_descriptor_gets_its_own_slot() {
        let quartet = Quartet::fast();
        let function = constant_to_function(&quartet, &Literal::Null);
        let a = function.descriptor().prepare.expect("slot");
        let b = function.descriptor().prepare.expect("slot");
        assert_ne!(a.key(), b.key());
    }
}
