//! Built-in Function schemas
//!
//! Every method returns a schema whose descriptor carries an error handler
//! when the instance runs in explain mode, so the same schema code is pure
//! in fast mode and explaining in explain mode.

use std::sync::Arc;

use quartet_value::Value;
use regex::Regex;

use crate::Quartet;
use crate::context::SlotInit;
use crate::error::SchemaError;
use crate::explanation::Explanation;
use crate::schema::{Check, Descriptor, ErrorHandler, Schema};
use crate::utils::quote;

/// Largest integer exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn mismatch(expected: Arc<str>) -> ErrorHandler {
    let rendered = quote(&expected);
    ErrorHandler::new(
        move |value, path, ctx| {
            ctx.record(Explanation::Mismatch {
                path: path.clone(),
                expected: expected.to_string(),
                actual: value.to_string(),
            })
        },
        move |v, c| format!("{c}.explain({v}, {rendered})"),
    )
}

impl Quartet {
    /// Function schema from a value predicate and its rendered form.
    fn builtin<E, R>(&self, name: &str, expected: &str, eval: E, render: R) -> Schema
    where
        E: Fn(&Value) -> bool + Send + Sync + 'static,
        R: Fn(&str) -> String + Send + Sync + 'static,
    {
        let eval = Arc::new(eval);
        let render = Arc::new(render);
        let expected: Arc<str> = Arc::from(expected);
        let explain = self.settings().is_explain();
        Schema::function(name, move || {
            let eval = eval.clone();
            let render = render.clone();
            let descriptor = Descriptor::new(Check::new(
                move |value, _| eval(value),
                move |v, _| render(v),
            ));
            if explain {
                descriptor.with_handle_error(mismatch(expected.clone()))
            } else {
                descriptor
            }
        })
    }

    pub fn any(&self) -> Schema {
        Schema::function("any", || Descriptor::new(Check::new(|_, _| true, |_, _| "true".to_string())))
    }

    pub fn never(&self) -> Schema {
        self.builtin("never", "never", |_| false, |_| "false".to_string())
    }

    pub fn string(&self) -> Schema {
        self.builtin(
            "string",
            "string",
            |v| matches!(v, Value::String(_)),
            |v| format!("typeof {v} === \"string\""),
        )
    }

    pub fn number(&self) -> Schema {
        self.builtin(
            "number",
            "number",
            |v| matches!(v, Value::Number(_)),
            |v| format!("typeof {v} === \"number\""),
        )
    }

    pub fn boolean(&self) -> Schema {
        self.builtin(
            "boolean",
            "boolean",
            |v| matches!(v, Value::Bool(_)),
            |v| format!("typeof {v} === \"boolean\""),
        )
    }

    pub fn null(&self) -> Schema {
        self.builtin("null", "null", |v| matches!(v, Value::Null), |v| format!("{v} === null"))
    }

    pub fn undefined(&self) -> Schema {
        self.builtin(
            "undefined",
            "undefined",
            Value::is_undefined,
            |v| format!("{v} === undefined"),
        )
    }

    /// `null` or `undefined`.
    pub fn nil(&self) -> Schema {
        self.builtin("nil", "null or undefined", Value::is_nullish, |v| format!("{v} == null"))
    }

    pub fn finite(&self) -> Schema {
        self.builtin(
            "finite",
            "finite number",
            |v| v.as_f64().is_some_and(f64::is_finite),
            |v| format!("Number.isFinite({v})"),
        )
    }

    pub fn safe_integer(&self) -> Schema {
        self.builtin(
            "safeInteger",
            "safe integer",
            |v| {
                v.as_f64()
                    .is_some_and(|n| n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER)
            },
            |v| format!("Number.isSafeInteger({v})"),
        )
    }

    pub fn positive(&self) -> Schema {
        self.builtin(
            "positive",
            "positive number",
            |v| v.as_f64().is_some_and(|n| n > 0.0),
            |v| format!("{v} > 0"),
        )
    }

    pub fn negative(&self) -> Schema {
        self.builtin(
            "negative",
            "negative number",
            |v| v.as_f64().is_some_and(|n| n < 0.0),
            |v| format!("{v} < 0"),
        )
    }

    pub fn min(&self, min: f64) -> Schema {
        let text = Value::Number(min).to_string();
        self.builtin(
            &format!("min({text})"),
            &format!("number >= {text}"),
            move |v| v.as_f64().is_some_and(|n| n >= min),
            move |v| format!("{v} >= {text}"),
        )
    }

    pub fn max(&self, max: f64) -> Schema {
        let text = Value::Number(max).to_string();
        self.builtin(
            &format!("max({text})"),
            &format!("number <= {text}"),
            move |v| v.as_f64().is_some_and(|n| n <= max),
            move |v| format!("{v} <= {text}"),
        )
    }

    /// Strings (in chars) and arrays at least `len` long.
    pub fn min_length(&self, len: usize) -> Schema {
        self.builtin(
            &format!("minLength({len})"),
            &format!("length >= {len}"),
            move |v| v.length().is_some_and(|n| n >= len),
            move |v| format!("{v}.length >= {len}"),
        )
    }

    pub fn max_length(&self, len: usize) -> Schema {
        self.builtin(
            &format!("maxLength({len})"),
            &format!("length <= {len}"),
            move |v| v.length().is_some_and(|n| n <= len),
            move |v| format!("{v}.length <= {len}"),
        )
    }

    /// Strings matching a regular expression.
    pub fn pattern(&self, pattern: &str) -> Result<Schema, SchemaError> {
        let regex = Regex::new(pattern)?;
        let source = pattern.to_string();
        Ok(self.builtin(
            &format!("/{pattern}/"),
            &format!("string matching /{pattern}/"),
            move |v| v.as_str().is_some_and(|s| regex.is_match(s)),
            move |v| format!("typeof {v} === \"string\" && /{source}/.test({v})"),
        ))
    }

    /// Caller-supplied predicate, explained as `failed <name>`.
    pub fn test<P>(&self, name: &str, predicate: P) -> Schema
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        let label = name.to_string();
        let explain = self.settings().is_explain();
        Schema::function(name, move || {
            let predicate = predicate.clone();
            let descriptor = Descriptor::new(Check::named(&label, move |value, _| predicate(value)));
            if !explain {
                return descriptor;
            }
            let message = format!("failed {label}");
            let rendered = quote(&message);
            descriptor.with_handle_error(ErrorHandler::new(
                move |_, path, ctx| {
                    ctx.record(Explanation::Custom {
                        path: path.clone(),
                        message: message.clone(),
                    })
                },
                move |_, c| format!("{c}.explanations.push({rendered})"),
            ))
        })
    }

    /// Arrays whose every element satisfies `element`.
    ///
    /// The element schema is compiled once into a sub-validator; each use
    /// of the returned schema registers it in a fresh `array_of` slot.
    pub fn array_of(&self, element: &Schema) -> Result<Schema, SchemaError> {
        let program = Arc::new(self.compile_program(element)?);
        let quartet = self.clone();
        let explain = self.settings().is_explain();
        let label = element.to_string();
        Ok(Schema::function(format!("array_of({label})"), move || {
            let (slot, prepare) =
                quartet.to_context("array_of", SlotInit::Validator(program.clone()));
            let name = slot.name().to_string();
            let check = {
                let slot = slot.clone();
                let name = name.clone();
                Check::new(
                    move |value, ctx| ctx.call_validator_each(&slot, value),
                    move |v, c| format!("Array.isArray({v}) && {v}.every({c}.{name})"),
                )
            };
            let descriptor = Descriptor::new(check).with_prepare(prepare);
            if !explain {
                return descriptor;
            }
            let expected = format!("array of {label}");
            descriptor.with_handle_error(ErrorHandler::new(
                move |value, path, ctx| {
                    if value.as_array().is_none() {
                        ctx.record(Explanation::Mismatch {
                            path: path.clone(),
                            expected: "array".to_string(),
                            actual: value.to_string(),
                        });
                    } else if ctx.forward_explanations(&slot, path) == 0 {
                        ctx.record(Explanation::Mismatch {
                            path: path.clone(),
                            expected: expected.clone(),
                            actual: value.to_string(),
                        });
                    }
                },
                move |v, c| format!("{c}.explanations.push(...{c}.{name}.explanations, {v})"),
            ))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::Path;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn check(schema: &Schema, value: serde_json::Value) -> bool {
        Quartet::fast().compile(schema).unwrap().is_valid(&value.into())
    }

    #[test]
    fn test_type_methods() {
        let q = Quartet::fast();
        assert!(check(&q.string(), json!("a")));
        assert!(!check(&q.string(), json!(1)));
        assert!(check(&q.number(), json!(1.5)));
        assert!(check(&q.boolean(), json!(false)));
        assert!(check(&q.null(), json!(null)));
        assert!(check(&q.any(), json!({"x": 1})));
        assert!(!check(&q.never(), json!(null)));
        let validator = q.compile(&q.undefined()).unwrap();
        assert!(validator.is_valid(&Value::Undefined));
        assert!(!validator.is_valid(&Value::Null));
        let nil = q.compile(&q.nil()).unwrap();
        assert!(nil.is_valid(&Value::Undefined) && nil.is_valid(&Value::Null));
        assert!(!nil.is_valid(&Value::from(0)));
    }

    #[test]
    fn test_number_methods() {
        let q = Quartet::fast();
        assert!(check(&q.finite(), json!(1e300)));
        assert!(!Quartet::fast()
            .compile(&q.finite())
            .unwrap()
            .is_valid(&Value::Number(f64::INFINITY)));
        assert!(check(&q.safe_integer(), json!(9007199254740991_i64)));
        assert!(!check(&q.safe_integer(), json!(1.5)));
        assert!(check(&q.positive(), json!(1)));
        assert!(!check(&q.positive(), json!(0)));
        assert!(check(&q.negative(), json!(-1)));
        assert!(check(&q.min(2.0), json!(2)));
        assert!(!check(&q.min(2.0), json!(1)));
        assert!(check(&q.max(2.0), json!(2)));
        assert!(!check(&q.max(2.0), json!("1")));
    }

    #[test]
    fn test_length_methods() {
        let q = Quartet::fast();
        assert!(check(&q.min_length(2), json!("ab")));
        assert!(check(&q.min_length(2), json!([1, 2])));
        assert!(!check(&q.min_length(2), json!("a")));
        assert!(check(&q.max_length(1), json!("é")));
        assert!(!check(&q.max_length(1), json!(5)));
    }

    #[test]
    fn test_pattern() {
        let q = Quartet::fast();
        let schema = q.pattern("^[a-z]+$").unwrap();
        assert!(check(&schema, json!("abc")));
        assert!(!check(&schema, json!("ABC")));
        assert!(!check(&schema, json!(1)));
        assert!(matches!(q.pattern("("), Err(SchemaError::InvalidPattern(_))));
    }

    #[test]
    fn test_custom_predicate_is_explained() {
        let q = Quartet::explain();
        let even = q.test("even", |v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0));
        let validator = q.compile(&even).unwrap();
        assert!(validator.is_valid(&4.into()));
        assert_eq!(
            validator.explain(&3.into()).explanations,
            vec![Explanation::Custom {
                path: Path::root(),
                message: "failed even".to_string(),
            }]
        );
    }

    #[test]
    fn test_array_of_reports_failing_index() {
        let q = Quartet::explain();
        let schema = q.array_of(&q.string()).unwrap();
        let validator = q.compile(&schema).unwrap();
        assert!(validator.is_valid(&json!(["a", "b"]).into()));
        assert!(validator.is_valid(&json!([]).into()));

        let output = validator.explain(&json!(["a", 2]).into());
        assert!(!output.is_valid);
        assert_eq!(output.explanations.len(), 1);
        assert_eq!(output.explanations[0].path().to_string(), "value[1]");

        let output = validator.explain(&json!("a").into());
        assert_eq!(
            output.explanations,
            vec![Explanation::Mismatch {
                path: Path::root(),
                expected: "array".to_string(),
                actual: "\"a\"".to_string(),
            }]
        );
    }

    #[test]
    fn test_explain_mode_handlers_only() {
        let fast = Quartet::fast().compile(&Quartet::fast().string()).unwrap();
        assert!(fast.is_pure());
        let explain = Quartet::explain();
        let validator = explain.compile(&explain.string()).unwrap();
        assert!(!validator.is_pure());
        assert_eq!(
            validator.explain(&json!(1).into()).explanations,
            vec![Explanation::Mismatch {
                path: Path::root(),
                expected: "string".to_string(),
                actual: "1".to_string(),
            }]
        );
    }
}
