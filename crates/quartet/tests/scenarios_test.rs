//! End-to-end validation scenarios

use pretty_assertions::assert_eq;
use quartet::{
    Check, Descriptor, Explanation, ObjectSchema, Path, Quartet, RejectedAlternative, Schema,
    SchemaError, Value,
};
use serde_json::json;

fn value(json: serde_json::Value) -> Value {
    json.into()
}

fn is_string() -> Schema {
    Schema::function("isString", || {
        Descriptor::new(Check::named("isString", |v, _| v.as_str().is_some()))
    })
}

fn path(keys: &[&str]) -> Path {
    let mut path = Path::root();
    for key in keys {
        path.push_key(*key);
    }
    path
}

#[test]
fn object_with_valid_property() {
    let q = Quartet::explain();
    let validator = q
        .compile(&ObjectSchema::new().field("name", q.string()).into())
        .unwrap();
    let output = validator.explain(&value(json!({"name": "a"})));
    assert!(output.is_valid);
    assert!(output.explanations.is_empty());
}

#[test]
fn object_with_invalid_property_names_it() {
    let q = Quartet::explain();
    let validator = q
        .compile(&ObjectSchema::new().field("name", q.string()).into())
        .unwrap();
    let candidate = value(json!({"name": 1}));
    assert!(!validator.is_valid(&candidate));
    let output = validator.explain(&candidate);
    assert_eq!(
        output.explanations,
        vec![Explanation::Mismatch {
            path: path(&["name"]),
            expected: "string".to_string(),
            actual: "1".to_string(),
        }]
    );
    assert_eq!(
        output.explanations[0].to_string(),
        "value.name: expected string, got 1"
    );
}

#[test]
fn rest_properties_are_checked() {
    let q = Quartet::explain();
    let schema = ObjectSchema::new()
        .field("id", q.number())
        .rest(q.string())
        .into();
    let validator = q.compile(&schema).unwrap();
    assert!(validator.is_valid(&value(json!({"id": 1, "a": "x", "b": "y"}))));

    let output = validator.explain(&value(json!({"id": 1, "a": 2})));
    assert!(!output.is_valid);
    assert_eq!(
        output.explanations,
        vec![Explanation::Mismatch {
            path: path(&["a"]),
            expected: "string".to_string(),
            actual: "2".to_string(),
        }]
    );
}

#[test]
fn variant_of_constants_names_both_alternatives() {
    let q = Quartet::explain();
    let schema = Schema::variant([Schema::from("a"), Schema::from("b")]);
    let validator = q.compile(&schema).unwrap();
    assert!(validator.is_valid(&value(json!("b"))));

    let output = validator.explain(&value(json!("c")));
    assert!(!output.is_valid);
    assert_eq!(
        output.explanations,
        vec![Explanation::NoVariantMatched {
            path: Path::root(),
            actual: "\"c\"".to_string(),
            alternatives: vec![
                RejectedAlternative {
                    schema: "\"a\"".to_string(),
                    explanations: vec![Explanation::NotEqual {
                        path: Path::root(),
                        expected: "\"a\"".to_string(),
                        actual: "\"c\"".to_string(),
                    }],
                },
                RejectedAlternative {
                    schema: "\"b\"".to_string(),
                    explanations: vec![Explanation::NotEqual {
                        path: Path::root(),
                        expected: "\"b\"".to_string(),
                        actual: "\"c\"".to_string(),
                    }],
                },
            ],
        }]
    );
}

#[test]
fn null_object_fails_before_property_checks() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let q = Quartet::explain();
    let counted = q.test("counted", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });
    let validator = q
        .compile(&ObjectSchema::new().field("x", counted).into())
        .unwrap();

    let output = validator.explain(&Value::Null);
    assert!(!output.is_valid);
    assert_eq!(
        output.explanations,
        vec![Explanation::NotAnObject {
            path: Path::root(),
            actual: "null".to_string(),
        }]
    );
    assert!(!validator.is_valid(&Value::Undefined));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(validator.is_valid(&value(json!({}))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn nested_object_paths() {
    let q = Quartet::explain();
    let inner = ObjectSchema::new().field("my-key", q.number());
    let schema = ObjectSchema::new()
        .field("outer", inner)
        .field("tags", q.array_of(&q.string()).unwrap())
        .into();
    let validator = q.compile(&schema).unwrap();

    let output = validator.explain(&value(json!({"outer": {"my-key": "x"}, "tags": []})));
    assert_eq!(
        output.explanations[0].path().to_string(),
        r#"value.outer["my-key"]"#
    );

    let output = validator.explain(&value(json!({"outer": {"my-key": 1}, "tags": ["a", 3]})));
    assert_eq!(output.explanations[0].path().to_string(), "value.tags[1]");

    let output = validator.explain(&value(json!({"tags": []})));
    assert_eq!(
        output.explanations,
        vec![Explanation::NotAnObject {
            path: path(&["outer"]),
            actual: "undefined".to_string(),
        }]
    );
}

#[test]
fn user_function_without_handler_stays_pure() {
    let q = Quartet::explain();
    let validator = q
        .compile(&Schema::and([is_string(), is_string()]))
        .unwrap();
    assert!(validator.is_pure());
    let output = validator.explain(&value(json!(1)));
    assert_eq!(
        output.explanations,
        vec![Explanation::Rejected { path: Path::root() }]
    );
}

#[test]
fn omit_without_rest_is_a_configuration_error() {
    let q = Quartet::fast();
    let schema = ObjectSchema::new()
        .field("a", q.string())
        .omit(["b"])
        .into();
    assert_eq!(
        q.compile(&schema).unwrap_err(),
        SchemaError::OmitWithoutRest {
            keys: vec!["b".to_string()],
            at: "value".to_string(),
        }
    );
    assert_eq!(
        q.compile(&schema).unwrap_err().to_string(),
        "omit list [b] given without a rest schema at value"
    );
}

#[test]
fn omit_without_rest_reports_where_it_occurred() {
    let q = Quartet::fast();
    let broken = ObjectSchema::new().omit(["secret"]);
    let schema: Schema = ObjectSchema::new()
        .field(
            "meta",
            Schema::variant([q.null(), Schema::from(ObjectSchema::new().field("inner", broken))]),
        )
        .into();
    assert_eq!(
        q.compile(&schema).unwrap_err(),
        SchemaError::OmitWithoutRest {
            keys: vec!["secret".to_string()],
            at: "value.meta.inner".to_string(),
        }
    );
}
