//! Schema tree and Function-schema descriptors
//!
//! Schemas are built explicitly with the constructors below; there is no
//! shape guessing at compile time.

use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use indexmap::IndexMap;
use quartet_value::Value;

use crate::constant::Literal;
use crate::context::{Context, Preparation};
use crate::explanation::Path;

pub type CheckFn = dyn Fn(&Value, &mut Context<'_>) -> bool + Send + Sync;
/// Renders a fragment from the value expression and the context expression.
pub type RenderFn = dyn Fn(&str, &str) -> String + Send + Sync;
pub type ErrorFn = dyn Fn(&Value, &Path, &mut Context<'_>) + Send + Sync;

// =============================================================================
// Descriptor
// =============================================================================

/// Executable predicate together with its textual form.
#[derive(Clone)]
pub struct Check {
    eval: Arc<CheckFn>,
    render: Arc<RenderFn>,
}

impl Check {
    pub fn new<E, R>(eval: E, render: R) -> Self
    where
        E: Fn(&Value, &mut Context<'_>) -> bool + Send + Sync + 'static,
        R: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self {
            eval: Arc::new(eval),
            render: Arc::new(render),
        }
    }

    /// A check rendered as a call: `name(value)`.
    pub fn named<E>(name: &str, eval: E) -> Self
    where
        E: Fn(&Value, &mut Context<'_>) -> bool + Send + Sync + 'static,
    {
        let name = name.to_string();
        Self::new(eval, move |v, _| format!("{name}({v})"))
    }

    pub fn eval(&self, value: &Value, ctx: &mut Context<'_>) -> bool {
        (self.eval)(value, ctx)
    }

    pub fn render(&self, value: &str, ctx: &str) -> String {
        (self.render)(value, ctx)
    }
}

impl Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Check({})", self.render("value", "ctx"))
    }
}

/// Statement recording explanations for a failed check.
#[derive(Clone)]
pub struct ErrorHandler {
    record: Arc<ErrorFn>,
    render: Arc<RenderFn>,
}

impl ErrorHandler {
    pub fn new<E, R>(record: E, render: R) -> Self
    where
        E: Fn(&Value, &Path, &mut Context<'_>) + Send + Sync + 'static,
        R: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self {
            record: Arc::new(record),
            render: Arc::new(render),
        }
    }

    pub fn record(&self, value: &Value, path: &Path, ctx: &mut Context<'_>) {
        (self.record)(value, path, ctx)
    }

    pub fn render(&self, value: &str, ctx: &str) -> String {
        (self.render)(value, ctx)
    }
}

impl Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorHandler({})", self.render("value", "ctx"))
    }
}

/// What a Function schema contributes to the compiled code.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub check: Check,
    /// Direct negation, used instead of `!(check)` when present
    pub not: Option<Check>,
    /// Presence makes the compiled node impure
    pub handle_error: Option<ErrorHandler>,
    pub prepare: Option<Preparation>,
}

impl Descriptor {
    pub fn new(check: Check) -> Self {
        Self {
            check,
            not: None,
            handle_error: None,
            prepare: None,
        }
    }

    pub fn with_not(mut self, not: Check) -> Self {
        self.not = Some(not);
        self
    }

    pub fn with_handle_error(mut self, handler: ErrorHandler) -> Self {
        self.handle_error = Some(handler);
        self
    }

    pub fn with_prepare(mut self, prepare: Preparation) -> Self {
        self.prepare = Some(prepare);
        self
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A named, zero-argument descriptor factory.
///
/// The factory runs once per occurrence in the schema tree, so descriptors
/// that allocate context slots get fresh ones every time.
#[derive(Clone)]
pub struct FunctionSchema {
    name: Arc<str>,
    factory: Arc<dyn Fn() -> Descriptor + Send + Sync>,
}

impl FunctionSchema {
    pub fn new<F>(name: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: Fn() -> Descriptor + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> Descriptor {
        (self.factory)()
    }
}

impl Debug for FunctionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionSchema").field(&self.name).finish()
    }
}

/// Declared properties plus the optional `rest` and `omit` markers.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    properties: IndexMap<String, Schema>,
    rest: Option<Box<Schema>>,
    omit: Vec<String>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.properties.insert(key.into(), schema.into());
        self
    }

    /// Schema every undeclared property must satisfy.
    pub fn rest(mut self, schema: impl Into<Schema>) -> Self {
        self.rest = Some(Box::new(schema.into()));
        self
    }

    /// Extra property names excluded from rest validation.
    pub fn omit<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn properties(&self) -> &IndexMap<String, Schema> {
        &self.properties
    }

    pub fn rest_schema(&self) -> Option<&Schema> {
        self.rest.as_deref()
    }

    pub fn omitted(&self) -> &[String] {
        &self.omit
    }
}

impl<K: Into<String>, S: Into<Schema>> FromIterator<(K, S)> for ObjectSchema {
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ObjectSchema::new(), |object, (k, s)| object.field(k, s))
    }
}

#[derive(Debug, Clone)]
pub enum Schema {
    Function(FunctionSchema),
    Constant(Literal),
    Object(ObjectSchema),
    And(Arc<[Schema]>),
    /// Clones share the alternatives, and with them the deferred
    /// sub-validator inside one compilation unit.
    Variant(Arc<[Schema]>),
}

impl Schema {
    pub fn function<F>(name: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: Fn() -> Descriptor + Send + Sync + 'static,
    {
        Schema::Function(FunctionSchema::new(name, factory))
    }

    pub fn constant(literal: impl Into<Literal>) -> Self {
        Schema::Constant(literal.into())
    }

    pub fn object(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }

    pub fn and(schemas: impl IntoIterator<Item = Schema>) -> Self {
        Schema::And(schemas.into_iter().collect())
    }

    pub fn variant(schemas: impl IntoIterator<Item = Schema>) -> Self {
        Schema::Variant(schemas.into_iter().collect())
    }
}

impl From<FunctionSchema> for Schema {
    fn from(value: FunctionSchema) -> Self {
        Schema::Function(value)
    }
}

impl From<Literal> for Schema {
    fn from(value: Literal) -> Self {
        Schema::Constant(value)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(value: ObjectSchema) -> Self {
        Schema::Object(value)
    }
}

impl From<&str> for Schema {
    fn from(value: &str) -> Self {
        Schema::Constant(value.into())
    }
}

fn join(f: &mut fmt::Formatter<'_>, schemas: &[Schema], sep: &str) -> fmt::Result {
    for (i, schema) in schemas.iter().enumerate() {
        if i != 0 {
            write!(f, "{sep}")?;
        }
        match schema {
            Schema::And(_) | Schema::Variant(_) if schemas.len() > 1 => write!(f, "({schema})")?,
            _ => write!(f, "{schema}")?,
        }
    }
    Ok(())
}

/// Short label, used for rejected variant alternatives.
impl Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Function(function) => write!(f, "{}", function.name()),
            Schema::Constant(literal) => write!(f, "{literal}"),
            Schema::Object(object) => {
                let mut names: Vec<String> = object.properties.keys().cloned().collect();
                if object.rest.is_some() {
                    names.push("...rest".to_string());
                }
                write!(f, "{{{}}}", names.join(", "))
            }
            Schema::And(schemas) => join(f, schemas, " & "),
            Schema::Variant(schemas) if schemas.is_empty() => write!(f, "never"),
            Schema::Variant(schemas) => join(f, schemas, " | "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_string() -> Schema {
        Schema::function("isString", || {
            Descriptor::new(Check::named("isString", |v, _| v.as_str().is_some()))
        })
    }

    #[test]
    fn test_labels() {
        assert_eq!(is_string().to_string(), "isString");
        assert_eq!(Schema::constant("a").to_string(), "\"a\"");
        assert_eq!(Schema::constant(Literal::Null).to_string(), "null");
        let object = ObjectSchema::new()
            .field("id", is_string())
            .rest(is_string());
        assert_eq!(Schema::object(object).to_string(), "{id, ...rest}");
        assert_eq!(
            Schema::variant([Schema::constant("a"), Schema::constant("b")]).to_string(),
            r#""a" | "b""#
        );
        assert_eq!(Schema::variant([]).to_string(), "never");
        assert_eq!(
            Schema::and([is_string(), Schema::variant([Schema::from("a"), Schema::from("b")])]).to_string(),
            r#"isString & ("a" | "b")"#
        );
    }

    #[test]
    fn test_descriptor_builder() {
        let descriptor = Descriptor::new(Check::named("isString", |v, _| v.as_str().is_some()))
            .with_not(Check::new(|v, _| v.as_str().is_none(), |v, _| {
                format!("typeof {v} !== \"string\"")
            }));
        assert_eq!(descriptor.check.render("value.a", "ctx"), "isString(value.a)");
        let not = descriptor.not.expect("negation");
        assert_eq!(not.render("value.a", "ctx"), "typeof value.a !== \"string\"");
        assert!(descriptor.handle_error.is_none());
    }

    #[test]
    fn test_object_schema_from_iter_keeps_order() {
        let object: ObjectSchema = [("b", is_string()), ("a", is_string())].into_iter().collect();
        let keys: Vec<_> = object.properties().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(object.rest_schema().is_none());
        assert!(object.omitted().is_empty());
    }

    #[test]
    fn test_variant_clones_share_alternatives() {
        let variant = Schema::variant([Schema::from("a"), Schema::from("b")]);
        let clone = variant.clone();
        let (Schema::Variant(a), Schema::Variant(b)) = (&variant, &clone) else {
            panic!("not a variant");
        };
        assert!(Arc::ptr_eq(a, b));
    }
}
