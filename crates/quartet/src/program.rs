//! Compiled statement tree
//!
//! The compiler emits a [`Block`] of flat statements. The same tree is run
//! directly against a candidate value and rendered to source text for
//! introspection. Rendering and running must agree statement for statement.

use std::fmt;

use quartet_value::Value;

use crate::context::{Context, Preparation, Slot, SlotKey};
use crate::explanation::{Explanation, Path, RejectedAlternative};
use crate::schema::{Check, ErrorHandler};
use crate::utils::{add_tabs, key_accessor};

/// Name of the context parameter in rendered code.
pub const CTX: &str = "ctx";
/// Name of the candidate parameter in rendered code.
pub const VALUE: &str = "value";

// =============================================================================
// ValueExpr
// =============================================================================

/// Where the value a statement inspects comes from.
#[derive(Debug, Clone)]
pub enum ValueExpr {
    Input,
    Property(Box<ValueExpr>, String),
    /// Current element of an enclosing rest loop.
    Element {
        object: Box<ValueExpr>,
        elem: SlotKey,
        key: SlotKey,
    },
}

impl ValueExpr {
    pub fn property(&self, key: &str) -> ValueExpr {
        ValueExpr::Property(Box::new(self.clone()), key.to_string())
    }

    pub fn resolve<'v>(&self, input: &'v Value, ctx: &Context<'v>) -> &'v Value {
        match self {
            ValueExpr::Input => input,
            ValueExpr::Property(object, key) => object.resolve(input, ctx).get(key),
            ValueExpr::Element { elem, .. } => ctx.element(elem),
        }
    }

    /// Runtime location, used for explanation paths.
    pub fn path<'v>(&self, input: &'v Value, ctx: &Context<'v>) -> Path {
        match self {
            ValueExpr::Input => Path::root(),
            ValueExpr::Property(object, key) => {
                let mut path = object.path(input, ctx);
                path.push_key(key.as_str());
                path
            }
            ValueExpr::Element { object, key, .. } => {
                let mut path = object.path(input, ctx);
                let current = ctx.current_key(key).unwrap_or_default();
                let index = match object.resolve(input, ctx) {
                    Value::Array(_) => current.parse::<usize>().ok(),
                    _ => None,
                };
                match index {
                    Some(index) => path.push_index(index),
                    None => path.push_key(current),
                }
                path
            }
        }
    }

    pub fn render(&self) -> String {
        match self {
            ValueExpr::Input => VALUE.to_string(),
            ValueExpr::Property(object, key) => format!("{}{}", object.render(), key_accessor(key)),
            ValueExpr::Element { elem, .. } => format!("{CTX}.{}", elem.name()),
        }
    }

    /// Static location: `value.name`, with `*` standing for rest elements.
    pub fn key_path(&self) -> String {
        match self {
            ValueExpr::Input => VALUE.to_string(),
            ValueExpr::Property(object, key) => {
                format!("{}{}", object.key_path(), key_accessor(key))
            }
            ValueExpr::Element { object, .. } => format!("{}.*", object.key_path()),
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

/// One alternative of an [`Stmt::AnyOf`].
#[derive(Debug, Clone)]
pub struct Branch {
    pub label: String,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct RestLoop {
    pub subject: ValueExpr,
    pub keys: SlotKey,
    pub index: SlotKey,
    pub key: SlotKey,
    pub elem: SlotKey,
    /// Exclusion set; absent when nothing is excluded
    pub omit: Option<SlotKey>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// Exit with `false` when `check` fails, running `on_fail` first.
    Guard {
        subject: ValueExpr,
        check: Check,
        not: Option<Check>,
        on_fail: Option<ErrorHandler>,
    },
    /// Exit with `false` on `null` or `undefined`.
    NullGuard { subject: ValueExpr },
    /// Unconditional exit with `false`.
    Reject,
    RestLoop(Box<RestLoop>),
    /// Succeeds as soon as one branch falls through.
    AnyOf {
        subject: ValueExpr,
        branches: Vec<Branch>,
        explain: bool,
    },
}

impl Stmt {
    fn run<'v>(&self, input: &'v Value, ctx: &mut Context<'v>) -> bool {
        match self {
            Stmt::Guard {
                subject,
                check,
                not,
                on_fail,
            } => {
                let value = subject.resolve(input, ctx);
                let failed = match not {
                    Some(not) => not.eval(value, ctx),
                    None => !check.eval(value, ctx),
                };
                if failed {
                    if let Some(handler) = on_fail {
                        let path = subject.path(input, ctx);
                        handler.record(value, &path, ctx);
                    }
                    return false;
                }
                true
            }
            Stmt::NullGuard { subject } => !subject.resolve(input, ctx).is_nullish(),
            Stmt::Reject => false,
            Stmt::RestLoop(rest) => rest.run(input, ctx),
            Stmt::AnyOf {
                subject,
                branches,
                explain,
            } => {
                let value = subject.resolve(input, ctx);
                if !explain {
                    return branches.iter().any(|branch| branch.body.run(value, ctx));
                }
                let mark = ctx.explanation_count();
                let mut alternatives = Vec::with_capacity(branches.len());
                for branch in branches {
                    if branch.body.run(value, ctx) {
                        ctx.truncate_explanations(mark);
                        return true;
                    }
                    alternatives.push(RejectedAlternative {
                        schema: branch.label.clone(),
                        explanations: ctx.drain_explanations(mark),
                    });
                }
                ctx.record(Explanation::NoVariantMatched {
                    path: subject.path(input, ctx),
                    actual: value.to_string(),
                    alternatives,
                });
                false
            }
        }
    }

    fn render(&self, indent: usize) -> String {
        match self {
            Stmt::Guard {
                subject,
                check,
                not,
                on_fail,
            } => {
                let v = subject.render();
                let cond = match not {
                    Some(not) => not.render(&v, CTX),
                    None => format!("!({})", check.render(&v, CTX)),
                };
                match on_fail {
                    None => format!("if ({cond}) return false"),
                    Some(handler) => exit_with(&cond, &handler.render(&v, CTX), indent),
                }
            }
            Stmt::NullGuard { subject } => format!("if ({} == null) return false", subject.render()),
            Stmt::Reject => "return false".to_string(),
            Stmt::RestLoop(rest) => rest.render(indent),
            Stmt::AnyOf {
                subject,
                branches,
                explain,
            } => {
                let v = subject.render();
                let pad = " ".repeat(indent);
                let mut lines = Vec::new();
                for branch in branches {
                    let body = branch.body.render(indent);
                    let body = if body.is_empty() {
                        String::new()
                    } else {
                        format!("{body}\n")
                    };
                    lines.push(format!(
                        "if ((({VALUE}) => {{\n{body}{pad}return true\n}})({v})) return true"
                    ));
                }
                if *explain {
                    let labels: Vec<_> = branches.iter().map(|b| b.label.as_str()).collect();
                    lines.push(format!("{CTX}.explain({v}, {labels:?})"));
                }
                lines.push("return false".to_string());
                lines.join("\n")
            }
        }
    }
}

fn exit_with(cond: &str, handler: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    format!(
        "if ({cond}) {{\n{}\n{pad}return false\n}}",
        add_tabs(handler, indent)
    )
}

impl RestLoop {
    fn run<'v>(&self, input: &'v Value, ctx: &mut Context<'v>) -> bool {
        let object = self.subject.resolve(input, ctx);
        ctx.set(&self.keys, Slot::Keys(object.own_keys()));
        let len = ctx.keys_len(&self.keys);
        let mut i = 0;
        while i < len {
            ctx.set(&self.index, Slot::Index(i));
            let Some(key) = ctx.key_at(&self.keys, i) else {
                break;
            };
            i += 1;
            let excluded = self
                .omit
                .as_ref()
                .and_then(|omit| ctx.key_set(omit))
                .is_some_and(|set| set.contains(&key));
            if excluded {
                continue;
            }
            let elem = object.get(&key);
            ctx.set(&self.key, Slot::Key(key));
            ctx.set(&self.elem, Slot::Element(elem));
            if !self.body.run(input, ctx) {
                return false;
            }
        }
        true
    }

    fn render(&self, indent: usize) -> String {
        let v = self.subject.render();
        let pad = " ".repeat(indent);
        let keys = format!("{CTX}.{}", self.keys.name());
        let i = format!("{CTX}.{}", self.index.name());
        let key = format!("{CTX}.{}", self.key.name());
        let elem = format!("{CTX}.{}", self.elem.name());
        let mut out = format!("{keys} = Object.keys({v})\n");
        out.push_str(&format!("for ({i} = 0; {i} < {keys}.length; {i}++) {{\n"));
        out.push_str(&format!("{pad}{key} = {keys}[{i}]\n"));
        if let Some(omit) = &self.omit {
            out.push_str(&format!(
                "{pad}if ({CTX}.{}[{key}] === true) continue\n",
                omit.name()
            ));
        }
        out.push_str(&format!("{pad}{elem} = {v}[{key}]\n"));
        let body = self.body.render(indent);
        if !body.is_empty() {
            out.push_str(&body);
            out.push('\n');
        }
        out.push('}');
        out
    }
}

// =============================================================================
// Block
// =============================================================================

/// Statements run in order; the block falls through (`true`) unless one
/// of them exits.
#[derive(Debug, Clone, Default)]
pub struct Block(pub Vec<Stmt>);

impl Block {
    pub fn run<'v>(&self, input: &'v Value, ctx: &mut Context<'v>) -> bool {
        self.0.iter().all(|stmt| stmt.run(input, ctx))
    }

    /// Render every statement, indented one unit.
    pub fn render(&self, indent: usize) -> String {
        self.0
            .iter()
            .map(|stmt| add_tabs(&stmt.render(indent), indent))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compiled code for one schema node.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub code: Block,
    /// `true` iff the code can never append an explanation
    pub pure: bool,
}

impl Fragment {
    pub fn empty() -> Self {
        Self {
            code: Block::default(),
            pure: true,
        }
    }

    pub fn source(&self, indent: usize) -> String {
        self.code.render(indent)
    }
}

// =============================================================================
// Program
// =============================================================================

/// A Function schema compiled somewhere in a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSite {
    /// Static location such as `value.tags.*`
    pub key_path: String,
    /// Rendered check
    pub source: String,
}

/// Self-contained compiled validator: code plus the preparations its
/// context needs.
pub struct Program {
    body: Block,
    preparations: Vec<Preparation>,
    pure: bool,
    source: String,
    functions: Vec<FunctionSite>,
}

impl Program {
    pub(crate) fn new(
        fragment: Fragment,
        preparations: Vec<Preparation>,
        functions: Vec<FunctionSite>,
        indent: usize,
    ) -> Self {
        let pad = " ".repeat(indent);
        let source = if fragment.code.is_empty() {
            format!("({VALUE}) => {{\n{pad}return true\n}}")
        } else {
            let body = fragment.source(indent);
            format!("({VALUE}) => {{\n{body}\n{pad}return true\n}}")
        };
        Self {
            body: fragment.code,
            preparations,
            pure: fragment.pure,
            source,
            functions,
        }
    }

    /// Run against a fresh, fully prepared context.
    pub fn run(&self, value: &Value) -> (bool, Vec<Explanation>) {
        let mut ctx = Context::prepare(&self.preparations);
        let valid = self.run_in(value, &mut ctx);
        (valid, ctx.into_explanations())
    }

    /// Run against a context prepared from [`Program::preparations`].
    ///
    /// A passing run leaves no explanations behind, so the same context can
    /// serve further runs until one fails.
    pub fn run_in<'v>(&self, value: &'v Value, ctx: &mut Context<'v>) -> bool {
        self.body.run(value, ctx)
    }

    pub fn check(&self, value: &Value) -> bool {
        self.run(value).0
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn preparations(&self) -> &[Preparation] {
        &self.preparations
    }

    pub fn functions(&self) -> &[FunctionSite] {
        &self.functions
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("pure", &self.pure)
            .field("slots", &self.preparations.len())
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quartet;
    use crate::context::SlotInit;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn is_string() -> Check {
        Check::named("isString", |v, _| v.as_str().is_some())
    }

    fn guard(subject: ValueExpr) -> Stmt {
        Stmt::Guard {
            subject,
            check: is_string(),
            not: None,
            on_fail: None,
        }
    }

    #[test]
    fn test_render_guard_and_null_guard() {
        let block = Block(vec![
            Stmt::NullGuard {
                subject: ValueExpr::Input,
            },
            guard(ValueExpr::Input.property("my-key")),
        ]);
        assert_eq!(
            block.render(2),
            "  if (value == null) return false\n  if (!(isString(value[\"my-key\"]))) return false"
        );
    }

    #[test]
    fn test_render_impure_guard() {
        let stmt = Stmt::Guard {
            subject: ValueExpr::Input.property("a"),
            check: is_string(),
            not: None,
            on_fail: Some(ErrorHandler::new(|_, _, _| {}, |v, c| format!("{c}.fail({v})"))),
        };
        assert_eq!(
            stmt.render(2),
            "if (!(isString(value.a))) {\n  ctx.fail(value.a)\n  return false\n}"
        );
    }

    #[test]
    fn test_rest_loop_runs_and_skips_excluded() {
        let quartet = Quartet::fast();
        let (elem, p1) = quartet.to_context("elem", SlotInit::Undefined);
        let (keys, p2) = quartet.to_context("keys", SlotInit::Undefined);
        let (key, p3) = quartet.to_context("key", SlotInit::Undefined);
        let (index, p4) = quartet.to_context("i", SlotInit::Index(0));
        let (omit, p5) = quartet.to_context(
            "omitkeys",
            SlotInit::KeySet(std::sync::Arc::new(crate::utils::to_dict(["id"]))),
        );
        let element = ValueExpr::Element {
            object: Box::new(ValueExpr::Input),
            elem: elem.clone(),
            key: key.clone(),
        };
        let rest = RestLoop {
            subject: ValueExpr::Input,
            keys,
            index,
            key,
            elem,
            omit: Some(omit),
            body: Block(vec![guard(element)]),
        };
        let block = Block(vec![Stmt::RestLoop(Box::new(rest))]);
        let preparations = [p1, p2, p3, p4, p5];

        let valid: Value = json!({"id": 1, "a": "x"}).into();
        let mut ctx = Context::prepare(&preparations);
        assert!(block.run(&valid, &mut ctx));

        let invalid: Value = json!({"id": 1, "a": 2}).into();
        let mut ctx = Context::prepare(&preparations);
        assert!(!block.run(&invalid, &mut ctx));
    }

    #[test]
    fn test_empty_program_source() {
        let program = Program::new(Fragment::empty(), Vec::new(), Vec::new(), 2);
        assert_eq!(program.source(), "(value) => {\n  return true\n}");
        assert!(program.check(&Value::Undefined));
        assert!(program.is_pure());
    }
}
