//! Schema compiler
//!
//! Translates a schema tree into a [`Block`] and tracks purity on the way:
//! a fragment is pure iff nothing it contains can record an explanation.
//!
//! One `Compiler` covers one compilation unit. Nested units (variant
//! sub-validators, `array_of` elements) get their own compiler; slot keys
//! are unique across all of them.

use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::Quartet;
use crate::classify::{Classified, view};
use crate::constant::constant_to_function;
use crate::context::{Preparation, SlotInit, SlotKey};
use crate::error::SchemaError;
use crate::explanation::Explanation;
use crate::program::{Block, CTX, Fragment, FunctionSite, Program, RestLoop, Stmt, ValueExpr};
use crate::schema::{Check, Descriptor, ErrorHandler, FunctionSchema, ObjectSchema, Schema};
use crate::utils::to_dict;

pub(crate) struct Compiler<'q> {
    quartet: &'q Quartet,
    /// Deferred variant sub-validators, keyed by alternatives identity
    variants: AHashMap<usize, (SlotKey, Arc<Program>)>,
    functions: Vec<FunctionSite>,
}

impl<'q> Compiler<'q> {
    pub fn new(quartet: &'q Quartet) -> Self {
        Self {
            quartet,
            variants: AHashMap::new(),
            functions: Vec::new(),
        }
    }

    pub fn into_functions(self) -> Vec<FunctionSite> {
        self.functions
    }

    pub fn compile(
        &mut self,
        subject: &ValueExpr,
        schema: &Schema,
        prepare: &mut Vec<Preparation>,
    ) -> Result<Fragment, SchemaError> {
        let classified = view(schema).map_err(|err| err.rebase(&subject.key_path()))?;
        match classified {
            Classified::Function(function) => Ok(self.compile_function(subject, function, prepare)),
            Classified::Constant(literal) => {
                let function = constant_to_function(self.quartet, literal);
                Ok(self.compile_function(subject, &function, prepare))
            }
            Classified::And(schemas) => {
                let mut fragment = Fragment::empty();
                for schema in schemas {
                    let next = self.compile(subject, schema, prepare)?;
                    fragment.code.0.extend(next.code.0);
                    fragment.pure &= next.pure;
                }
                Ok(fragment)
            }
            Classified::Object(object) => self.compile_object(subject, object, prepare),
            Classified::ObjectWithRest { object, rest } => {
                self.compile_object_with_rest(subject, object, rest, prepare)
            }
            Classified::Variant(alternatives) => match alternatives.len() {
                0 => Ok(self.reject(subject)),
                1 => self.compile(subject, &alternatives[0], prepare),
                _ => self.compile_variant(subject, alternatives, prepare),
            },
        }
    }

    fn compile_function(
        &mut self,
        subject: &ValueExpr,
        function: &FunctionSchema,
        prepare: &mut Vec<Preparation>,
    ) -> Fragment {
        let Descriptor {
            check,
            not,
            handle_error,
            prepare: preparation,
        } = function.descriptor();
        prepare.extend(preparation);
        self.functions.push(FunctionSite {
            key_path: subject.key_path(),
            source: check.render(&subject.render(), CTX),
        });
        let pure = handle_error.is_none();
        Fragment {
            code: Block(vec![Stmt::Guard {
                subject: subject.clone(),
                check,
                not,
                on_fail: handle_error,
            }]),
            pure,
        }
    }

    /// Structural guard. In explain mode it is an ordinary guard whose
    /// handler records `NotAnObject`, so only handlers make code impure.
    fn null_guard(&self, subject: &ValueExpr) -> Fragment {
        if !self.quartet.settings().is_explain() {
            return Fragment {
                code: Block(vec![Stmt::NullGuard {
                    subject: subject.clone(),
                }]),
                pure: true,
            };
        }
        let handler = ErrorHandler::new(
            |value, path, ctx| {
                ctx.record(Explanation::NotAnObject {
                    path: path.clone(),
                    actual: value.type_name().to_string(),
                })
            },
            |v, c| format!("{c}.explain({v}, \"object\")"),
        );
        Fragment {
            code: Block(vec![Stmt::Guard {
                subject: subject.clone(),
                check: Check::new(|value, _| !value.is_nullish(), |v, _| format!("{v} != null")),
                not: Some(Check::new(|value, _| value.is_nullish(), |v, _| format!("{v} == null"))),
                on_fail: Some(handler),
            }]),
            pure: false,
        }
    }

    /// Empty variant: nothing matches.
    fn reject(&self, subject: &ValueExpr) -> Fragment {
        if !self.quartet.settings().is_explain() {
            return Fragment {
                code: Block(vec![Stmt::Reject]),
                pure: true,
            };
        }
        let handler = ErrorHandler::new(
            |value, path, ctx| {
                ctx.record(Explanation::NoVariantMatched {
                    path: path.clone(),
                    actual: value.to_string(),
                    alternatives: Vec::new(),
                })
            },
            |v, c| format!("{c}.explain({v}, [])"),
        );
        Fragment {
            code: Block(vec![Stmt::Guard {
                subject: subject.clone(),
                check: Check::new(|_, _| false, |_, _| "false".to_string()),
                not: Some(Check::new(|_, _| true, |_, _| "true".to_string())),
                on_fail: Some(handler),
            }]),
            pure: false,
        }
    }

    fn compile_object(
        &mut self,
        subject: &ValueExpr,
        object: &ObjectSchema,
        prepare: &mut Vec<Preparation>,
    ) -> Result<Fragment, SchemaError> {
        let mut fragment = self.null_guard(subject);
        for (key, schema) in object.properties() {
            let next = self.compile(&subject.property(key), schema, prepare)?;
            fragment.code.0.extend(next.code.0);
            fragment.pure &= next.pure;
        }
        Ok(fragment)
    }

    fn compile_object_with_rest(
        &mut self,
        subject: &ValueExpr,
        object: &ObjectSchema,
        rest: &Schema,
        prepare: &mut Vec<Preparation>,
    ) -> Result<Fragment, SchemaError> {
        let mut fragment = if object.properties().is_empty() {
            self.null_guard(subject)
        } else {
            self.compile_object(subject, object, prepare)?
        };

        let quartet = self.quartet;
        let mut slot = |base: &str, init: SlotInit| {
            let (key, preparation) = quartet.to_context(base, init);
            prepare.push(preparation);
            key
        };
        let elem = slot("elem", SlotInit::Undefined);
        let keys = slot("keys", SlotInit::Undefined);
        let key = slot("key", SlotInit::Undefined);
        let index = slot("i", SlotInit::Index(0));
        let excluded: Vec<&str> = object
            .properties()
            .keys()
            .chain(object.omitted())
            .map(String::as_str)
            .collect();
        let omit = if excluded.is_empty() {
            None
        } else {
            Some(slot("omitkeys", SlotInit::KeySet(Arc::new(to_dict(excluded)))))
        };

        let element = ValueExpr::Element {
            object: Box::new(subject.clone()),
            elem: elem.clone(),
            key: key.clone(),
        };
        let body = self.compile(&element, rest, prepare)?;
        fragment.pure &= body.pure;
        fragment.code.0.push(Stmt::RestLoop(Box::new(RestLoop {
            subject: subject.clone(),
            keys,
            index,
            key,
            elem,
            omit,
            body: body.code,
        })));
        Ok(fragment)
    }

    /// Multi-alternative variant: compile the alternatives once into an
    /// independent sub-validator and guard on its result.
    fn compile_variant(
        &mut self,
        subject: &ValueExpr,
        alternatives: &Arc<[Schema]>,
        prepare: &mut Vec<Preparation>,
    ) -> Result<Fragment, SchemaError> {
        let cache = self.quartet.settings().cache_variants;
        let identity = Arc::as_ptr(alternatives).cast::<()>() as usize;
        let cached = if cache {
            self.variants.get(&identity).cloned()
        } else {
            None
        };
        let (slot, program) = match cached {
            Some(entry) => entry,
            None => {
                let program = self
                    .quartet
                    .compile_alternatives(alternatives)
                    .map_err(|err| err.rebase(&subject.key_path()))?;
                let program = Arc::new(program);
                let (slot, preparation) = self
                    .quartet
                    .to_context("variant", SlotInit::Validator(program.clone()));
                prepare.push(preparation);
                debug!(
                    slot = slot.name(),
                    alternatives = alternatives.len(),
                    pure = program.is_pure(),
                    "deferred variant sub-validator"
                );
                if cache {
                    self.variants
                        .insert(identity, (slot.clone(), program.clone()));
                }
                (slot, program)
            }
        };

        let name = slot.name().to_string();
        let check = {
            let slot = slot.clone();
            let name = name.clone();
            Check::new(
                move |value, ctx| ctx.call_validator(&slot, value),
                move |v, c| format!("{c}.{name}({v})"),
            )
        };
        let not = {
            let slot = slot.clone();
            let name = name.clone();
            Check::new(
                move |value, ctx| !ctx.call_validator(&slot, value),
                move |v, c| format!("!{c}.{name}({v})"),
            )
        };
        let pure = program.is_pure();
        let on_fail = (!pure).then(|| {
            ErrorHandler::new(
                move |_, path, ctx| {
                    ctx.forward_explanations(&slot, path);
                },
                move |_, c| format!("{c}.explanations.push(...{c}.{name}.explanations)"),
            )
        });
        Ok(Fragment {
            code: Block(vec![Stmt::Guard {
                subject: subject.clone(),
                check,
                not: Some(not),
                on_fail,
            }]),
            pure,
        })
    }
}
