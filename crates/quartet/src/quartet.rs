//! Compiler entry point

use std::sync::Arc;

use tracing::{debug, trace};

use crate::compile::Compiler;
use crate::context::{Preparation, SlotInit, SlotKey};
use crate::error::SchemaError;
use crate::program::{Block, Branch, Fragment, Program, Stmt, ValueExpr};
use crate::schema::Schema;
use crate::settings::{Mode, Settings};
use crate::validator::Validator;

/// Schema compiler instance.
///
/// Slot keys come from a process-wide counter, so schemas built with one
/// instance can be compiled by another.
#[derive(Debug, Clone, Default)]
pub struct Quartet {
    settings: Settings,
}

impl Quartet {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn fast() -> Self {
        Self::new(Settings::default())
    }

    pub fn explain() -> Self {
        Self::new(Settings::explain())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.settings.mode
    }

    /// Register a context slot derived from `base`.
    ///
    /// The returned key is unique even when `base` repeats. The preparation
    /// must run before any code using the slot.
    pub fn to_context(&self, base: &str, init: SlotInit) -> (SlotKey, Preparation) {
        let key = SlotKey::allocate(base);
        trace!(slot = key.name(), ?init, "allocated context slot");
        (key.clone(), Preparation::new(key, init))
    }

    /// Compile a schema into a reusable validator.
    pub fn compile(&self, schema: &Schema) -> Result<Validator, SchemaError> {
        let program = self.compile_program(schema)?;
        debug!(
            mode = ?self.settings.mode,
            pure = program.is_pure(),
            slots = program.preparations().len(),
            "compiled {schema}"
        );
        Ok(Validator::new(Arc::new(program), self.settings.mode))
    }

    /// Compile one schema as its own compilation unit.
    pub(crate) fn compile_program(&self, schema: &Schema) -> Result<Program, SchemaError> {
        let mut compiler = Compiler::new(self);
        let mut preparations = Vec::new();
        let fragment = compiler.compile(&ValueExpr::Input, schema, &mut preparations)?;
        Ok(Program::new(
            fragment,
            preparations,
            compiler.into_functions(),
            self.settings.indent,
        ))
    }

    /// Compile variant alternatives into an independent sub-validator whose
    /// body is a single `AnyOf`.
    pub(crate) fn compile_alternatives(&self, alternatives: &[Schema]) -> Result<Program, SchemaError> {
        let mut compiler = Compiler::new(self);
        let mut preparations = Vec::new();
        let mut branches = Vec::with_capacity(alternatives.len());
        let mut pure = true;
        for alternative in alternatives {
            let fragment = compiler.compile(&ValueExpr::Input, alternative, &mut preparations)?;
            pure &= fragment.pure;
            branches.push(Branch {
                label: alternative.to_string(),
                body: fragment.code,
            });
        }
        let fragment = Fragment {
            code: Block(vec![Stmt::AnyOf {
                subject: ValueExpr::Input,
                branches,
                explain: !pure,
            }]),
            pure,
        };
        Ok(Program::new(
            fragment,
            preparations,
            compiler.into_functions(),
            self.settings.indent,
        ))
    }
}
