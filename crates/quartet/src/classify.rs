//! Schema classification
//!
//! Maps a schema node to exactly one compilation kind and rejects
//! inconsistent marker usage before any code is emitted.

use std::fmt;
use std::sync::Arc;

use crate::constant::Literal;
use crate::error::SchemaError;
use crate::schema::{FunctionSchema, ObjectSchema, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Function,
    Constant,
    Object,
    ObjectWithRest,
    And,
    Variant,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaKind::Function => "function",
            SchemaKind::Constant => "constant",
            SchemaKind::Object => "object",
            SchemaKind::ObjectWithRest => "object with rest",
            SchemaKind::And => "and",
            SchemaKind::Variant => "variant",
        };
        f.write_str(name)
    }
}

/// A classified schema node, borrowing the parts each kind compiles from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Classified<'a> {
    Function(&'a FunctionSchema),
    Constant(&'a Literal),
    Object(&'a ObjectSchema),
    ObjectWithRest {
        object: &'a ObjectSchema,
        rest: &'a Schema,
    },
    And(&'a [Schema]),
    Variant(&'a Arc<[Schema]>),
}

impl Classified<'_> {
    pub fn kind(&self) -> SchemaKind {
        match self {
            Classified::Function(_) => SchemaKind::Function,
            Classified::Constant(_) => SchemaKind::Constant,
            Classified::Object(_) => SchemaKind::Object,
            Classified::ObjectWithRest { .. } => SchemaKind::ObjectWithRest,
            Classified::And(_) => SchemaKind::And,
            Classified::Variant(_) => SchemaKind::Variant,
        }
    }
}

pub(crate) fn view(schema: &Schema) -> Result<Classified<'_>, SchemaError> {
    Ok(match schema {
        Schema::Function(function) => Classified::Function(function),
        Schema::Constant(literal) => Classified::Constant(literal),
        Schema::Object(object) => match object.rest_schema() {
            Some(rest) => Classified::ObjectWithRest { object, rest },
            None if !object.omitted().is_empty() => {
                return Err(SchemaError::OmitWithoutRest {
                    keys: object.omitted().to_vec(),
                    at: "value".to_string(),
                });
            }
            None => Classified::Object(object),
        },
        Schema::And(schemas) => Classified::And(schemas),
        Schema::Variant(schemas) => Classified::Variant(schemas),
    })
}

/// Kind of a schema node, or the configuration error it carries.
pub fn classify(schema: &Schema) -> Result<SchemaKind, SchemaError> {
    view(schema).map(|classified| classified.kind())
}
