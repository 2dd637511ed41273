//! Flat description of a compiled validator
//!
//! Read-only: walks the program produced by the compiler and never feeds
//! anything back into compilation.

use indexmap::IndexMap;

use crate::context::SlotInit;
use crate::program::Program;
use crate::validator::Validator;

/// Map from key path to descriptive text.
///
/// - `_`: the validator source
/// - each Function site (`value.name`, `value.tags.*`): the rendered check,
///   one line per check at that location
/// - each context slot (`constant3`): its initial content; sub-validators
///   recurse under `slot.`
pub fn describe(validator: &Validator) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    describe_program(validator.program(), "", &mut out);
    out
}

fn describe_program(program: &Program, prefix: &str, out: &mut IndexMap<String, String>) {
    out.insert(format!("{prefix}_"), program.source().trim().to_string());
    for site in program.functions() {
        out.entry(format!("{prefix}{}", site.key_path))
            .and_modify(|text| {
                text.push('\n');
                text.push_str(&site.source);
            })
            .or_insert_with(|| site.source.clone());
    }
    for preparation in program.preparations() {
        let name = preparation.key().name();
        out.insert(format!("{prefix}{name}"), preparation.init().describe());
        if let SlotInit::Validator(sub) = preparation.init() {
            describe_program(sub, &format!("{prefix}{name}."), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectSchema, Quartet, Schema};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_object() {
        let q = Quartet::fast();
        let schema = ObjectSchema::new()
            .field("name", Schema::and([q.string(), q.min_length(1)]))
            .rest(q.number())
            .into();
        let validator = q.compile(&schema).unwrap();
        let description = describe(&validator);

        assert_eq!(description["_"], validator.source());
        assert_eq!(
            description["value.name"],
            "typeof value.name === \"string\"\nvalue.name.length >= 1"
        );
        assert!(description["value.*"].starts_with("typeof ctx.elem"));
        let omit = description
            .iter()
            .find(|(k, _)| k.starts_with("omitkeys"))
            .map(|(_, v)| v.as_str());
        assert_eq!(omit, Some(r#"{"name": true}"#));
    }

    #[test]
    fn test_describe_recurses_into_variants() {
        let q = Quartet::fast();
        let schema = Schema::variant([Schema::from("a"), Schema::from("b")]);
        let validator = q.compile(&schema).unwrap();
        let description = describe(&validator);
        let variant = description
            .keys()
            .find(|k| k.starts_with("variant") && !k.contains('.'))
            .cloned()
            .unwrap();
        assert_eq!(description[&variant], description[&format!("{variant}._")]);
        let constants: Vec<_> = description
            .iter()
            .filter(|(k, _)| k.starts_with(&format!("{variant}.constant")))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(constants, vec!["\"a\"", "\"b\""]);
    }
}
