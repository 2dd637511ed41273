//! Conversion between [`Value`] and `serde_json::Value`.

use serde_json::Value as JsonValue;

use crate::{Array, Object, Value};

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            // Every JSON number has an f64 reading; arbitrary precision is lost
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for JsonValue {
    /// `undefined` and non-finite numbers have no JSON form and become `null`;
    /// `undefined` object members are dropped.
    fn from(value: &Value) -> Self {
        match value {
            Value::Undefined | Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(Array(items)) => JsonValue::Array(items.iter().map(JsonValue::from).collect()),
            Value::Object(object) => JsonValue::Object(
                object
                    .iter()
                    .filter(|(_, value)| !value.is_undefined())
                    .map(|(key, value)| (key.clone(), JsonValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Object> for JsonValue {
    fn from(object: Object) -> Self {
        JsonValue::from(&Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"name": "a", "tags": [1, true, null]}));
        assert_eq!(value.get("name"), &Value::from("a"));
        let tags = value.get("tags").as_array().unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.get(0), Some(&Value::Number(1.0)));
        assert_eq!(tags.get(2), Some(&Value::Null));
    }

    #[test]
    fn test_to_json_drops_undefined_members() {
        let mut object = Object::new();
        object.insert("a".to_string(), Value::Undefined);
        object.insert("b".to_string(), Value::from(2));
        assert_eq!(JsonValue::from(object), json!({"b": 2.0}));
    }

    #[test]
    fn test_to_json_non_finite_is_null() {
        assert_eq!(JsonValue::from(&Value::Number(f64::INFINITY)), json!(null));
    }
}
