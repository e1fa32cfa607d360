//! Helpers for reading resolved schemas.

use serde_json::{Map, Value};

/// Declared properties, including those contributed by `allOf` parts.
/// A later declaration of the same property replaces an earlier one.
pub fn object_properties(schema: &Value) -> Vec<(String, Value)> {
    let mut out: Vec<(String, Value)> = Vec::new();
    collect_properties(schema, &mut out);
    out
}

fn collect_properties(schema: &Value, out: &mut Vec<(String, Value)>) {
    if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
        for part in parts {
            collect_properties(part, out);
        }
    }
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            match out.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = prop.clone(),
                None => out.push((name.clone(), prop.clone())),
            }
        }
    }
}

/// `required` names from the schema and every `allOf` part.
pub fn required_fields(schema: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_required(schema, &mut out);
    out
}

fn collect_required(schema: &Value, out: &mut Vec<String>) {
    if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
        for part in parts {
            collect_required(part, out);
        }
    }
    if let Some(names) = schema.get("required").and_then(Value::as_array) {
        for name in names.iter().filter_map(Value::as_str) {
            if !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
    }
}

/// Flatten an `allOf` of object schemas into one `type: object` schema.
/// Schemas without `allOf` are returned unchanged.
pub fn merge_all_of(schema: &Value) -> Value {
    if schema.get("allOf").is_none() {
        return schema.clone();
    }
    let mut merged = Map::new();
    merged.insert("type".to_string(), Value::String("object".to_string()));

    let mut props = Map::new();
    for (name, prop) in object_properties(schema) {
        props.insert(name, prop);
    }
    merged.insert("properties".to_string(), Value::Object(props));

    let required = required_fields(schema);
    if !required.is_empty() {
        merged.insert(
            "required".to_string(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }
    if let Some(obj) = schema.as_object() {
        for (k, v) in obj {
            if !matches!(k.as_str(), "allOf" | "properties" | "required" | "type") {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_of_merge() {
        let schema = json!({
            "allOf": [
                {"type": "object", "properties": {"R": {"type": "integer"}}, "required": ["R"]},
                {"type": "object", "properties": {"G": {"type": "integer"}}}
            ],
            "description": "rgb"
        });
        let merged = merge_all_of(&schema);
        assert_eq!(merged["type"], "object");
        assert!(merged["properties"].get("R").is_some());
        assert!(merged["properties"].get("G").is_some());
        assert_eq!(merged["required"], json!(["R"]));
        assert_eq!(merged["description"], "rgb");
    }

    #[test]
    fn test_properties_order() {
        let schema = json!({"properties": {"b": {}, "a": {}}});
        let names: Vec<String> = object_properties(&schema).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), 2);
    }
}
