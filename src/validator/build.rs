//! Construction of validator nodes from resolved schemas.

use super::container::{ArrayValidator, CompositeValidator, ObjectField, ObjectValidator};
use super::formats::StringFormat;
use super::primitive::{BooleanValidator, EnumValidator, NumberValidator, NumericBounds, StringValidator};
use super::{JsonValidator, ValidatorNode, XmlValidator};
use crate::deserializer::Splitter;
use crate::error::ValidationError;
use crate::spec::{object_properties, required_fields, schema_type};
use crate::value::ParameterValue;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Compile-time switches for route compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Reject unknown string formats instead of treating them as plain strings
    pub strict_formats: bool,
}

/// Builds [`ValidatorNode`]s for one route.
///
/// `definitions` is the route's bundle of recursive schemas; it is attached to every
/// JSON schema compiled here so `#/definitions/...` references resolve.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorFactory<'a> {
    options: &'a ValidatorOptions,
    definitions: Option<&'a Value>,
}

impl<'a> ValidatorFactory<'a> {
    pub fn new(options: &'a ValidatorOptions, definitions: Option<&'a Value>) -> Self {
        ValidatorFactory {
            options,
            definitions,
        }
    }

    /// Node for a whole parameter value: container, composed or scalar.
    pub fn node(
        &self,
        schema: &Value,
        splitter: Splitter,
        exploded: bool,
    ) -> Result<ValidatorNode, ValidationError> {
        if let Some((keyword, parts)) = composed(schema) {
            let candidates = parts
                .iter()
                .map(|part| self.node(part, splitter, exploded))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(composite(keyword, candidates));
        }
        if schema.get("allOf").is_some() {
            return self.object(schema, splitter).map(ValidatorNode::Object);
        }
        match schema_type(schema) {
            Some("array") => self.array(schema, splitter, exploded),
            Some("object") => self.object(schema, splitter).map(ValidatorNode::Object),
            None if schema.get("items").is_some() => self.array(schema, splitter, exploded),
            None if schema.get("properties").is_some() => {
                self.object(schema, splitter).map(ValidatorNode::Object)
            }
            _ => self.scalar(schema),
        }
    }

    /// Node for one element of a container: scalars and composed scalars only.
    pub fn scalar(&self, schema: &Value) -> Result<ValidatorNode, ValidationError> {
        if let Some((keyword, parts)) = composed(schema) {
            let candidates = parts
                .iter()
                .map(|part| self.scalar(part))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(composite(keyword, candidates));
        }
        let format = schema.get("format").and_then(Value::as_str);
        let base = match schema_type(schema) {
            Some("integer") if format == Some("int64") => {
                ValidatorNode::Long(NumberValidator::new(NumericBounds::from_schema(schema)))
            }
            Some("integer") => {
                ValidatorNode::Integer(NumberValidator::new(NumericBounds::from_schema(schema)))
            }
            Some("number") if format == Some("float") => {
                ValidatorNode::Float(NumberValidator::new(NumericBounds::from_schema(schema)))
            }
            Some("number") => {
                ValidatorNode::Double(NumberValidator::new(NumericBounds::from_schema(schema)))
            }
            Some("boolean") => ValidatorNode::Boolean(BooleanValidator),
            Some("string") | None => ValidatorNode::String(self.string(schema)?),
            Some(other) => {
                return Err(ValidationError::unsupported(format!(
                    "nested {other} value inside a serialized parameter"
                )))
            }
        };
        match schema.get("enum").and_then(Value::as_array) {
            Some(literals) => Ok(ValidatorNode::Enum(EnumValidator::new(base, literals)?)),
            None => Ok(base),
        }
    }

    fn string(&self, schema: &Value) -> Result<StringValidator, ValidationError> {
        let length = |key: &str| {
            schema
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };
        let mut v = StringValidator::new().with_length(length("minLength"), length("maxLength"));
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            v = v.with_pattern(pattern)?;
        }
        if let Some(name) = schema.get("format").and_then(Value::as_str) {
            match StringFormat::from_name(name) {
                Some(format) => v = v.with_format(format),
                None if self.options.strict_formats => {
                    return Err(ValidationError::unsupported(format!("string format \"{name}\"")));
                }
                None => warn!(format = %name, "Unknown string format, validating as plain string"),
            }
        }
        Ok(v)
    }

    fn array(
        &self,
        schema: &Value,
        splitter: Splitter,
        exploded: bool,
    ) -> Result<ValidatorNode, ValidationError> {
        let items = match schema.get("items") {
            Some(items) => self.scalar(items)?,
            None => ValidatorNode::String(StringValidator::new()),
        };
        let count = |key: &str| {
            schema
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };
        let unique = schema
            .get("uniqueItems")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(ValidatorNode::Array(
            ArrayValidator::new(items, splitter, exploded)
                .with_size(count("minItems"), count("maxItems"))
                .with_unique_items(unique),
        ))
    }

    fn object(&self, schema: &Value, splitter: Splitter) -> Result<ObjectValidator, ValidationError> {
        let mut object = ObjectValidator::new(splitter);
        for (name, field) in self.object_fields(schema)? {
            object = object.field(name, field);
        }
        if let Some(additional) = self.additional_properties(schema)? {
            object = object.additional_properties(additional);
        }
        Ok(object)
    }

    /// One [`ObjectField`] per declared property, `allOf` parts included.
    pub fn object_fields(&self, schema: &Value) -> Result<Vec<(String, ObjectField)>, ValidationError> {
        let required = required_fields(schema);
        object_properties(schema)
            .into_iter()
            .map(|(name, prop)| {
                let validator = self
                    .scalar(&prop)
                    .map_err(|e| e.with_parameter(name.clone()))?;
                let default = self
                    .default_value(&validator, prop.get("default"))
                    .map_err(|e| e.with_parameter(name.clone()))?;
                let field = ObjectField {
                    required: required.contains(&name),
                    validator,
                    default,
                };
                Ok((name, field))
            })
            .collect()
    }

    /// Validator for undeclared keys when `additionalProperties` is a schema.
    pub fn additional_properties(&self, schema: &Value) -> Result<Option<ValidatorNode>, ValidationError> {
        match schema.get("additionalProperties") {
            Some(ap @ Value::Object(_)) => self.scalar(ap).map(Some),
            _ => Ok(None),
        }
    }

    /// Convert a schema `default` through `validator` so its type matches parsed values.
    pub fn default_value(
        &self,
        validator: &ValidatorNode,
        default: Option<&Value>,
    ) -> Result<Option<ParameterValue>, ValidationError> {
        let Some(default) = default else {
            return Ok(None);
        };
        let raw = match default {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            // containers and null are taken verbatim
            other => return Ok(Some(ParameterValue::from_json(other))),
        };
        match validator {
            ValidatorNode::Array(_) | ValidatorNode::Object(_) => {
                Ok(Some(ParameterValue::from_json(default)))
            }
            _ => validator
                .validate_scalar(&raw)
                .map(Some)
                .map_err(|e| ValidationError::invalid_schema(format!("default {default}: {}", e.message))),
        }
    }

    /// JSON schema validator with the route's bundled definitions attached.
    pub fn json(&self, schema: &Value) -> Result<JsonValidator, ValidationError> {
        match (self.definitions, schema) {
            (Some(defs), Value::Object(obj)) if !obj.contains_key("definitions") => {
                let mut with_defs = obj.clone();
                with_defs.insert("definitions".to_string(), defs.clone());
                JsonValidator::compile(&Value::Object(with_defs))
            }
            _ => JsonValidator::compile(schema),
        }
    }

    /// XML validator expecting the root named by `xml.name` (or the referenced schema name).
    pub fn xml(&self, schema: Option<&Value>) -> XmlValidator {
        let root = schema.and_then(|s| {
            s.pointer("/xml/name")
                .or_else(|| s.get("x-ref-name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        XmlValidator::new(root)
    }
}

fn composed(schema: &Value) -> Option<(&'static str, &Vec<Value>)> {
    if let Some(parts) = schema.get("anyOf").and_then(Value::as_array) {
        return Some(("anyOf", parts));
    }
    schema
        .get("oneOf")
        .and_then(Value::as_array)
        .map(|parts| ("oneOf", parts))
}

fn composite(keyword: &'static str, candidates: Vec<ValidatorNode>) -> ValidatorNode {
    let v = CompositeValidator::new(keyword, candidates);
    if keyword == "oneOf" {
        ValidatorNode::OneOf(v)
    } else {
        ValidatorNode::AnyOf(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserializer::ContainerStyle;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn factory(options: &ValidatorOptions) -> ValidatorFactory<'_> {
        ValidatorFactory::new(options, None)
    }

    #[test]
    fn test_number_widths() {
        let opts = ValidatorOptions::default();
        let f = factory(&opts);
        let n = f.scalar(&json!({"type": "integer", "format": "int64"})).unwrap();
        assert_eq!(n.kind_name(), "long");
        let n = f.scalar(&json!({"type": "number", "format": "float"})).unwrap();
        assert_eq!(n.kind_name(), "float");
        let n = f.scalar(&json!({"type": "number"})).unwrap();
        assert_eq!(n.kind_name(), "double");
    }

    #[test]
    fn test_unknown_format_strictness() {
        let lenient = ValidatorOptions::default();
        assert!(factory(&lenient)
            .scalar(&json!({"type": "string", "format": "color"}))
            .is_ok());

        let strict = ValidatorOptions {
            strict_formats: true,
        };
        let err = factory(&strict)
            .scalar(&json!({"type": "string", "format": "color"}))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_enum_wraps_primitive() {
        let opts = ValidatorOptions::default();
        let n = factory(&opts)
            .scalar(&json!({"type": "string", "enum": ["asc", "desc"]}))
            .unwrap();
        assert!(n.validate_scalar("asc").is_ok());
        assert!(n.validate_scalar("up").is_err());
    }

    #[test]
    fn test_default_is_typed() {
        let opts = ValidatorOptions::default();
        let f = factory(&opts);
        let node = f.scalar(&json!({"type": "integer"})).unwrap();
        assert_eq!(
            f.default_value(&node, Some(&json!(10))).unwrap(),
            Some(ParameterValue::Integer(10))
        );
        let err = f.default_value(&node, Some(&json!("ten"))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSchema);
    }

    #[test]
    fn test_object_from_all_of() {
        let opts = ValidatorOptions::default();
        let node = factory(&opts)
            .node(
                &json!({"allOf": [
                    {"properties": {"R": {"type": "integer"}}, "required": ["R"]},
                    {"properties": {"G": {"type": "integer"}}}
                ]}),
                Splitter::new(ContainerStyle::Comma),
                false,
            )
            .unwrap();
        let v = node.validate_scalar("R,1,G,2").unwrap();
        assert_eq!(v.get("G"), Some(&ParameterValue::Integer(2)));
    }

    #[test]
    fn test_nested_container_unsupported() {
        let opts = ValidatorOptions::default();
        let err = factory(&opts)
            .node(
                &json!({"type": "array", "items": {"type": "array"}}),
                Splitter::new(ContainerStyle::Comma),
                false,
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_json_with_definitions() {
        let opts = ValidatorOptions::default();
        let defs = json!({"Node": {"type": "object", "properties": {
            "next": {"$ref": "#/definitions/Node"}, "v": {"type": "integer"}
        }}});
        let f = ValidatorFactory::new(&opts, Some(&defs));
        let v = f.json(&json!({"$ref": "#/definitions/Node"})).unwrap();
        assert!(v.validate(r#"{"v": 1, "next": {"v": 2}}"#).is_ok());
        assert!(v.validate(r#"{"v": 1, "next": {"v": "x"}}"#).is_err());
    }
}
