//! # Validator Module
//!
//! Typed validators for parameter values. A [`ValidatorNode`] is built once per
//! parameter when a route is compiled and is immutable afterwards, so one node graph
//! serves any number of concurrent requests.
//!
//! Every node has two entry points:
//!
//! - [`ValidatorNode::validate_scalar`] for one raw string (a path segment, a header,
//!   a single query occurrence). Containers deserialize it first.
//! - [`ValidatorNode::validate_collection`] for the list of occurrences of a
//!   repeated query, cookie or form key.
//!
//! An empty raw string is the explicit `Null` for every parameter node: the
//! parameter was sent without a value.
//!
//! ## Building
//!
//! [`ValidatorFactory`] turns a resolved schema into a node. [`plan`] decides, from
//! `(style, explode, kind)`, how a parameter is split into rules.

mod body;
mod build;
mod container;
mod dispatch;
mod formats;
mod primitive;

pub use body::{JsonValidator, XmlValidator};
pub use build::{ValidatorFactory, ValidatorOptions};
pub use container::{ArrayValidator, CompositeValidator, ObjectField, ObjectValidator};
pub use dispatch::{plan, FieldKey, RulePlan};
pub use formats::StringFormat;
pub use primitive::{
    BooleanValidator, EnumValidator, NumberKind, NumberValidator, NumericBounds, StringValidator,
};

use crate::error::ValidationError;
use crate::value::ParameterValue;

#[derive(Debug, Clone)]
pub enum ValidatorNode {
    String(StringValidator),
    Integer(NumberValidator<i32>),
    Long(NumberValidator<i64>),
    Float(NumberValidator<f32>),
    Double(NumberValidator<f64>),
    Boolean(BooleanValidator),
    Enum(EnumValidator),
    Array(ArrayValidator),
    Object(ObjectValidator),
    AnyOf(CompositeValidator),
    OneOf(CompositeValidator),
    Json(JsonValidator),
    Xml(XmlValidator),
}

impl ValidatorNode {
    pub fn validate_scalar(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        if raw.is_empty() {
            return Ok(ParameterValue::Null);
        }
        match self {
            ValidatorNode::String(v) => v.validate(raw),
            ValidatorNode::Integer(v) => v.validate(raw),
            ValidatorNode::Long(v) => v.validate(raw),
            ValidatorNode::Float(v) => v.validate(raw),
            ValidatorNode::Double(v) => v.validate(raw),
            ValidatorNode::Boolean(v) => v.validate(raw),
            ValidatorNode::Enum(v) => v.validate(raw),
            ValidatorNode::Array(v) => v.validate_scalar(raw),
            ValidatorNode::Object(v) => v.validate_scalar(raw),
            // oneOf resolves to the first match, same as anyOf
            ValidatorNode::AnyOf(v) | ValidatorNode::OneOf(v) => {
                v.validate_with(raw, |candidate| candidate.validate_scalar(raw))
            }
            ValidatorNode::Json(v) => v.validate(raw),
            ValidatorNode::Xml(v) => v.validate(raw),
        }
    }

    pub fn validate_collection(&self, values: &[String]) -> Result<ParameterValue, ValidationError> {
        match self {
            ValidatorNode::Array(v) => v.validate_collection(values),
            ValidatorNode::AnyOf(v) | ValidatorNode::OneOf(v) => {
                let raw = values.join(",");
                v.validate_with(&raw, |candidate| candidate.validate_collection(values))
            }
            _ => match values {
                [single] => self.validate_scalar(single),
                [] => Err(ValidationError::no_match("", "no value supplied")),
                _ => Err(ValidationError::unexpected_array(values.len())),
            },
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ValidatorNode::String(_) => "string",
            ValidatorNode::Integer(_) => "integer",
            ValidatorNode::Long(_) => "long",
            ValidatorNode::Float(_) => "float",
            ValidatorNode::Double(_) => "double",
            ValidatorNode::Boolean(_) => "boolean",
            ValidatorNode::Enum(_) => "enum",
            ValidatorNode::Array(_) => "array",
            ValidatorNode::Object(_) => "object",
            ValidatorNode::AnyOf(_) => "anyOf",
            ValidatorNode::OneOf(_) => "oneOf",
            ValidatorNode::Json(_) => "json",
            ValidatorNode::Xml(_) => "xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_is_null() {
        let node = ValidatorNode::Integer(NumberValidator::new(NumericBounds::default()));
        assert_eq!(node.validate_scalar("").unwrap(), ParameterValue::Null);
    }

    #[test]
    fn test_single_valued_collection() {
        let node = ValidatorNode::Boolean(BooleanValidator);
        assert_eq!(
            node.validate_collection(&["t".to_string()]).unwrap(),
            ParameterValue::Boolean(true)
        );
        let err = node
            .validate_collection(&["t".to_string(), "f".to_string()])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedArray);
        let err = node.validate_collection(&[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoMatch);
    }
}
