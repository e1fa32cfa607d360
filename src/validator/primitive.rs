//! Scalar validators: strings, the four numeric widths, booleans and enums.

use super::formats::StringFormat;
use super::ValidatorNode;
use crate::error::ValidationError;
use crate::value::ParameterValue;
use regex::Regex;
use serde_json::Value;
use std::marker::PhantomData;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct StringValidator {
    pattern: Option<Regex>,
    format: Option<StringFormat>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringValidator {
    pub fn new() -> Self {
        StringValidator {
            pattern: None,
            format: None,
            min_length: None,
            max_length: None,
        }
    }

    /// Compile `pattern` so that it must match the whole value.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, ValidationError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)
            .map_err(|e| ValidationError::invalid_schema(format!("pattern \"{pattern}\": {e}")))?;
        self.pattern = Some(regex);
        Ok(self)
    }

    pub fn with_format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn validate(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let len = raw.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(ValidationError::no_match(raw, format!("shorter than {min} characters")));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::no_match(raw, format!("longer than {max} characters")));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(raw) {
                return Err(ValidationError::no_match(
                    raw,
                    format!("pattern {}", pattern.as_str()),
                ));
            }
        }
        if let Some(format) = self.format {
            if !format.matches(raw) {
                return Err(ValidationError::no_match(
                    raw,
                    format!("format {}", format.name()),
                ));
            }
        }
        Ok(ParameterValue::String(raw.to_string()))
    }
}

impl Default for StringValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Inclusive/exclusive bounds and `multipleOf` for any numeric width.
///
/// Comparison happens in `f64`; `int64` values beyond 2^53 compare approximately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericBounds {
    pub minimum: Option<f64>,
    pub exclusive_minimum: bool,
    pub maximum: Option<f64>,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
}

impl NumericBounds {
    /// Read bounds from a schema in either the OAS 3.0 form
    /// (`maximum: 100, exclusiveMaximum: true`) or the 3.1 form (`exclusiveMaximum: 100`).
    pub fn from_schema(schema: &Value) -> Self {
        let (minimum, exclusive_minimum) = bound(schema, "minimum", "exclusiveMinimum");
        let (maximum, exclusive_maximum) = bound(schema, "maximum", "exclusiveMaximum");
        NumericBounds {
            minimum,
            exclusive_minimum,
            maximum,
            exclusive_maximum,
            multiple_of: schema.get("multipleOf").and_then(Value::as_f64),
        }
    }

    pub fn check(&self, raw: &str, value: f64) -> Result<(), ValidationError> {
        if let Some(min) = self.minimum {
            if value < min || (self.exclusive_minimum && value == min) {
                let op = if self.exclusive_minimum { ">" } else { ">=" };
                return Err(ValidationError::no_match(raw, format!("must be {op} {min}")));
            }
        }
        if let Some(max) = self.maximum {
            if value > max || (self.exclusive_maximum && value == max) {
                let op = if self.exclusive_maximum { "<" } else { "<=" };
                return Err(ValidationError::no_match(raw, format!("must be {op} {max}")));
            }
        }
        if let Some(step) = self.multiple_of {
            if step != 0.0 && value % step != 0.0 {
                return Err(ValidationError::no_match(
                    raw,
                    format!("must be a multiple of {step}"),
                ));
            }
        }
        Ok(())
    }
}

fn bound(schema: &Value, inclusive: &str, exclusive: &str) -> (Option<f64>, bool) {
    match schema.get(exclusive) {
        Some(Value::Number(n)) => (n.as_f64(), true),
        Some(Value::Bool(flag)) => (schema.get(inclusive).and_then(Value::as_f64), *flag),
        _ => (schema.get(inclusive).and_then(Value::as_f64), false),
    }
}

/// A numeric width a [`NumberValidator`] can parse into.
pub trait NumberKind: Copy + FromStr {
    const NAME: &'static str;
    fn to_f64(self) -> f64;
    fn wrap(self) -> ParameterValue;
    fn is_finite(self) -> bool {
        true
    }
}

impl NumberKind for i32 {
    const NAME: &'static str = "32-bit integer";
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    fn wrap(self) -> ParameterValue {
        ParameterValue::Integer(self)
    }
}

impl NumberKind for i64 {
    const NAME: &'static str = "64-bit integer";
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn wrap(self) -> ParameterValue {
        ParameterValue::Long(self)
    }
}

impl NumberKind for f32 {
    const NAME: &'static str = "float";
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    fn wrap(self) -> ParameterValue {
        ParameterValue::Float(self)
    }
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

impl NumberKind for f64 {
    const NAME: &'static str = "double";
    fn to_f64(self) -> f64 {
        self
    }
    fn wrap(self) -> ParameterValue {
        ParameterValue::Double(self)
    }
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

#[derive(Debug, Clone)]
pub struct NumberValidator<T> {
    bounds: NumericBounds,
    _kind: PhantomData<T>,
}

impl<T: NumberKind> NumberValidator<T> {
    pub fn new(bounds: NumericBounds) -> Self {
        NumberValidator {
            bounds,
            _kind: PhantomData,
        }
    }

    pub fn validate(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let parsed: T = raw
            .parse()
            .map_err(|_| ValidationError::no_match(raw, format!("not a valid {}", T::NAME)))?;
        // "NaN" and "inf" parse as floats but are not JSON numbers
        if !parsed.is_finite() {
            return Err(ValidationError::no_match(raw, format!("not a finite {}", T::NAME)));
        }
        self.bounds.check(raw, parsed.to_f64())?;
        Ok(parsed.wrap())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanValidator;

impl BooleanValidator {
    pub fn validate(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(ParameterValue::Boolean(true)),
            "false" | "f" | "0" => Ok(ParameterValue::Boolean(false)),
            _ => Err(ValidationError::no_match(raw, "not a boolean")),
        }
    }
}

/// Inner primitive check plus membership in a fixed literal set.
#[derive(Debug, Clone)]
pub struct EnumValidator {
    inner: Box<ValidatorNode>,
    allowed: Vec<ParameterValue>,
}

impl EnumValidator {
    /// Every literal must itself pass `inner`; a literal that does not is a schema bug.
    pub fn new(inner: ValidatorNode, literals: &[Value]) -> Result<Self, ValidationError> {
        let mut allowed = Vec::with_capacity(literals.len());
        for literal in literals {
            let raw = match literal {
                Value::Null => {
                    allowed.push(ParameterValue::Null);
                    continue;
                }
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(ValidationError::invalid_schema(format!(
                        "enum literal {other} is not a primitive"
                    )))
                }
            };
            let value = inner.validate_scalar(&raw).map_err(|e| {
                ValidationError::invalid_schema(format!("enum literal {literal}: {}", e.message))
            })?;
            allowed.push(value);
        }
        Ok(EnumValidator {
            inner: Box::new(inner),
            allowed,
        })
    }

    pub fn validate(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let value = self.inner.validate_scalar(raw)?;
        if self.allowed.contains(&value) {
            Ok(value)
        } else {
            Err(ValidationError::no_match(raw, "not one of the enumerated values"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_exclusive_maximum_oas30() {
        let bounds = NumericBounds::from_schema(&json!({"maximum": 100, "exclusiveMaximum": true}));
        let v = NumberValidator::<i32>::new(bounds);
        assert_eq!(v.validate("100").unwrap_err().kind, ErrorKind::NoMatch);
        assert_eq!(v.validate("99").unwrap(), ParameterValue::Integer(99));
    }

    #[test]
    fn test_exclusive_minimum_oas31() {
        let bounds = NumericBounds::from_schema(&json!({"exclusiveMinimum": 0}));
        let v = NumberValidator::<f64>::new(bounds);
        assert!(v.validate("0").is_err());
        assert_eq!(v.validate("0.5").unwrap(), ParameterValue::Double(0.5));
    }

    #[test]
    fn test_multiple_of() {
        let v = NumberValidator::<i64>::new(NumericBounds::from_schema(&json!({"multipleOf": 5})));
        assert_eq!(v.validate("15").unwrap(), ParameterValue::Long(15));
        assert!(v.validate("16").is_err());
    }

    #[test]
    fn test_integer_width() {
        let v = NumberValidator::<i32>::new(NumericBounds::default());
        assert!(v.validate("3000000000").is_err());
        assert!(v.validate("1.5").is_err());
        let v = NumberValidator::<i64>::new(NumericBounds::default());
        assert_eq!(v.validate("3000000000").unwrap(), ParameterValue::Long(3_000_000_000));
    }

    #[test]
    fn test_non_finite_rejected() {
        let v = NumberValidator::<f64>::new(NumericBounds::default());
        assert!(v.validate("NaN").is_err());
        assert!(v.validate("inf").is_err());
    }

    #[test]
    fn test_boolean_spellings() {
        let b = BooleanValidator;
        for t in ["true", "TRUE", "t", "1"] {
            assert_eq!(b.validate(t).unwrap(), ParameterValue::Boolean(true));
        }
        for f in ["false", "F", "0"] {
            assert_eq!(b.validate(f).unwrap(), ParameterValue::Boolean(false));
        }
        assert!(b.validate("yes").is_err());
    }

    #[test]
    fn test_string_pattern_is_anchored() {
        let v = StringValidator::new().with_pattern("[a-z]+").unwrap();
        assert!(v.validate("abc").is_ok());
        assert!(v.validate("abc1").is_err());
    }

    #[test]
    fn test_string_length_counts_chars() {
        let v = StringValidator::new().with_length(Some(2), Some(3));
        assert!(v.validate("é").is_err());
        assert!(v.validate("éé").is_ok());
        assert!(v.validate("éééé").is_err());
    }

    #[test]
    fn test_enum_membership() {
        let v = EnumValidator::new(
            ValidatorNode::Integer(NumberValidator::new(NumericBounds::default())),
            &[json!(1), json!(2)],
        )
        .unwrap();
        assert_eq!(v.validate("2").unwrap(), ParameterValue::Integer(2));
        assert!(v.validate("3").is_err());
    }

    #[test]
    fn test_enum_literal_must_pass_inner() {
        let err = EnumValidator::new(
            ValidatorNode::Integer(NumberValidator::new(NumericBounds::default())),
            &[json!("abc")],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSchema);
    }
}
