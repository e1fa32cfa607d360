//! Validation error vocabulary shared by route compilation and request validation.
//!
//! Two classes of failure share one type:
//!
//! - **Compile-time** kinds ([`ErrorKind::is_compile_time`]) come from a broken API
//!   description: an illegal path template, a placeholder with no parameter, an
//!   unsupported style combination. They abort route registration.
//! - **Request-time** kinds describe a malformed request. They are scoped to that
//!   request and reported exactly once; the orchestrator stops at the first one.

use crate::spec::ParameterLocation;
use serde_json::{json, Value};
use std::fmt;

/// Stable error kinds. The string form (`NOT_FOUND`, `NO_MATCH`, ...) is part of the
/// public contract and is what [`ValidationError::to_problem_json`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required parameter, object field or header is absent
    NotFound,
    /// A value failed type, format, bound or pattern checks
    NoMatch,
    /// Several occurrences were supplied for a single-valued parameter
    UnexpectedArray,
    /// Array item count outside `minItems`/`maxItems`
    UnexpectedArraySize,
    /// Raw string could not be split into the declared container shape
    DeserializationError,
    /// Request content type does not fit the declared request body
    WrongContentType,
    /// A required multipart file part is missing
    FileNotFound,
    /// Body is not parsable JSON or fails its schema
    InvalidJsonBody,
    /// Body is not well-formed XML, carries a DOCTYPE, or has the wrong root
    InvalidXmlBody,
    /// Path template is syntactically invalid
    InvalidSpecPath,
    /// A path placeholder has no matching path parameter
    MissingParameterDescription,
    /// Style/location/flag combination this engine does not implement
    UnsupportedFeature,
    /// Schema is internally inconsistent (bad enum literal, bad default, bad pattern)
    InvalidSchema,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NoMatch => "NO_MATCH",
            ErrorKind::UnexpectedArray => "UNEXPECTED_ARRAY",
            ErrorKind::UnexpectedArraySize => "UNEXPECTED_ARRAY_SIZE",
            ErrorKind::DeserializationError => "DESERIALIZATION_ERROR",
            ErrorKind::WrongContentType => "WRONG_CONTENT_TYPE",
            ErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ErrorKind::InvalidJsonBody => "INVALID_JSON_BODY",
            ErrorKind::InvalidXmlBody => "INVALID_XML_BODY",
            ErrorKind::InvalidSpecPath => "INVALID_SPEC_PATH",
            ErrorKind::MissingParameterDescription => "MISSING_PARAMETER_DESCRIPTION",
            ErrorKind::UnsupportedFeature => "UNSUPPORTED_FEATURE",
            ErrorKind::InvalidSchema => "INVALID_SCHEMA",
        }
    }

    /// True for kinds raised while compiling routes rather than validating requests.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidSpecPath
                | ErrorKind::MissingParameterDescription
                | ErrorKind::UnsupportedFeature
                | ErrorKind::InvalidSchema
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure.
///
/// Validators create errors without knowing which parameter they serve; the
/// orchestrator scopes them afterwards with [`ValidationError::scoped`], which only
/// fills in fields still unset so a nested field name survives.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub parameter: Option<String>,
    pub location: Option<ParameterLocation>,
    pub value: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ValidationError {
            kind,
            parameter: None,
            location: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn not_found(parameter: &str, location: ParameterLocation) -> Self {
        ValidationError {
            kind: ErrorKind::NotFound,
            parameter: Some(parameter.to_string()),
            location: Some(location),
            value: None,
            message: format!("Parameter \"{parameter}\" inside {location} not found"),
        }
    }

    pub fn no_match(value: &str, reason: impl fmt::Display) -> Self {
        ValidationError::new(
            ErrorKind::NoMatch,
            format!("Value \"{value}\" does not match: {reason}"),
        )
        .with_value(value)
    }

    pub fn deserialization(value: &str, reason: impl fmt::Display) -> Self {
        ValidationError::new(
            ErrorKind::DeserializationError,
            format!("Cannot deserialize \"{value}\": {reason}"),
        )
        .with_value(value)
    }

    pub fn array_size(len: usize, min: Option<usize>, max: Option<usize>) -> Self {
        let bound = |b: Option<usize>| b.map_or_else(|| "-".to_string(), |v| v.to_string());
        ValidationError::new(
            ErrorKind::UnexpectedArraySize,
            format!(
                "Array has {len} items, expected between {} and {}",
                bound(min),
                bound(max)
            ),
        )
    }

    pub fn unexpected_array(count: usize) -> Self {
        ValidationError::new(
            ErrorKind::UnexpectedArray,
            format!("Expected a single value but found {count} occurrences"),
        )
    }

    pub fn wrong_content_type(content_type: Option<&str>, expected: &str) -> Self {
        let message = match content_type {
            Some(ct) => format!("Content type \"{ct}\" is not acceptable, expected {expected}"),
            None => format!("Request body is required, expected {expected}"),
        };
        let err = ValidationError::new(ErrorKind::WrongContentType, message);
        match content_type {
            Some(ct) => err.with_value(ct),
            None => err,
        }
    }

    pub fn file_not_found(name: &str, pattern: &str) -> Self {
        ValidationError {
            kind: ErrorKind::FileNotFound,
            parameter: Some(name.to_string()),
            location: Some(ParameterLocation::BodyForm),
            value: None,
            message: format!("File \"{name}\" with content type matching \"{pattern}\" not found"),
        }
    }

    pub fn unsupported(feature: impl fmt::Display) -> Self {
        ValidationError::new(
            ErrorKind::UnsupportedFeature,
            format!("Unsupported feature: {feature}"),
        )
    }

    pub fn invalid_schema(reason: impl fmt::Display) -> Self {
        ValidationError::new(ErrorKind::InvalidSchema, format!("Invalid schema: {reason}"))
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Attach parameter name and location unless already present.
    pub fn scoped(mut self, parameter: &str, location: ParameterLocation) -> Self {
        if self.parameter.is_none() {
            self.parameter = Some(parameter.to_string());
        }
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    pub fn is_compile_time(&self) -> bool {
        self.kind.is_compile_time()
    }

    /// RFC 7807 style representation for error-reporting collaborators.
    pub fn to_problem_json(&self) -> Value {
        let status = if self.is_compile_time() { 500 } else { 400 };
        json!({
            "type": format!("urn:brrtrouter:validation:{}", self.kind.as_str().to_ascii_lowercase()),
            "title": self.kind.as_str(),
            "status": status,
            "detail": self.message,
            "parameter": self.parameter,
            "location": self.location.map(|l| l.to_string()),
            "value": self.value,
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.kind)?;
        if let (Some(p), Some(l)) = (&self.parameter, &self.location) {
            write!(f, "{l} parameter \"{p}\": ")?;
        } else if let Some(p) = &self.parameter {
            write!(f, "parameter \"{p}\": ")?;
        }
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_time_kinds() {
        assert!(ErrorKind::InvalidSpecPath.is_compile_time());
        assert!(ErrorKind::MissingParameterDescription.is_compile_time());
        assert!(!ErrorKind::NotFound.is_compile_time());
        assert!(!ErrorKind::FileNotFound.is_compile_time());
    }

    #[test]
    fn test_scoped_keeps_inner_field() {
        let err = ValidationError::not_found("R", ParameterLocation::Query)
            .scoped("color", ParameterLocation::Query);
        assert_eq!(err.parameter.as_deref(), Some("R"));

        let err = ValidationError::no_match("x", "not an integer")
            .scoped("limit", ParameterLocation::Query);
        assert_eq!(err.parameter.as_deref(), Some("limit"));
        assert_eq!(err.location, Some(ParameterLocation::Query));
    }

    #[test]
    fn test_problem_json() {
        let err = ValidationError::not_found("id", ParameterLocation::Path);
        let body = err.to_problem_json();
        assert_eq!(body["title"], "NOT_FOUND");
        assert_eq!(body["status"], 400);
        assert_eq!(body["parameter"], "id");
        assert_eq!(body["location"], "path");
    }
}
