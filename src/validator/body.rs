//! Whole-document validators for JSON and XML payloads.

use crate::error::{ErrorKind, ValidationError};
use crate::value::ParameterValue;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// JSON Schema validator compiled once per route.
#[derive(Clone)]
pub struct JsonValidator {
    validator: Arc<jsonschema::Validator>,
}

impl JsonValidator {
    pub fn compile(schema: &Value) -> Result<Self, ValidationError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| ValidationError::invalid_schema(format!("JSON schema: {e}")))?;
        Ok(JsonValidator {
            validator: Arc::new(validator),
        })
    }

    pub fn validate(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let instance: Value = serde_json::from_str(raw).map_err(|e| {
            ValidationError::new(ErrorKind::InvalidJsonBody, format!("JSON is not parsable: {e}"))
        })?;
        self.validate_value(&instance)?;
        Ok(ParameterValue::from_json(&instance))
    }

    pub fn validate_value(&self, instance: &Value) -> Result<(), ValidationError> {
        self.validator.validate(instance).map_err(|e| {
            ValidationError::new(ErrorKind::InvalidJsonBody, format!("JSON does not match schema: {e}"))
        })
    }
}

impl fmt::Debug for JsonValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonValidator").finish_non_exhaustive()
    }
}

/// Well-formedness check for XML payloads.
///
/// DOCTYPE declarations are rejected outright, so neither internal nor external
/// entities can ever be declared; references to anything but the five predefined
/// entities fail when text is unescaped.
///
/// Only the root element name is taken from the schema. Element content, attributes
/// and child structure are not checked against it; callers needing that must map the
/// document to JSON and use a [`JsonValidator`].
#[derive(Debug, Clone, Default)]
pub struct XmlValidator {
    root: Option<String>,
}

impl XmlValidator {
    pub fn new(root: Option<String>) -> Self {
        XmlValidator { root }
    }

    pub fn validate(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let mut reader = Reader::from_str(raw);
        let mut depth = 0usize;
        let mut roots = 0usize;

        loop {
            match reader.read_event() {
                Ok(Event::DocType(_)) => {
                    return Err(xml_error("DOCTYPE declarations are not allowed"));
                }
                Ok(Event::Start(e)) => {
                    if depth == 0 {
                        roots += 1;
                        self.check_root(e.local_name().as_ref())?;
                    }
                    depth += 1;
                }
                Ok(Event::Empty(e)) => {
                    if depth == 0 {
                        roots += 1;
                        self.check_root(e.local_name().as_ref())?;
                    }
                }
                Ok(Event::End(_)) => depth = depth.saturating_sub(1),
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| xml_error(format!("bad character data: {e}")))?;
                    if depth == 0 && !text.trim().is_empty() {
                        return Err(xml_error("text outside the root element"));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(xml_error(format!(
                        "malformed at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if depth != 0 {
            return Err(xml_error("unclosed element at end of document"));
        }
        if roots != 1 {
            return Err(xml_error(format!("expected one root element, found {roots}")));
        }
        Ok(ParameterValue::String(raw.to_string()))
    }

    fn check_root(&self, name: &[u8]) -> Result<(), ValidationError> {
        match &self.root {
            Some(expected) if expected.as_bytes() != name => Err(xml_error(format!(
                "root element <{}> does not match <{expected}>",
                String::from_utf8_lossy(name)
            ))),
            _ => Ok(()),
        }
    }
}

fn xml_error(reason: impl fmt::Display) -> ValidationError {
    ValidationError::new(ErrorKind::InvalidXmlBody, format!("XML is invalid: {reason}"))
}
