//! Array, object and composed (`anyOf`/`oneOf`) validators.

use super::ValidatorNode;
use crate::deserializer::Splitter;
use crate::error::{ErrorKind, ValidationError};
use crate::value::ParameterValue;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ArrayValidator {
    items: Box<ValidatorNode>,
    splitter: Splitter,
    exploded: bool,
    min_items: Option<usize>,
    max_items: Option<usize>,
    unique: bool,
}

impl ArrayValidator {
    pub fn new(items: ValidatorNode, splitter: Splitter, exploded: bool) -> Self {
        ArrayValidator {
            items: Box::new(items),
            splitter,
            exploded,
            min_items: None,
            max_items: None,
            unique: false,
        }
    }

    pub fn with_size(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    pub fn with_unique_items(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Deserialize one delimited string, then validate element-wise.
    pub fn validate_scalar(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let tokens = self.splitter.split_array(raw)?;
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token {
                Some(t) => out.push(self.items.validate_scalar(&t)?),
                None => out.push(ParameterValue::Null),
            }
        }
        self.finish(out)
    }

    /// Exploded input arrives as one string per occurrence.
    pub fn validate_collection(&self, values: &[String]) -> Result<ParameterValue, ValidationError> {
        if !self.exploded {
            return match values {
                [single] => self.validate_scalar(single),
                _ => Err(ValidationError::unexpected_array(values.len())),
            };
        }
        let mut out = Vec::with_capacity(values.len());
        for v in values {
            out.push(self.items.validate_scalar(v)?);
        }
        self.finish(out)
    }

    fn finish(&self, items: Vec<ParameterValue>) -> Result<ParameterValue, ValidationError> {
        let len = items.len();
        if self.min_items.is_some_and(|min| len < min) || self.max_items.is_some_and(|max| len > max)
        {
            return Err(ValidationError::array_size(len, self.min_items, self.max_items));
        }
        if self.unique {
            let mut seen = HashSet::with_capacity(len);
            for (i, item) in items.iter().enumerate() {
                if !seen.insert(item.to_json().to_string()) {
                    return Err(ValidationError::new(
                        ErrorKind::NoMatch,
                        format!("Array items must be unique, item {i} is repeated"),
                    ));
                }
            }
        }
        Ok(ParameterValue::Array(items))
    }
}

/// One declared object property.
#[derive(Debug, Clone)]
pub struct ObjectField {
    pub validator: ValidatorNode,
    pub required: bool,
    pub default: Option<ParameterValue>,
}

#[derive(Debug, Clone)]
pub struct ObjectValidator {
    fields: Vec<(String, ObjectField)>,
    additional: Option<Box<ValidatorNode>>,
    splitter: Splitter,
}

impl ObjectValidator {
    pub fn new(splitter: Splitter) -> Self {
        ObjectValidator {
            fields: Vec::new(),
            additional: None,
            splitter,
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: ObjectField) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn additional_properties(mut self, validator: ValidatorNode) -> Self {
        self.additional = Some(Box::new(validator));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ObjectField)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn validate_scalar(&self, raw: &str) -> Result<ParameterValue, ValidationError> {
        let mut entries: BTreeMap<String, Option<String>> =
            self.splitter.split_object(raw)?.into_iter().collect();
        let mut out = BTreeMap::new();

        for (name, field) in &self.fields {
            match entries.remove(name) {
                Some(Some(v)) => {
                    let value = field
                        .validator
                        .validate_scalar(&v)
                        .map_err(|e| e.with_parameter(name.clone()))?;
                    out.insert(name.clone(), value);
                }
                Some(None) => {
                    out.insert(name.clone(), ParameterValue::Null);
                }
                None => {
                    if let Some(default) = &field.default {
                        out.insert(name.clone(), default.clone());
                    } else if field.required {
                        return Err(ValidationError::new(
                            ErrorKind::NotFound,
                            format!("Object field \"{name}\" not found"),
                        )
                        .with_parameter(name.clone()));
                    }
                }
            }
        }

        for (key, value) in entries {
            match &self.additional {
                Some(validator) => {
                    let v = match value {
                        Some(v) => validator
                            .validate_scalar(&v)
                            .map_err(|e| e.with_parameter(key.clone()))?,
                        None => ParameterValue::Null,
                    };
                    out.insert(key, v);
                }
                None => debug!(key = %key, "Ignoring undeclared object key"),
            }
        }

        Ok(ParameterValue::Object(out))
    }
}

/// `anyOf` and `oneOf`: candidates tried in order, first success wins.
#[derive(Debug, Clone)]
pub struct CompositeValidator {
    keyword: &'static str,
    candidates: Vec<ValidatorNode>,
}

impl CompositeValidator {
    pub fn new(keyword: &'static str, candidates: Vec<ValidatorNode>) -> Self {
        CompositeValidator {
            keyword,
            candidates,
        }
    }

    pub fn validate_with<F>(&self, raw: &str, mut attempt: F) -> Result<ParameterValue, ValidationError>
    where
        F: FnMut(&ValidatorNode) -> Result<ParameterValue, ValidationError>,
    {
        for candidate in &self.candidates {
            if let Ok(value) = attempt(candidate) {
                return Ok(value);
            }
        }
        Err(ValidationError::no_match(
            raw,
            format!("no {} alternative accepted the value", self.keyword),
        ))
    }
}
