use super::params::RequestParameters;
use super::raw::{parse_cookies, parse_query, values_for, RawRequest};
use super::rules::{
    compile_body, compile_parameter, media_essence, AdditionalPropertiesRule, Arity, BodyKind,
    BodyRules, RuleSource, ValidationRule,
};
use crate::deserializer::percent_decode;
use crate::error::{ErrorKind, ValidationError};
use crate::spec::{ParameterLocation, ParameterSpec, RequestBodySpec};
use crate::validator::{ValidatorFactory, ValidatorNode};
use crate::value::ParameterValue;
use http::HeaderMap;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Extra per-route check run after cookies and before the body.
///
/// Receives the parameters validated so far. Returning an error stops validation
/// like any other failure.
pub trait CustomValidator: Send + Sync {
    fn validate(
        &self,
        request: &RawRequest,
        parameters: &RequestParameters,
    ) -> Result<(), ValidationError>;
}

/// Validates requests for one route.
///
/// Built once from the route's parameter and body descriptions; `validate` only
/// reads the compiled rules.
#[derive(Clone, Default)]
pub struct RequestValidator {
    path: Vec<ValidationRule>,
    query: Vec<ValidationRule>,
    header: Vec<ValidationRule>,
    cookie: Vec<ValidationRule>,
    additional: Vec<AdditionalPropertiesRule>,
    body: Option<BodyRules>,
    custom: Vec<Arc<dyn CustomValidator>>,
}

impl fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator")
            .field("path", &self.path.len())
            .field("query", &self.query.len())
            .field("header", &self.header.len())
            .field("cookie", &self.cookie.len())
            .field("additional", &self.additional.len())
            .field("body", &self.body.is_some())
            .field("custom", &self.custom.len())
            .finish()
    }
}

type Found = Result<Option<Vec<String>>, ValidationError>;
type Lookup<'r> = dyn Fn(&str) -> Found + 'r;

impl RequestValidator {
    /// Compile rules for every parameter and the optional request body.
    pub fn compile(
        parameters: &[ParameterSpec],
        body: Option<&RequestBodySpec>,
        factory: &ValidatorFactory<'_>,
    ) -> Result<Self, ValidationError> {
        let mut validator = RequestValidator::default();
        for spec in parameters {
            let compiled = compile_parameter(spec, factory)?;
            let rules = match spec.location {
                ParameterLocation::Path => &mut validator.path,
                ParameterLocation::Query => &mut validator.query,
                ParameterLocation::Header => &mut validator.header,
                ParameterLocation::Cookie => &mut validator.cookie,
                ParameterLocation::BodyForm => {
                    return Err(ValidationError::unsupported("form parameter outside a request body")
                        .scoped(&spec.name, spec.location))
                }
            };
            rules.push(compiled.rule);
            validator.additional.extend(compiled.additional);
        }
        validator.body = body.map(|b| compile_body(b, factory)).transpose()?;
        Ok(validator)
    }

    pub fn with_custom(mut self, custom: Arc<dyn CustomValidator>) -> Self {
        self.custom.push(custom);
        self
    }

    pub fn rules(&self, location: ParameterLocation) -> &[ValidationRule] {
        match location {
            ParameterLocation::Path => &self.path,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.header,
            ParameterLocation::Cookie => &self.cookie,
            ParameterLocation::BodyForm => &[],
        }
    }

    pub fn body(&self) -> Option<&BodyRules> {
        self.body.as_ref()
    }

    /// Validate one request: path, query, header, cookie, custom checks, body.
    /// Stops at the first failure.
    pub fn validate(&self, request: &RawRequest) -> Result<RequestParameters, ValidationError> {
        let mut out = RequestParameters::new();
        match self.run(request, &mut out) {
            Ok(()) => Ok(out),
            Err(err) => {
                debug!(
                    kind = %err.kind,
                    parameter = err.parameter.as_deref().unwrap_or("-"),
                    location = %err.location.map_or_else(|| "-".to_string(), |l| l.to_string()),
                    "Request validation failed"
                );
                Err(err)
            }
        }
    }

    fn run(&self, req: &RawRequest, out: &mut RequestParameters) -> Result<(), ValidationError> {
        let path = |key: &str| -> Found { Ok(req.path_params.get(key).map(|v| vec![v.clone()])) };
        apply_all(&self.path, &path, out)?;

        let query = |key: &str| -> Found { Ok(values_for(&req.query, key)) };
        apply_all(&self.query, &query, out)?;
        self.apply_additional(ParameterLocation::Query, &req.query, &self.query, out)?;

        let header = |key: &str| header_values(&req.headers, key);
        apply_all(&self.header, &header, out)?;

        let cookies = parse_cookies(&req.cookie_header());
        let cookie = |key: &str| -> Found { Ok(values_for(&cookies, key)) };
        apply_all(&self.cookie, &cookie, out)?;
        self.apply_additional(ParameterLocation::Cookie, &cookies, &self.cookie, out)?;

        for custom in &self.custom {
            custom.validate(req, out)?;
        }

        match &self.body {
            Some(body) => validate_body(body, req, out),
            None => Ok(()),
        }
    }

    /// Fold keys no named rule claimed into each catch-all parameter of `location`.
    fn apply_additional(
        &self,
        location: ParameterLocation,
        entries: &[(String, String)],
        named: &[ValidationRule],
        out: &mut RequestParameters,
    ) -> Result<(), ValidationError> {
        let claimed: HashSet<&str> = named.iter().flat_map(ValidationRule::lookups).collect();
        for rule in self.additional.iter().filter(|r| r.location == location) {
            let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for (key, value) in entries {
                if claimed.contains(key.as_str()) {
                    continue;
                }
                if let Some(property) = rule.property(key) {
                    grouped.entry(property).or_default().push(value.clone());
                }
            }
            if grouped.is_empty() {
                continue;
            }
            let mut object = BTreeMap::new();
            for (property, values) in grouped {
                let value = rule.validator.validate_collection(&values).map_err(|e| {
                    ValidationError {
                        parameter: Some(rule.parameter.clone()),
                        location: Some(location),
                        ..e
                    }
                })?;
                object.insert(property.to_string(), value);
            }
            out.insert(location, rule.parameter.clone(), ParameterValue::Object(object));
        }
        Ok(())
    }
}

fn apply_all(
    rules: &[ValidationRule],
    lookup: &Lookup<'_>,
    out: &mut RequestParameters,
) -> Result<(), ValidationError> {
    for rule in rules {
        apply_rule(rule, lookup, out)?;
    }
    Ok(())
}

fn apply_rule(
    rule: &ValidationRule,
    lookup: &Lookup<'_>,
    out: &mut RequestParameters,
) -> Result<(), ValidationError> {
    let scope = |e: ValidationError| e.scoped(&rule.parameter, rule.location);
    match &rule.source {
        RuleSource::Value {
            lookup: key,
            validator,
            arity,
        } => {
            let Some(values) = lookup(key).map_err(scope)? else {
                return absent(rule, out);
            };
            if values.is_empty() {
                return Err(scope(ValidationError::no_match("", "no usable value")));
            }
            if rule.allow_empty && values.iter().all(String::is_empty) {
                out.insert(rule.location, rule.parameter.clone(), ParameterValue::String(String::new()));
                return Ok(());
            }
            let value = validate_values(rule, validator, *arity, &values).map_err(scope)?;
            out.insert(rule.location, rule.parameter.clone(), value);
            Ok(())
        }
        RuleSource::Fields(fields) => {
            let found = fields
                .iter()
                .map(|f| lookup(&f.lookup).map(|v| (f, v)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(scope)?;
            if found.iter().all(|(_, v)| v.is_none()) {
                return absent(rule, out);
            }

            let arity = if rule.location == ParameterLocation::Path {
                Arity::Scalar
            } else {
                Arity::Collection
            };
            let mut object = BTreeMap::new();
            for (field, values) in found {
                let field_scope = |e: ValidationError| e.scoped(&field.field, rule.location);
                match values {
                    Some(values) => {
                        let value = validate_values(rule, &field.validator, arity, &values)
                            .map_err(field_scope)?;
                        object.insert(field.field.clone(), value);
                    }
                    None => match &field.default {
                        Some(default) => {
                            object.insert(field.field.clone(), default.clone());
                        }
                        None if field.required => {
                            return Err(ValidationError::not_found(&field.field, rule.location));
                        }
                        None => {}
                    },
                }
            }
            out.insert(rule.location, rule.parameter.clone(), ParameterValue::Object(object));
            Ok(())
        }
    }
}

fn absent(rule: &ValidationRule, out: &mut RequestParameters) -> Result<(), ValidationError> {
    match &rule.default {
        Some(default) => {
            out.insert(rule.location, rule.parameter.clone(), default.clone());
            Ok(())
        }
        None if rule.required => Err(ValidationError::not_found(&rule.parameter, rule.location)),
        None => Ok(()),
    }
}

fn validate_values(
    rule: &ValidationRule,
    validator: &ValidatorNode,
    arity: Arity,
    values: &[String],
) -> Result<ParameterValue, ValidationError> {
    match arity {
        Arity::Scalar => {
            let raw = values.join(",");
            if rule.percent_decode {
                validator.validate_scalar(&decode(&raw)?)
            } else {
                validator.validate_scalar(&raw)
            }
        }
        Arity::Collection => validator.validate_collection(values),
        Arity::MatrixSegments => {
            let items = matrix_segments(&rule.parameter, &values.concat())?;
            validator.validate_collection(&items)
        }
    }
}

fn decode(raw: &str) -> Result<String, ValidationError> {
    percent_decode(raw)
        .map(|d| d.into_owned())
        .map_err(|e| ValidationError::deserialization(raw, e))
}

/// Values of `;name=a;name=b`, percent-decoded.
fn matrix_segments(name: &str, raw: &str) -> Result<Vec<String>, ValidationError> {
    let items = raw
        .split(';')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let value = segment
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
                .ok_or_else(|| {
                    ValidationError::deserialization(raw, format!("segment \"{segment}\" is not {name}=value"))
                })?;
            decode(value)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if items.is_empty() {
        return Err(ValidationError::no_match(raw, "no matrix segments"));
    }
    Ok(items)
}

/// All values of a header joined with `,`; lookup is case-insensitive.
fn header_values(headers: &HeaderMap, name: &str) -> Found {
    let mut parts = Vec::new();
    for value in headers.get_all(name) {
        let text = value.to_str().map_err(|_| {
            ValidationError::no_match(&String::from_utf8_lossy(value.as_bytes()), "header value is not visible ASCII")
        })?;
        parts.push(text.to_string());
    }
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(vec![parts.join(",")]))
    }
}

fn validate_body(
    body: &BodyRules,
    req: &RawRequest,
    out: &mut RequestParameters,
) -> Result<(), ValidationError> {
    let Some(content_type) = req.content_type() else {
        if body.required || body.has_files() {
            return Err(ValidationError::wrong_content_type(None, &body.declared()));
        }
        return Ok(());
    };
    let essence = media_essence(content_type);
    if body.has_files() && essence != "multipart/form-data" {
        return Err(ValidationError::wrong_content_type(
            Some(content_type),
            "multipart/form-data",
        ));
    }
    let Some(media) = body.for_media(&essence) else {
        if body.required {
            return Err(ValidationError::wrong_content_type(Some(content_type), &body.declared()));
        }
        debug!(content_type = %content_type, "Ignoring body with undeclared content type");
        return Ok(());
    };
    if req.body.is_empty() && !body.required && !matches!(media.kind, BodyKind::Multipart { .. }) {
        return Ok(());
    }

    match &media.kind {
        BodyKind::Json(validator) => {
            let text = std::str::from_utf8(&req.body).map_err(|e| {
                ValidationError::new(ErrorKind::InvalidJsonBody, format!("body is not UTF-8: {e}"))
            })?;
            out.body = Some(validator.validate(text)?);
        }
        BodyKind::Xml(validator) => {
            let text = std::str::from_utf8(&req.body).map_err(|e| {
                ValidationError::new(ErrorKind::InvalidXmlBody, format!("body is not UTF-8: {e}"))
            })?;
            out.body = Some(validator.validate(text)?);
        }
        BodyKind::UrlEncoded(rules) => {
            let parsed;
            let form = if req.form.is_empty() {
                parsed = parse_query(&String::from_utf8_lossy(&req.body));
                &parsed
            } else {
                &req.form
            };
            let lookup = |key: &str| -> Found { Ok(values_for(form, key)) };
            apply_all(rules, &lookup, out)?;
        }
        BodyKind::Multipart { fields, files } => {
            let lookup = |key: &str| -> Found { Ok(values_for(&req.form, key)) };
            apply_all(fields, &lookup, out)?;
            for rule in files {
                let upload = req
                    .files
                    .iter()
                    .find(|f| f.name == rule.name && rule.accepts(&f.content_type));
                match upload {
                    Some(file) => out.insert(
                        ParameterLocation::BodyForm,
                        rule.name.clone(),
                        ParameterValue::String(file.filename.clone()),
                    ),
                    None if rule.required => {
                        return Err(ValidationError::file_not_found(&rule.name, &rule.pattern_src))
                    }
                    None => {}
                }
            }
        }
        BodyKind::Raw => match std::str::from_utf8(&req.body) {
            Ok(text) => out.body = Some(ParameterValue::String(text.to_string())),
            Err(e) => {
                debug!(
                    content_type = %content_type,
                    bytes = req.body.len(),
                    error = %e,
                    "Body is not UTF-8, leaving it unrecorded"
                );
                out.body = None;
            }
        },
    }
    Ok(())
}
