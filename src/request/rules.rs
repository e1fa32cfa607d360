//! Compilation of parameter and body descriptions into validation rules.

use crate::deserializer::{ContainerStyle, Splitter};
use crate::error::ValidationError;
use crate::spec::{
    merge_all_of, object_properties, required_fields, schema_type, MediaTypeSpec,
    ParameterLocation, ParameterSpec, RequestBodySpec,
};
use crate::validator::{
    plan, FieldKey, JsonValidator, RulePlan, ValidatorFactory, ValidatorNode, XmlValidator,
};
use crate::value::ParameterValue;
use regex::Regex;
use serde_json::{json, Value};

/// How raw occurrences reach the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One raw string (path segment, joined header value)
    Scalar,
    /// Every occurrence of a repeatable key
    Collection,
    /// A matrix group of repeated `;name=value` segments
    MatrixSegments,
}

/// One declared field of an exploded object parameter.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    /// Raw key: the field name, or `name[field]` for deepObject
    pub lookup: String,
    pub validator: ValidatorNode,
    pub required: bool,
    pub default: Option<ParameterValue>,
}

#[derive(Debug, Clone)]
pub enum RuleSource {
    /// The whole value is read from one key
    Value {
        lookup: String,
        validator: ValidatorNode,
        arity: Arity,
    },
    /// Exploded object: one key per declared field
    Fields(Vec<FieldRule>),
}

/// Binds one parameter to the validators that produce its value.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub parameter: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub allow_empty: bool,
    /// Raw scalars are percent-decoded before validation (path values that are
    /// not split by a container validator)
    pub percent_decode: bool,
    pub default: Option<ParameterValue>,
    pub source: RuleSource,
}

impl ValidationRule {
    /// Raw keys this rule reads.
    pub fn lookups(&self) -> Vec<&str> {
        match &self.source {
            RuleSource::Value { lookup, .. } => vec![lookup.as_str()],
            RuleSource::Fields(fields) => fields.iter().map(|f| f.lookup.as_str()).collect(),
        }
    }
}

/// Catch-all for keys no named rule claims, folded into `parameter`.
#[derive(Debug, Clone)]
pub struct AdditionalPropertiesRule {
    pub parameter: String,
    pub location: ParameterLocation,
    pub key: FieldKey,
    pub validator: ValidatorNode,
}

impl AdditionalPropertiesRule {
    /// Property name for a raw key, `None` when the key is not this rule's to claim.
    pub fn property<'k>(&self, raw_key: &'k str) -> Option<&'k str> {
        match self.key {
            FieldKey::Plain => Some(raw_key),
            FieldKey::DeepObject => raw_key
                .strip_prefix(self.parameter.as_str())
                .and_then(|rest| rest.strip_prefix('['))
                .and_then(|rest| rest.strip_suffix(']'))
                .filter(|inner| !inner.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledParameter {
    pub rule: ValidationRule,
    pub additional: Option<AdditionalPropertiesRule>,
}

/// A multipart part that must arrive as an uploaded file.
#[derive(Debug, Clone)]
pub struct FileRule {
    pub name: String,
    pub pattern: Regex,
    /// Declared content-type list the pattern was built from
    pub pattern_src: String,
    pub required: bool,
}

impl FileRule {
    pub fn accepts(&self, content_type: &str) -> bool {
        self.pattern.is_match(&media_essence(content_type))
    }
}

#[derive(Debug, Clone)]
pub enum BodyKind {
    Json(JsonValidator),
    Xml(XmlValidator),
    UrlEncoded(Vec<ValidationRule>),
    Multipart {
        fields: Vec<ValidationRule>,
        files: Vec<FileRule>,
    },
    /// Declared media type without structural checks; UTF-8 bodies are kept as text
    Raw,
}

#[derive(Debug, Clone)]
pub struct MediaRule {
    pub media_type: String,
    pub kind: BodyKind,
}

#[derive(Debug, Clone)]
pub struct BodyRules {
    pub required: bool,
    pub media: Vec<MediaRule>,
}

impl BodyRules {
    /// Rule for the request's media type essence, exact matches first.
    pub fn for_media(&self, essence: &str) -> Option<&MediaRule> {
        self.media
            .iter()
            .find(|m| m.media_type == essence)
            .or_else(|| self.media.iter().find(|m| media_matches(&m.media_type, essence)))
    }

    pub fn has_files(&self) -> bool {
        self.media
            .iter()
            .any(|m| matches!(&m.kind, BodyKind::Multipart { files, .. } if !files.is_empty()))
    }

    pub fn declared(&self) -> String {
        self.media
            .iter()
            .map(|m| m.media_type.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lowercased media type without parameters.
pub fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub fn is_json_media(essence: &str) -> bool {
    essence == "application/json" || essence.ends_with("+json")
}

pub fn is_xml_media(essence: &str) -> bool {
    essence == "application/xml" || essence == "text/xml" || essence.ends_with("+xml")
}

/// `*/*` and `type/*` ranges match any subtype.
fn media_matches(declared: &str, actual: &str) -> bool {
    if declared == actual || declared == "*/*" {
        return true;
    }
    match declared.strip_suffix("/*") {
        Some(prefix) => actual.split('/').next() == Some(prefix),
        None => false,
    }
}

/// Compile one parameter through the style dispatch table.
///
/// # Errors
///
/// `UNSUPPORTED_FEATURE` for `allowReserved`, a style outside its location, or a
/// `(style, explode, kind)` cell the table does not define; `INVALID_SCHEMA` for
/// bad patterns, enum literals or defaults.
pub fn compile_parameter(
    spec: &ParameterSpec,
    factory: &ValidatorFactory<'_>,
) -> Result<CompiledParameter, ValidationError> {
    let scope = |e: ValidationError| e.scoped(&spec.name, spec.location);

    if spec.allow_reserved {
        return Err(scope(ValidationError::unsupported("allowReserved")));
    }
    if !spec.style.allowed_in(spec.location) {
        return Err(scope(ValidationError::unsupported(format!(
            "style {} for {} parameters",
            spec.style, spec.location
        ))));
    }

    let path = spec.location == ParameterLocation::Path;
    let scalar_arity = if matches!(spec.location, ParameterLocation::Path | ParameterLocation::Header) {
        Arity::Scalar
    } else {
        Arity::Collection
    };

    if let Some(content) = &spec.content {
        let schema = content.schema.clone().unwrap_or_else(|| json!({}));
        let validator = if is_json_media(&media_essence(&content.media_type)) {
            ValidatorNode::Json(factory.json(&schema).map_err(scope)?)
        } else {
            factory.scalar(&json!({"type": "string"})).map_err(scope)?
        };
        return Ok(CompiledParameter {
            rule: ValidationRule {
                parameter: spec.name.clone(),
                location: spec.location,
                required: spec.required,
                allow_empty: spec.allow_empty,
                percent_decode: path,
                default: None,
                source: RuleSource::Value {
                    lookup: spec.name.clone(),
                    validator,
                    arity: scalar_arity,
                },
            },
            additional: None,
        });
    }

    let rule_plan = plan(spec.style, spec.explode, spec.kind).ok_or_else(|| {
        scope(ValidationError::unsupported(format!(
            "style {} with explode={} for {:?} schema",
            spec.style, spec.explode, spec.kind
        )))
    })?;
    let schema = merge_all_of(&spec.schema);
    let value_rule = |validator: ValidatorNode, arity: Arity| -> Result<ValidationRule, ValidationError> {
        let default = factory.default_value(&validator, spec.default.as_ref())?;
        Ok(ValidationRule {
            parameter: spec.name.clone(),
            location: spec.location,
            required: spec.required,
            allow_empty: spec.allow_empty,
            percent_decode: path && !spec.kind.is_container(),
            default,
            source: RuleSource::Value {
                lookup: spec.name.clone(),
                validator,
                arity,
            },
        })
    };

    let compiled = match rule_plan {
        RulePlan::Single(style) => {
            let splitter = Splitter::new(style).decoding(path && spec.kind.is_container());
            let node = factory.node(&schema, splitter, false).map_err(scope)?;
            CompiledParameter {
                rule: value_rule(node, scalar_arity).map_err(scope)?,
                additional: None,
            }
        }
        RulePlan::ExplodedList => {
            let node = factory
                .node(&schema, Splitter::new(ContainerStyle::Comma), true)
                .map_err(scope)?;
            CompiledParameter {
                rule: value_rule(node, Arity::Collection).map_err(scope)?,
                additional: None,
            }
        }
        RulePlan::MatrixExplodedArray => {
            let node = factory
                .node(&schema, Splitter::new(ContainerStyle::Comma), true)
                .map_err(scope)?;
            CompiledParameter {
                rule: ValidationRule {
                    percent_decode: true,
                    ..value_rule(node, Arity::MatrixSegments).map_err(scope)?
                },
                additional: None,
            }
        }
        RulePlan::ExplodedFields(key) => {
            let fields = factory
                .object_fields(&schema)
                .map_err(scope)?
                .into_iter()
                .map(|(field, f)| FieldRule {
                    lookup: key.key(&spec.name, &field),
                    field,
                    validator: f.validator,
                    required: f.required,
                    default: f.default,
                })
                .collect();
            let additional = if path {
                None
            } else {
                factory
                    .additional_properties(&schema)
                    .map_err(scope)?
                    .map(|validator| AdditionalPropertiesRule {
                        parameter: spec.name.clone(),
                        location: spec.location,
                        key,
                        validator,
                    })
            };
            let default = spec.default.as_ref().map(ParameterValue::from_json);
            CompiledParameter {
                rule: ValidationRule {
                    parameter: spec.name.clone(),
                    location: spec.location,
                    required: spec.required,
                    allow_empty: false,
                    percent_decode: path,
                    default,
                    source: RuleSource::Fields(fields),
                },
                additional,
            }
        }
    };
    Ok(compiled)
}

/// Compile every declared media type of a request body.
pub fn compile_body(
    body: &RequestBodySpec,
    factory: &ValidatorFactory<'_>,
) -> Result<BodyRules, ValidationError> {
    let media = body
        .content
        .iter()
        .map(|m| compile_media(m, factory))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BodyRules {
        required: body.required,
        media,
    })
}

fn compile_media(media: &MediaTypeSpec, factory: &ValidatorFactory<'_>) -> Result<MediaRule, ValidationError> {
    let essence = media_essence(&media.media_type);
    let empty = json!({});
    let schema = media.schema.as_ref().unwrap_or(&empty);

    let kind = if is_json_media(&essence) {
        BodyKind::Json(factory.json(schema)?)
    } else if is_xml_media(&essence) {
        BodyKind::Xml(factory.xml(media.schema.as_ref()))
    } else if essence == "application/x-www-form-urlencoded" {
        BodyKind::UrlEncoded(form_rules(schema, factory, |_, _| Ok(PartKind::Text))?.0)
    } else if essence == "multipart/form-data" {
        let (fields, files) = form_rules(schema, factory, |name, prop| {
            let list = media
                .encoding
                .get(name)
                .and_then(|e| e.content_type.clone())
                .unwrap_or_else(|| default_part_type(prop).to_string());
            let pattern = content_type_pattern(&list)?;
            Ok(if pattern.is_match("application/json") {
                PartKind::Json
            } else if pattern.is_match("text/plain") {
                PartKind::Text
            } else {
                PartKind::File(pattern, list)
            })
        })?;
        BodyKind::Multipart { fields, files }
    } else {
        BodyKind::Raw
    };
    Ok(MediaRule {
        media_type: essence,
        kind,
    })
}

enum PartKind {
    Text,
    Json,
    File(Regex, String),
}

fn form_rules<F>(
    schema: &Value,
    factory: &ValidatorFactory<'_>,
    mut classify: F,
) -> Result<(Vec<ValidationRule>, Vec<FileRule>), ValidationError>
where
    F: FnMut(&str, &Value) -> Result<PartKind, ValidationError>,
{
    let required = required_fields(schema);
    let mut rules = Vec::new();
    let mut files = Vec::new();

    for (name, prop) in object_properties(schema) {
        let is_required = required.contains(&name);
        let scope = |e: ValidationError| e.scoped(&name, ParameterLocation::BodyForm);
        match classify(&name, &prop).map_err(scope)? {
            PartKind::Text => {
                let spec = ParameterSpec::new(name.clone(), ParameterLocation::BodyForm, prop)
                    .with_explode(false)
                    .required(is_required);
                rules.push(compile_parameter(&spec, factory)?.rule);
            }
            PartKind::Json => rules.push(ValidationRule {
                parameter: name.clone(),
                location: ParameterLocation::BodyForm,
                required: is_required,
                allow_empty: false,
                percent_decode: false,
                default: None,
                source: RuleSource::Value {
                    lookup: name.clone(),
                    validator: ValidatorNode::Json(factory.json(&prop).map_err(scope)?),
                    arity: Arity::Collection,
                },
            }),
            PartKind::File(pattern, pattern_src) => files.push(FileRule {
                name: name.clone(),
                pattern,
                pattern_src,
                required: is_required,
            }),
        }
    }
    Ok((rules, files))
}

/// Part content type implied by a property schema.
fn default_part_type(schema: &Value) -> &'static str {
    match schema_type(schema) {
        Some("object") => "application/json",
        Some("array") => schema
            .get("items")
            .map_or("text/plain", default_part_type),
        Some("string") => {
            let format = schema.get("format").and_then(Value::as_str);
            let encoding = schema.get("contentEncoding").and_then(Value::as_str);
            if matches!(format, Some("binary") | Some("base64")) || encoding == Some("base64") {
                "application/octet-stream"
            } else {
                "text/plain"
            }
        }
        _ => "text/plain",
    }
}

/// Regex for an `encoding.contentType` list such as `image/png, image/*`.
fn content_type_pattern(list: &str) -> Result<Regex, ValidationError> {
    let alternatives: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| regex::escape(&entry.to_ascii_lowercase()).replace(r"\*", ".*"))
        .collect();
    if alternatives.is_empty() {
        return Err(ValidationError::invalid_schema("empty encoding contentType"));
    }
    Regex::new(&format!("^(?:{})$", alternatives.join("|")))
        .map_err(|e| ValidationError::invalid_schema(format!("contentType \"{list}\": {e}")))
}
