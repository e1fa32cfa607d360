use super::schema::merge_all_of;
use super::types::{
    ContentSpec, EncodingSpec, MediaTypeSpec, ParameterLocation, ParameterSpec, ParameterStyle,
    RequestBodySpec, RouteMeta,
};
use super::SecurityRequirement;
use anyhow::{anyhow, bail, Context};
use oas3::OpenApiV3Spec;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Header parameters OAS says to ignore; they are owned by content negotiation and auth.
const IGNORED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Expands local `$ref`s of one operation.
///
/// A reference met again while it is being expanded is a cycle. The cycle is cut by
/// pointing at `#/definitions/<Name>`, and the fully expanded schema is kept in the
/// operation's definitions bundle.
pub struct RefResolver<'a> {
    doc: &'a Value,
    stack: Vec<String>,
    recursive: HashSet<String>,
    definitions: Map<String, Value>,
}

impl<'a> RefResolver<'a> {
    pub fn new(doc: &'a Value) -> Self {
        RefResolver {
            doc,
            stack: Vec::new(),
            recursive: HashSet::new(),
            definitions: Map::new(),
        }
    }

    /// Target of a local reference such as `#/components/schemas/Pet`.
    pub fn lookup(&self, ref_path: &str) -> anyhow::Result<&'a Value> {
        let pointer = ref_path
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("external reference {ref_path} is not supported"))?;
        self.doc
            .pointer(pointer)
            .ok_or_else(|| anyhow!("unresolved reference {ref_path}"))
    }

    /// Follow `$ref` chains on an object (parameters, request bodies) without
    /// expanding its contents.
    pub fn follow<'v>(&self, value: &'v Value) -> anyhow::Result<&'v Value>
    where
        'a: 'v,
    {
        let mut current = value;
        let mut seen = HashSet::new();
        while let Some(ref_path) = current.get("$ref").and_then(Value::as_str) {
            if !seen.insert(ref_path) {
                bail!("reference cycle through {ref_path}");
            }
            current = self.lookup(ref_path)?;
        }
        Ok(current)
    }

    /// Deep copy of `value` with every reference expanded.
    pub fn expand(&mut self, value: &Value) -> anyhow::Result<Value> {
        match value {
            Value::Object(obj) => {
                if let Some(ref_path) = obj.get("$ref").and_then(Value::as_str) {
                    return self.expand_ref(ref_path);
                }
                let mut out = Map::with_capacity(obj.len());
                for (k, v) in obj {
                    out.insert(k.clone(), self.expand(v)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|v| self.expand(v))
                .collect::<anyhow::Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn expand_ref(&mut self, ref_path: &str) -> anyhow::Result<Value> {
        let name = definition_name(ref_path);
        if self.stack.iter().any(|r| r == ref_path) {
            self.recursive.insert(ref_path.to_string());
            return Ok(serde_json::json!({ "$ref": format!("#/definitions/{name}") }));
        }
        let target = self.lookup(ref_path)?;
        self.stack.push(ref_path.to_string());
        let expanded = self.expand(target);
        self.stack.pop();

        let mut expanded = expanded?;
        if let (Some(schema_name), Value::Object(obj)) =
            (ref_path.strip_prefix("#/components/schemas/"), &mut expanded)
        {
            obj.insert("x-ref-name".to_string(), Value::String(schema_name.to_string()));
        }
        if self.recursive.contains(ref_path) {
            self.definitions.insert(name.to_string(), expanded.clone());
        }
        Ok(expanded)
    }

    /// Bundle of recursive schemas, `None` when nothing recursed.
    pub fn into_definitions(self) -> Option<Value> {
        if self.definitions.is_empty() {
            None
        } else {
            Some(Value::Object(self.definitions))
        }
    }
}

fn definition_name(ref_path: &str) -> &str {
    ref_path.rsplit('/').next().unwrap_or(ref_path)
}

/// Rewrite OAS 3.0 boolean `exclusiveMinimum`/`exclusiveMaximum` into the numeric
/// form: `{maximum: 100, exclusiveMaximum: true}` becomes `{exclusiveMaximum: 100}`.
pub fn normalize_exclusive_bounds(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            for (exclusive, bound) in [("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")] {
                match obj.get(exclusive) {
                    Some(Value::Bool(true)) => match obj.remove(bound) {
                        Some(limit) => {
                            obj.insert(exclusive.to_string(), limit);
                        }
                        None => {
                            obj.remove(exclusive);
                        }
                    },
                    Some(Value::Bool(false)) => {
                        obj.remove(exclusive);
                    }
                    _ => {}
                }
            }
            for v in obj.values_mut() {
                normalize_exclusive_bounds(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_exclusive_bounds),
        _ => {}
    }
}

/// Resolve one parameter object into a [`ParameterSpec`] with OAS defaults applied.
pub fn extract_parameter(resolver: &mut RefResolver<'_>, raw: &Value) -> anyhow::Result<ParameterSpec> {
    let param = resolver.follow(raw)?;
    let name = param
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("parameter without a name"))?;
    let location_str = param.get("in").and_then(Value::as_str).unwrap_or_default();
    let location = ParameterLocation::from_oas(location_str)
        .ok_or_else(|| anyhow!("parameter \"{name}\" has unknown location \"{location_str}\""))?;

    let content = match param.get("content").and_then(Value::as_object) {
        Some(media) => match media.iter().next() {
            Some((media_type, body)) => Some(ContentSpec {
                media_type: media_type.clone(),
                schema: body.get("schema").map(|s| resolver.expand(s)).transpose()?,
            }),
            None => None,
        },
        None => None,
    };
    let schema = match (param.get("schema"), &content) {
        (Some(schema), _) => merge_all_of(&resolver.expand(schema)?),
        (None, Some(content)) => content.schema.clone().unwrap_or_else(|| serde_json::json!({})),
        (None, None) => serde_json::json!({}),
    };

    let mut spec = ParameterSpec::new(name, location, schema);
    if let Some(style) = param.get("style").and_then(Value::as_str) {
        let style = ParameterStyle::from_oas(style)
            .ok_or_else(|| anyhow!("parameter \"{name}\" has unknown style \"{style}\""))?;
        spec = spec.with_style(style);
    }
    let explode = param
        .get("explode")
        .and_then(Value::as_bool)
        .unwrap_or(spec.style == ParameterStyle::Form);
    let flag = |key: &str| param.get(key).and_then(Value::as_bool).unwrap_or(false);

    let mut spec = spec
        .with_explode(explode)
        .required(flag("required"))
        .allow_empty(flag("allowEmptyValue"));
    spec.allow_reserved = flag("allowReserved");
    spec.content = content;
    Ok(spec)
}

/// Path-item parameters overlaid by operation parameters with the same name and location.
pub fn merge_parameters(path_level: Vec<ParameterSpec>, operation: Vec<ParameterSpec>) -> Vec<ParameterSpec> {
    let mut merged = path_level;
    for param in operation {
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(slot) => *slot = param,
            None => merged.push(param),
        }
    }
    merged
        .into_iter()
        .filter(|p| {
            let ignored = p.location == ParameterLocation::Header
                && IGNORED_HEADERS.contains(&p.name.to_ascii_lowercase().as_str());
            if ignored {
                warn!(parameter = %p.name, "Ignoring reserved header parameter");
            }
            !ignored
        })
        .collect()
}

fn extract_parameters(resolver: &mut RefResolver<'_>, list: Option<&Value>) -> anyhow::Result<Vec<ParameterSpec>> {
    list.and_then(Value::as_array)
        .map(|items| items.iter().map(|p| extract_parameter(resolver, p)).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}

/// Request body with every schema expanded.
pub fn extract_request_body(
    resolver: &mut RefResolver<'_>,
    raw: &Value,
) -> anyhow::Result<RequestBodySpec> {
    let body = resolver.follow(raw)?;
    let mut content = Vec::new();
    if let Some(media) = body.get("content").and_then(Value::as_object) {
        for (media_type, entry) in media {
            let schema = entry.get("schema").map(|s| resolver.expand(s)).transpose()?;
            let encoding: BTreeMap<String, EncodingSpec> = entry
                .get("encoding")
                .and_then(Value::as_object)
                .map(|enc| {
                    enc.iter()
                        .map(|(prop, e)| {
                            let content_type = e
                                .get("contentType")
                                .and_then(Value::as_str)
                                .map(str::to_string);
                            (prop.clone(), EncodingSpec { content_type })
                        })
                        .collect()
                })
                .unwrap_or_default();
            content.push(MediaTypeSpec {
                media_type: media_type.clone(),
                schema,
                encoding,
            });
        }
    }
    Ok(RequestBodySpec {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        content,
    })
}

/// `x-handler*` extension, else `operationId`.
fn resolve_handler_name(raw_operation: &Value, operation_id: Option<&str>) -> Option<String> {
    raw_operation
        .as_object()
        .and_then(|obj| {
            obj.iter().find_map(|(key, val)| match val {
                Value::String(s) if key.starts_with("x-handler") => Some(s.clone()),
                _ => None,
            })
        })
        .or_else(|| operation_id.map(str::to_string))
}

fn extract_security(raw: Option<&Value>) -> anyhow::Result<Option<Vec<SecurityRequirement>>> {
    raw.map(|v| serde_json::from_value(v.clone()).context("invalid security requirement"))
        .transpose()
}

/// Build one [`RouteMeta`] per (path, method).
///
/// `spec` drives iteration; `doc` is the same document as raw JSON and is where
/// parameters, bodies and schemas are read from so references resolve against it.
///
/// # Errors
///
/// Every operation without `operationId` or `x-handler-*`, and every unresolvable
/// reference, is collected and reported in one error.
pub fn build_routes(spec: &OpenApiV3Spec, doc: &Value) -> anyhow::Result<Vec<RouteMeta>> {
    let mut routes = Vec::new();
    let mut issues = Vec::new();
    let global_security = extract_security(doc.get("security"))?.unwrap_or_default();

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            let raw_item = doc
                .get("paths")
                .and_then(|p| p.get(path))
                .unwrap_or(&Value::Null);
            for (method, operation) in item.methods() {
                let location = format!("{path} {method}");
                let raw_operation = raw_item
                    .get(method.as_str().to_ascii_lowercase())
                    .unwrap_or(&Value::Null);

                let Some(handler_name) =
                    resolve_handler_name(raw_operation, operation.operation_id.as_deref())
                else {
                    issues.push(format!("{location}: missing operationId or x-handler-* extension"));
                    continue;
                };

                let mut resolver = RefResolver::new(doc);
                let built = (|| -> anyhow::Result<RouteMeta> {
                    let parameters = merge_parameters(
                        extract_parameters(&mut resolver, raw_item.get("parameters"))?,
                        extract_parameters(&mut resolver, raw_operation.get("parameters"))?,
                    );
                    let request_body = raw_operation
                        .get("requestBody")
                        .map(|b| extract_request_body(&mut resolver, b))
                        .transpose()?;
                    let security = extract_security(raw_operation.get("security"))?
                        .unwrap_or_else(|| global_security.clone());
                    Ok(RouteMeta {
                        method: method.clone(),
                        path_pattern: Arc::from(path.as_str()),
                        handler_name: Arc::from(handler_name.as_str()),
                        parameters,
                        request_body,
                        security,
                        definitions: None,
                    })
                })();

                match built {
                    Ok(mut route) => {
                        route.definitions = resolver.into_definitions();
                        routes.push(route);
                    }
                    Err(e) => issues.push(format!("{location}: {e:#}")),
                }
            }
        }
    }

    if !issues.is_empty() {
        bail!("invalid API description:\n  {}", issues.join("\n  "));
    }
    Ok(routes)
}
