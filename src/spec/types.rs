use super::SecurityRequirement;
use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Fields of an `application/x-www-form-urlencoded` or `multipart/form-data` body
    BodyForm,
}

impl ParameterLocation {
    /// Parse the OAS `in` value. `BodyForm` never appears in a parameter object.
    pub fn from_oas(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
            ParameterLocation::BodyForm => write!(f, "form"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    pub fn from_oas(s: &str) -> Option<Self> {
        match s {
            "matrix" => Some(ParameterStyle::Matrix),
            "label" => Some(ParameterStyle::Label),
            "form" => Some(ParameterStyle::Form),
            "simple" => Some(ParameterStyle::Simple),
            "spaceDelimited" => Some(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Some(ParameterStyle::PipeDelimited),
            "deepObject" => Some(ParameterStyle::DeepObject),
            _ => None,
        }
    }

    /// OAS default: `form` for query and cookie, `simple` for path and header.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query | ParameterLocation::Cookie | ParameterLocation::BodyForm => {
                ParameterStyle::Form
            }
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
        }
    }

    /// Whether OAS allows this style for the given location.
    pub fn allowed_in(&self, location: ParameterLocation) -> bool {
        use ParameterLocation as L;
        match self {
            ParameterStyle::Matrix | ParameterStyle::Label => location == L::Path,
            ParameterStyle::Simple => matches!(location, L::Path | L::Header),
            ParameterStyle::Form => matches!(location, L::Query | L::Cookie | L::BodyForm),
            ParameterStyle::SpaceDelimited
            | ParameterStyle::PipeDelimited
            | ParameterStyle::DeepObject => matches!(location, L::Query | L::BodyForm),
        }
    }
}

impl std::fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
}

/// Coarse shape of a parameter schema, the third key of the style dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Primitive(PrimitiveType),
    Array,
    Object,
    AnyOf,
    OneOf,
}

impl SchemaKind {
    /// Classify a (resolved) schema. Missing `type` is treated as a string.
    pub fn of(schema: &Value) -> Self {
        if schema.get("anyOf").is_some() {
            return SchemaKind::AnyOf;
        }
        if schema.get("oneOf").is_some() {
            return SchemaKind::OneOf;
        }
        if schema.get("allOf").is_some() {
            return SchemaKind::Object;
        }
        match schema_type(schema) {
            Some("array") => SchemaKind::Array,
            Some("object") => SchemaKind::Object,
            Some("integer") => SchemaKind::Primitive(PrimitiveType::Integer),
            Some("number") => SchemaKind::Primitive(PrimitiveType::Number),
            Some("boolean") => SchemaKind::Primitive(PrimitiveType::Boolean),
            _ if schema.get("properties").is_some() => SchemaKind::Object,
            _ if schema.get("items").is_some() => SchemaKind::Array,
            _ => SchemaKind::Primitive(PrimitiveType::String),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, SchemaKind::Array | SchemaKind::Object)
    }
}

/// The `type` keyword, tolerating the OAS 3.1 `["string", "null"]` form.
pub fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// A media type declared by a parameter's `content` map.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSpec {
    pub media_type: String,
    pub schema: Option<Value>,
}

/// A fully resolved parameter description. Built once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub style: ParameterStyle,
    pub explode: bool,
    pub kind: SchemaKind,
    pub required: bool,
    pub allow_empty: bool,
    pub allow_reserved: bool,
    pub default: Option<Value>,
    /// Resolved schema (`$ref`s inlined, `allOf` merged)
    pub schema: Value,
    pub content: Option<ContentSpec>,
}

impl ParameterSpec {
    /// Build a parameter with OAS defaults for style, explode and required.
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: Value) -> Self {
        let style = ParameterStyle::default_for(location);
        let kind = SchemaKind::of(&schema);
        let default = schema.get("default").cloned();
        ParameterSpec {
            name: name.into(),
            location,
            style,
            explode: style == ParameterStyle::Form,
            kind,
            required: location == ParameterLocation::Path,
            allow_empty: false,
            allow_reserved: false,
            default,
            schema,
            content: None,
        }
    }

    pub fn with_style(mut self, style: ParameterStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        // path parameters are always required
        self.required = required || self.location == ParameterLocation::Path;
        self
    }

    /// Only honoured for query parameters serialised with form style.
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow
            && self.location == ParameterLocation::Query
            && self.style == ParameterStyle::Form;
        self
    }
}

/// `encoding` entry of a multipart media type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodingSpec {
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypeSpec {
    pub media_type: String,
    pub schema: Option<Value>,
    pub encoding: BTreeMap<String, EncodingSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub required: bool,
    pub content: Vec<MediaTypeSpec>,
}

impl RequestBodySpec {
    pub fn media(&self, media_type: &str) -> Option<&MediaTypeSpec> {
        self.content.iter().find(|m| m.media_type == media_type)
    }
}

#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: Method,
    pub path_pattern: Arc<str>,
    pub handler_name: Arc<str>,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub security: Vec<SecurityRequirement>,
    /// Schemas bundled under `#/definitions/...` for recursive references
    pub definitions: Option<Value>,
}

impl RouteMeta {
    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterSpec> + '_ {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_kind() {
        assert_eq!(SchemaKind::of(&json!({"type": "array"})), SchemaKind::Array);
        assert_eq!(
            SchemaKind::of(&json!({"type": ["integer", "null"]})),
            SchemaKind::Primitive(PrimitiveType::Integer)
        );
        assert_eq!(
            SchemaKind::of(&json!({"oneOf": [{"type": "string"}]})),
            SchemaKind::OneOf
        );
        assert_eq!(
            SchemaKind::of(&json!({})),
            SchemaKind::Primitive(PrimitiveType::String)
        );
    }

    #[test]
    fn test_parameter_defaults() {
        let p = ParameterSpec::new("id", ParameterLocation::Path, json!({"type": "string"}));
        assert!(p.required);
        assert_eq!(p.style, ParameterStyle::Simple);
        assert!(!p.explode);

        let q = ParameterSpec::new("tags", ParameterLocation::Query, json!({"type": "array"}));
        assert!(!q.required);
        assert_eq!(q.style, ParameterStyle::Form);
        assert!(q.explode);

        let h = ParameterSpec::new("x", ParameterLocation::Header, json!({})).allow_empty(true);
        assert!(!h.allow_empty);
    }

    #[test]
    fn test_style_location_table() {
        assert!(ParameterStyle::Matrix.allowed_in(ParameterLocation::Path));
        assert!(!ParameterStyle::Matrix.allowed_in(ParameterLocation::Query));
        assert!(ParameterStyle::DeepObject.allowed_in(ParameterLocation::Query));
        assert!(!ParameterStyle::Form.allowed_in(ParameterLocation::Header));
    }
}
