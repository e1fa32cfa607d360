use crate::deserializer::percent_decode;
use crate::error::{ErrorKind, ValidationError};
use crate::spec::{object_properties, ParameterLocation, ParameterSpec, ParameterStyle, SchemaKind};
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Most routes have few path parameters; keep them inline.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Raw (still percent-encoded) path values in group order, keyed by logical name.
pub type PathParams = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

// Characters a value of each style may not contain. Simple additionally reserves
// `.` when the template also uses label parameters.
const SIMPLE_RESERVED: &str = r"!*'();@&+$/?#\[\]";
const LABEL_RESERVED: &str = r"!*'();@&=+$/?#\[\]";
const LABEL_FIELD_RESERVED: &str = r"!*'();@&=+$,/?#\[\].";
const MATRIX_RESERVED: &str = r"!*'();@&=+$/?#\[\]";
const MATRIX_SEGMENT_RESERVED: &str = r"!*'();@&=+$,/?#\[\]";

/// One named capture group and the value it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBinding {
    /// Synthesized group name (`p0`, `p1`, ...)
    pub token: String,
    pub parameter: String,
    /// Object field for exploded objects
    pub field: Option<String>,
}

impl GroupBinding {
    /// Name the raw value is published under: the field for exploded objects.
    pub fn key(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.parameter)
    }
}

/// A path template compiled against its path parameters.
///
/// Immutable once built; matching only reads the regex.
#[derive(Debug, Clone)]
pub struct CompiledPathPattern {
    template: Arc<str>,
    regex: Regex,
    groups: Vec<GroupBinding>,
    keys: Vec<Arc<str>>,
}

impl CompiledPathPattern {
    /// Compile `template` (e.g. `/pets/{id}/tags{;tags*}`) using the path-located
    /// entries of `parameters`.
    ///
    /// # Errors
    ///
    /// - `INVALID_SPEC_PATH` for a placeholder containing `/` or unbalanced braces
    /// - `MISSING_PARAMETER_DESCRIPTION` for a placeholder with no path parameter
    pub fn compile(template: &str, parameters: &[ParameterSpec]) -> Result<Self, ValidationError> {
        let placeholders = scan_placeholders(template)?;
        let path_params: Vec<&ParameterSpec> = parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .collect();
        let label_present = path_params.iter().any(|p| p.style == ParameterStyle::Label);

        let mut pattern = String::with_capacity(template.len() * 2 + 16);
        pattern.push('^');
        let mut groups = Vec::new();
        let mut last = 0;

        for (start, end) in placeholders {
            pattern.push_str(&regex::escape(&template[last..start]));
            last = end + 1;

            let name = placeholder_name(&template[start + 1..end]);
            let spec = path_params
                .iter()
                .find(|p| p.name == name)
                .ok_or_else(|| missing_parameter(template, name))?;
            emit_fragment(&mut pattern, &mut groups, spec, label_present);
        }

        let tail = &template[last..];
        let tail = tail.strip_suffix('/').unwrap_or(tail);
        pattern.push_str(&regex::escape(tail));
        pattern.push_str(r"/?(?:\?.*)?$");

        let regex = Regex::new(&pattern).map_err(|e| {
            ValidationError::new(
                ErrorKind::InvalidSpecPath,
                format!("Path \"{template}\" compiles to an invalid pattern: {e}"),
            )
        })?;
        debug!(template = %template, pattern = %pattern, groups = groups.len(), "Compiled path template");

        let keys = groups.iter().map(|g| Arc::from(g.key())).collect();
        Ok(CompiledPathPattern {
            template: Arc::from(template),
            regex,
            groups,
            keys,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn groups(&self) -> &[GroupBinding] {
        &self.groups
    }

    pub fn is_match(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }

    /// Raw values for a matching URI, `None` when the URI does not match.
    ///
    /// A non-participating group yields an empty value for a plain parameter (it is
    /// always present in the template) and no entry for an exploded object field.
    pub fn extract(&self, uri: &str) -> Option<PathParams> {
        let caps = self.regex.captures(uri)?;
        let mut out = PathParams::new();
        for (binding, key) in self.groups.iter().zip(&self.keys) {
            match caps.name(&binding.token) {
                Some(m) => out.push((Arc::clone(key), m.as_str().to_string())),
                None if binding.field.is_none() => out.push((Arc::clone(key), String::new())),
                None => {}
            }
        }
        Some(out)
    }

    /// Like [`extract`](Self::extract) but percent-decoded; for callers that want
    /// plain strings rather than validated values.
    pub fn extract_decoded(&self, uri: &str) -> Option<Vec<(Arc<str>, String)>> {
        self.extract(uri)?
            .into_iter()
            .map(|(k, v)| percent_decode(&v).ok().map(|d| (k, d.into_owned())))
            .collect()
    }
}

fn missing_parameter(template: &str, name: &str) -> ValidationError {
    ValidationError::new(
        ErrorKind::MissingParameterDescription,
        format!("Path \"{template}\" uses \"{{{name}}}\" but declares no such path parameter"),
    )
    .with_parameter(name)
}

fn invalid_path(template: &str, reason: &str) -> ValidationError {
    ValidationError::new(
        ErrorKind::InvalidSpecPath,
        format!("Path \"{template}\" is invalid: {reason}"),
    )
    .with_value(template)
}

/// Byte offsets of every `{` and its closing `}`.
fn scan_placeholders(template: &str) -> Result<Vec<(usize, usize)>, ValidationError> {
    let mut out = Vec::new();
    let mut open: Option<usize> = None;
    for (i, c) in template.char_indices() {
        match (c, open) {
            ('{', None) => open = Some(i),
            ('{', Some(_)) => return Err(invalid_path(template, "nested '{'")),
            ('}', Some(start)) => {
                if template[start + 1..i].contains('/') {
                    return Err(invalid_path(template, "placeholder contains '/'"));
                }
                if start + 1 == i {
                    return Err(invalid_path(template, "empty placeholder"));
                }
                out.push((start, i));
                open = None;
            }
            ('}', None) => return Err(invalid_path(template, "unmatched '}'")),
            _ => {}
        }
    }
    if open.is_some() {
        return Err(invalid_path(template, "unclosed '{'"));
    }
    Ok(out)
}

/// Logical name of a placeholder body: RFC 6570 operators and modifiers stripped.
fn placeholder_name(body: &str) -> &str {
    const OPERATORS: [char; 5] = ['.', ';', '?', '*', '+'];
    let trimmed = body.trim_start_matches(OPERATORS);
    let end = trimmed.find(OPERATORS).unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn emit_fragment(
    pattern: &mut String,
    groups: &mut Vec<GroupBinding>,
    spec: &ParameterSpec,
    label_present: bool,
) {
    let group = |field: Option<&str>, groups: &mut Vec<GroupBinding>| {
        let token = format!("p{}", groups.len());
        groups.push(GroupBinding {
            token: token.clone(),
            parameter: spec.name.clone(),
            field: field.map(str::to_string),
        });
        token
    };
    let exploded_object = spec.explode && spec.kind == SchemaKind::Object;

    match spec.style {
        ParameterStyle::Label if exploded_object => {
            for (field, _) in object_properties(&spec.schema) {
                let token = group(Some(&field), groups);
                pattern.push_str(&format!(
                    r"(?:\.?{}=(?P<{token}>[^{LABEL_FIELD_RESERVED}]*))?",
                    regex::escape(&field)
                ));
            }
        }
        ParameterStyle::Label => {
            let token = group(None, groups);
            pattern.push_str(&format!(r"\.?(?P<{token}>[^{LABEL_RESERVED}]*)?"));
        }
        ParameterStyle::Matrix if exploded_object => {
            for (field, _) in object_properties(&spec.schema) {
                let token = group(Some(&field), groups);
                pattern.push_str(&format!(
                    r"(?:;{}=(?P<{token}>[^{MATRIX_SEGMENT_RESERVED}]*))?",
                    regex::escape(&field)
                ));
            }
        }
        ParameterStyle::Matrix if spec.explode && spec.kind == SchemaKind::Array => {
            let token = group(None, groups);
            pattern.push_str(&format!(
                r"(?P<{token}>(?:;{}=[^{MATRIX_SEGMENT_RESERVED}]*)+)",
                regex::escape(&spec.name)
            ));
        }
        ParameterStyle::Matrix => {
            let token = group(None, groups);
            pattern.push_str(&format!(
                r";{}(?:=(?P<{token}>[^{MATRIX_RESERVED}]*))?",
                regex::escape(&spec.name)
            ));
        }
        _ => {
            let token = group(None, groups);
            let dot = if label_present { "." } else { "" };
            pattern.push_str(&format!(r"(?P<{token}>[^{SIMPLE_RESERVED}{dot}]*)?"));
        }
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_placeholder_name_operators() {
        assert_eq!(placeholder_name(";color*"), "color");
        assert_eq!(placeholder_name(".color"), "color");
        assert_eq!(placeholder_name("id"), "id");
    }

    #[test]
    fn test_scan_rejects_bad_templates() {
        assert!(scan_placeholders("/a/{b/c}").is_err());
        assert!(scan_placeholders("/a/{b").is_err());
        assert!(scan_placeholders("/a/b}").is_err());
        assert!(scan_placeholders("/a/{}").is_err());
        assert_eq!(scan_placeholders("/a/{b}/{c}").unwrap(), vec![(3, 5), (7, 9)]);
    }
}
