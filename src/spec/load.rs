use super::build::{build_routes, normalize_exclusive_bounds};
use super::types::RouteMeta;
use anyhow::Context;
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Serialization of an API description document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Json,
}

impl SpecFormat {
    /// `.yaml`/`.yml` is YAML; anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => SpecFormat::Yaml,
            _ => SpecFormat::Json,
        }
    }
}

fn strip_unknown_verbs(val: &mut Value) {
    const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

    if let Some(Value::Object(paths_map)) = val.get_mut("paths") {
        for item in paths_map.values_mut() {
            if let Value::Object(obj) = item {
                obj.retain(|k, _| {
                    let lk = k.to_ascii_lowercase();
                    match lk.as_str() {
                        "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                        m if METHODS.contains(&m) => true,
                        _ => k.starts_with("x-"),
                    }
                });
            }
        }
    }
}

/// Lowercase, `_`-separated project slug derived from the document title.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
        .trim_matches('_')
        .to_string()
}

/// Load routes from a YAML or JSON file. Returns the routes and the title slug.
pub fn load_spec(path: impl AsRef<Path>) -> anyhow::Result<(Vec<RouteMeta>, String)> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read API description {}", path.display()))?;
    load_spec_from_str(&content, SpecFormat::from_path(path))
        .with_context(|| format!("failed to load API description {}", path.display()))
}

/// Load routes from an in-memory document.
pub fn load_spec_from_str(text: &str, format: SpecFormat) -> anyhow::Result<(Vec<RouteMeta>, String)> {
    let mut value: Value = match format {
        SpecFormat::Yaml => serde_yaml::from_str(text).context("document is not valid YAML")?,
        SpecFormat::Json => serde_json::from_str(text).context("document is not valid JSON")?,
    };

    strip_unknown_verbs(&mut value);
    normalize_exclusive_bounds(&mut value);
    let spec: OpenApiV3Spec = serde_json::from_value(value.clone())
        .context("document is not a valid OpenAPI 3 description")?;

    let slug = slugify(&spec.info.title);
    let routes = build_routes(&spec, &value)?;
    info!(title = %spec.info.title, routes = routes.len(), "Loaded API description");
    Ok((routes, slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_unknown_verbs() {
        let mut v = json!({
            "paths": {
                "/x": { "get": {}, "patch": {}, "unknown": {}, "x-extra": {} }
            }
        });
        strip_unknown_verbs(&mut v);
        assert!(v["paths"]["/x"].get("unknown").is_none());
        assert!(v["paths"]["/x"].get("patch").is_some());
        assert!(v["paths"]["/x"].get("x-extra").is_some());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pet Store API!"), "pet_store_api");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SpecFormat::from_path(Path::new("a/openapi.yml")), SpecFormat::Yaml);
        assert_eq!(SpecFormat::from_path(Path::new("openapi.json")), SpecFormat::Json);
    }
}
