//! A route compiled once at registration time: the path pattern plus the request
//! validator built from the same [`RouteMeta`].

use crate::error::ValidationError;
use crate::request::{RawRequest, RequestParameters, RequestValidator};
use crate::router::CompiledPathPattern;
use crate::spec::{ParameterLocation, ParameterSpec, RouteMeta};
use crate::validator::{ValidatorFactory, ValidatorOptions};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub meta: Arc<RouteMeta>,
    pub pattern: CompiledPathPattern,
    pub validator: RequestValidator,
}

impl CompiledRoute {
    /// Compile-time failures (bad template, undeclared placeholder, unsupported
    /// style) are returned as errors; the route must not be registered.
    pub fn compile(meta: &RouteMeta, options: &ValidatorOptions) -> Result<Self, ValidationError> {
        let path_params: Vec<ParameterSpec> =
            meta.parameters_in(ParameterLocation::Path).cloned().collect();
        let pattern = CompiledPathPattern::compile(&meta.path_pattern, &path_params)?;
        let factory = ValidatorFactory::new(options, meta.definitions.as_ref());
        let validator =
            RequestValidator::compile(&meta.parameters, meta.request_body.as_ref(), &factory)?;
        Ok(CompiledRoute {
            meta: Arc::new(meta.clone()),
            pattern,
            validator,
        })
    }

    /// `"GET /pets/{id}"`
    pub fn label(&self) -> String {
        format!("{} {}", self.meta.method, self.meta.path_pattern)
    }

    pub fn matches(&self, uri: &str) -> bool {
        self.pattern.is_match(uri)
    }

    /// Match `uri`, take the raw path values from the pattern and validate the
    /// request. Path values already present on `req` are replaced.
    pub fn validate(&self, uri: &str, req: &RawRequest) -> Result<RequestParameters, ValidationError> {
        let params = self.pattern.extract(uri).ok_or_else(|| {
            ValidationError::no_match(uri, format_args!("path template {}", self.meta.path_pattern))
        })?;
        let req = req.clone().with_path_params(params);
        self.validator.validate(&req)
    }
}

/// Compile every route of a document, stopping at the first failure.
pub fn compile_routes(
    routes: &[RouteMeta],
    options: &ValidatorOptions,
) -> Result<Vec<CompiledRoute>, ValidationError> {
    let mut compiled = Vec::with_capacity(routes.len());
    for meta in routes {
        match CompiledRoute::compile(meta, options) {
            Ok(route) => compiled.push(route),
            Err(err) => {
                error!(
                    method = %meta.method,
                    path = %meta.path_pattern,
                    kind = %err.kind,
                    "Route compilation failed: {}",
                    err.message
                );
                return Err(err);
            }
        }
    }
    let rules: usize = compiled
        .iter()
        .map(|r| {
            [
                ParameterLocation::Path,
                ParameterLocation::Query,
                ParameterLocation::Header,
                ParameterLocation::Cookie,
            ]
            .into_iter()
            .map(|loc| r.validator.rules(loc).len())
            .sum::<usize>()
        })
        .sum();
    info!(routes = compiled.len(), rules, "Compiled routes");
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::ParameterValue;
    use http::Method;
    use serde_json::json;

    fn meta(path: &str, parameters: Vec<ParameterSpec>) -> RouteMeta {
        RouteMeta {
            method: Method::GET,
            path_pattern: Arc::from(path),
            handler_name: Arc::from("handler"),
            parameters,
            request_body: None,
            security: Vec::new(),
            definitions: None,
        }
    }

    #[test]
    fn test_validate_extracts_path_values() {
        let route = CompiledRoute::compile(
            &meta(
                "/pets/{id}",
                vec![
                    ParameterSpec::new("id", ParameterLocation::Path, json!({"type": "integer"})),
                    ParameterSpec::new("tag", ParameterLocation::Query, json!({"type": "string"})),
                ],
            ),
            &ValidatorOptions::default(),
        )
        .unwrap();
        assert_eq!(route.label(), "GET /pets/{id}");
        let req = RawRequest::new().with_query_string("tag=cat");
        let params = route.validate("/pets/7?tag=cat", &req).unwrap();
        assert_eq!(params.path["id"], ParameterValue::Integer(7));
        assert_eq!(params.query["tag"], ParameterValue::String("cat".into()));
    }

    #[test]
    fn test_validate_rejects_other_paths() {
        let route = CompiledRoute::compile(
            &meta(
                "/pets/{id}",
                vec![ParameterSpec::new("id", ParameterLocation::Path, json!({"type": "integer"}))],
            ),
            &ValidatorOptions::default(),
        )
        .unwrap();
        assert!(!route.matches("/owners/7"));
        let err = route.validate("/owners/7", &RawRequest::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoMatch);
    }

    #[test]
    fn test_compile_routes_stops_at_first_error() {
        let routes = vec![
            meta("/ok", Vec::new()),
            meta("/pets/{missing}", Vec::new()),
        ];
        let err = compile_routes(&routes, &ValidatorOptions::default()).unwrap_err();
        assert!(err.kind.is_compile_time());
    }
}
