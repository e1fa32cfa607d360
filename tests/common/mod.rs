#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use brrtrouter_params::validator::ValidatorOptions;
use brrtrouter_params::{compile_routes, load_spec_from_str, CompiledRoute, RouteMeta, SpecFormat};
use std::io::Write;

/// Wraps `paths` (YAML, indented two spaces) in a minimal document.
pub fn document(paths: &str) -> String {
    format!("openapi: 3.1.0\ninfo:\n  title: Test API\n  version: \"1.0.0\"\npaths:\n{paths}")
}

pub fn routes(yaml: &str) -> Vec<RouteMeta> {
    let (routes, _slug) = load_spec_from_str(yaml, SpecFormat::Yaml).expect("document loads");
    routes
}

pub fn compiled(yaml: &str) -> Vec<CompiledRoute> {
    compile_routes(&routes(yaml), &ValidatorOptions::default()).expect("routes compile")
}

/// The only route of a single-operation document.
pub fn single_route(yaml: &str) -> CompiledRoute {
    let mut routes = compiled(yaml);
    assert_eq!(routes.len(), 1, "expected exactly one operation");
    routes.remove(0)
}

pub mod temp_files {
    use super::*;

    /// A temporary file that keeps the extension the loader dispatches on.
    pub fn create_temp_spec(content: &str, ext: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrt_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> tempfile::NamedTempFile {
        create_temp_spec(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> tempfile::NamedTempFile {
        create_temp_spec(content, "json")
    }
}
