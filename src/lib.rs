//! # BRRTRouter Params
//!
//! **brrtrouter-params** is the parameter resolution and validation engine of BRRTRouter:
//! it turns the parameters an [OpenAPI 3](https://spec.openapis.org/oas/v3.1.0) operation
//! declares into a path-matching pattern plus typed validation rules, and applies those
//! rules to raw requests.
//!
//! ## Overview
//!
//! Every OpenAPI parameter carries a serialization style (`simple`, `label`, `matrix`,
//! `form`, `spaceDelimited`, `pipeDelimited`, `deepObject`), an `explode` flag and a schema
//! that is a primitive, an array or an object. Each combination splits and validates raw
//! text differently. This crate compiles that grammar once per route and runs it per request.
//!
//! ## Architecture
//!
//! - **[`spec`]** - OpenAPI loading, `$ref` resolution and per-operation [`RouteMeta`]
//! - **[`router`]** - Path Template Compiler: templates to regexes with `p0`, `p1`, ... groups
//! - **[`deserializer`]** - Style Deserializer: delimiter splitting with percent-decoding
//! - **[`validator`]** - Type Validator Hierarchy: primitive, container, JSON and XML nodes
//! - **[`request`]** - Request Validation Orchestrator: fixed-order, fail-fast validation
//! - **[`route`]** - A route compiled once: pattern plus request validator
//! - **[`security`]** - Scheme/scope to handler lookup with scope-less fallback
//! - **[`runtime_config`]** / **[`telemetry`]** - configuration and logging setup
//! - **[`cli`]** - `brrtrouter-params routes` and `brrtrouter-params check`
//!
//! ### Request Validation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Router as External router
//!     participant Route as route::CompiledRoute
//!     participant Pattern as router::CompiledPathPattern
//!     participant Validator as request::RequestValidator
//!     participant Nodes as validator::ValidatorNode
//!
//!     Router->>Route: validate(uri, RawRequest)
//!     Route->>Pattern: extract(uri)
//!     Pattern-->>Route: raw path values (p0, p1, ...)
//!     Route->>Validator: validate(RawRequest + path values)
//!     loop path, query, header, cookie
//!         Validator->>Nodes: validate_scalar / validate_collection
//!         Nodes-->>Validator: ParameterValue or ValidationError
//!     end
//!     Validator->>Validator: custom validators
//!     Validator->>Nodes: body by content type
//!     Validator-->>Route: RequestParameters or first ValidationError
//! ```
//!
//! ### Key Architectural Patterns
//!
//! - **Compile once**: patterns, validator trees and JSON schemas are built at registration
//!   time and are immutable afterwards; they can be shared across threads.
//! - **Fail fast**: the first failing rule ends validation with exactly one [`ValidationError`].
//! - **Owned schemas**: each route owns its compiled schemas; there is no process-wide cache.
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtrouter_params::{compile_routes, load_spec_from_str, RawRequest, SpecFormat};
//! use brrtrouter_params::validator::ValidatorOptions;
//!
//! let yaml = r#"
//! openapi: 3.1.0
//! info: { title: Pets, version: "1" }
//! paths:
//!   /pets/{id}:
//!     get:
//!       operationId: get_pet
//!       parameters:
//!         - { name: id, in: path, required: true, schema: { type: integer } }
//!         - { name: tags, in: query, schema: { type: array, items: { type: string } } }
//!       responses: { "200": { description: ok } }
//! "#;
//!
//! let (routes, _slug) = load_spec_from_str(yaml, SpecFormat::Yaml).unwrap();
//! let compiled = compile_routes(&routes, &ValidatorOptions::default()).unwrap();
//! let req = RawRequest::new().with_query_string("tags=a&tags=b");
//! let params = compiled[0].validate("/pets/42?tags=a&tags=b", &req).unwrap();
//! assert_eq!(params.to_json()["path"]["id"], 42);
//! ```
//!
//! ## Errors
//!
//! Compile-time errors (malformed templates, undeclared placeholders, `allowReserved`, a
//! style not allowed in a location) abort route registration. Request-time errors are
//! scoped to one request and carry the parameter, location and raw value; see
//! [`ValidationError::to_problem_json`].

pub mod cli;
pub mod deserializer;
pub mod error;
pub mod request;
pub mod route;
pub mod router;
pub mod runtime_config;
pub mod security;
pub mod spec;
pub mod telemetry;
pub mod validator;
pub mod value;

pub use error::{ErrorKind, ValidationError};
pub use request::{RawRequest, RequestParameters, RequestValidator, ValidationChain};
pub use route::{compile_routes, CompiledRoute};
pub use router::CompiledPathPattern;
pub use spec::{
    load_spec, load_spec_from_str, ParameterLocation, ParameterSpec, ParameterStyle, RouteMeta,
    SecurityRequirement, SpecFormat,
};
pub use value::ParameterValue;
