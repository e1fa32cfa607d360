//! # Spec Module
//!
//! Loads an OpenAPI 3 document and turns every operation into a [`RouteMeta`]:
//! resolved parameters with OAS defaults applied, the request body, security
//! requirements and the bundle of recursive schemas.
//!
//! Loading goes through [`load_spec`] or [`load_spec_from_str`]; [`build_routes`]
//! does the per-operation work.

pub use oas3::spec::SecurityRequirement;
mod build;
mod load;
mod schema;
mod types;

pub use build::*;
pub use load::*;
pub use schema::*;
pub use types::*;
