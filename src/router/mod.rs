//! # Router Module
//!
//! Compiles OpenAPI path templates into matching patterns. The external router that
//! dispatches requests to handlers consumes the pattern; the request validator
//! consumes the raw values the pattern extracts.
//!
//! ## Compilation
//!
//! A template such as `/pets/{id}/color{;color}` is scanned left to right. Literal
//! text is quoted so regex metacharacters are inert. Each placeholder is resolved
//! against the route's path parameters and replaced by a style-specific fragment with
//! named groups `p0`, `p1`, ...:
//!
//! | style  | non-exploded              | exploded object            | exploded array             |
//! |--------|---------------------------|----------------------------|----------------------------|
//! | simple | `(?P<p0>...)`             | same group, `R=1,G=2`      | same group                 |
//! | label  | `\.?(?P<p0>...)`          | one `.field=` group each   | same group, `.a.b.c`       |
//! | matrix | `;name(?:=(?P<p0>...))?`  | one `;field=` group each   | one `(;name=...)+` group   |
//!
//! The pattern ends with an optional slash and an optional query remainder so it
//! matches concrete request URIs.
//!
//! ## Example
//!
//! ```rust
//! use brrtrouter_params::router::CompiledPathPattern;
//! use brrtrouter_params::spec::{ParameterLocation, ParameterSpec};
//! use serde_json::json;
//!
//! let id = ParameterSpec::new("id", ParameterLocation::Path, json!({"type": "integer"}));
//! let pattern = CompiledPathPattern::compile("/pets/{id}", &[id]).unwrap();
//! let params = pattern.extract("/pets/42?verbose=1").unwrap();
//! assert_eq!(params[0].1, "42");
//! ```

mod core;

pub use core::{CompiledPathPattern, GroupBinding, PathParams, MAX_INLINE_PARAMS};
