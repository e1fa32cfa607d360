//! # Request Module
//!
//! Per-request extraction and validation of parameters against the rules compiled
//! for one route.
//!
//! ## Processing order
//!
//! [`RequestValidator::validate`] walks the locations in a fixed order and stops at
//! the first failure:
//!
//! 1. path
//! 2. query, then the query catch-all (additional properties)
//! 3. header (all values of a header joined with `,`)
//! 4. cookie, then the cookie catch-all
//! 5. [`CustomValidator`]s
//! 6. body, dispatched on the request content type
//!
//! For every rule the raw value is looked up, then:
//!
//! | Raw value | Outcome |
//! |---|---|
//! | present | validated; the typed value is recorded |
//! | present, empty, `allowEmptyValue` | `""` recorded, validator skipped |
//! | absent, default declared | default recorded |
//! | absent, optional | nothing recorded |
//! | absent, required | `NOT_FOUND` |
//!
//! ## Chaining
//!
//! A [`ValidationChain`] runs several validators for the same route and merges
//! their [`RequestParameters`]; failures go to [`FailureReporter`]s.

mod chain;
mod handler;
mod params;
mod raw;
mod rules;

pub use chain::{FailureReporter, TracingReporter, ValidationChain, ValidationContext};
pub use handler::{CustomValidator, RequestValidator};
pub use params::RequestParameters;
pub use raw::{parse_cookies, parse_query, values_for, Multimap, RawRequest, UploadedFile};
pub use rules::{
    compile_body, compile_parameter, media_essence, AdditionalPropertiesRule, Arity, BodyKind,
    BodyRules, CompiledParameter, FieldRule, FileRule, MediaRule, RuleSource, ValidationRule,
};
