//! # Security Module
//!
//! Maps the security schemes a route requires to caller-supplied handlers.
//!
//! Handlers are registered per scheme, optionally per OAuth2 scope. Resolution
//! tries the exact `(scheme, scope)` key first and falls back to the scheme-wide
//! handler, so one handler can cover every scope of a scheme:
//!
//! ```rust
//! use brrtrouter_params::security::SecurityRegistry;
//!
//! let mut registry = SecurityRegistry::new();
//! registry.register("oauth", None, "any-scope");
//! registry.register("oauth", Some("admin"), "admin-only");
//!
//! assert_eq!(registry.resolve("oauth", Some("admin")), Some(&"admin-only"));
//! assert_eq!(registry.resolve("oauth", Some("read")), Some(&"any-scope"));
//! ```
//!
//! What a handler does with the request is outside this crate.

use crate::spec::SecurityRequirement;
use std::collections::HashMap;
use std::fmt;

/// Errors raised while wiring a route's security requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// No handler registered for the scheme (and scope, if one was required)
    MissingSecurityHandler {
        scheme: String,
        scope: Option<String>,
    },
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityError::MissingSecurityHandler { scheme, scope: Some(scope) } => write!(
                f,
                "Missing security handler for scheme \"{scheme}\" with scope \"{scope}\""
            ),
            SecurityError::MissingSecurityHandler { scheme, scope: None } => {
                write!(f, "Missing security handler for scheme \"{scheme}\"")
            }
        }
    }
}

impl std::error::Error for SecurityError {}

type Key = (String, Option<String>);

/// Handlers keyed by scheme name and optional scope.
#[derive(Debug, Clone)]
pub struct SecurityRegistry<H> {
    handlers: HashMap<Key, H>,
}

impl<H> Default for SecurityRegistry<H> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<H> SecurityRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; a later registration for the same key replaces the earlier one.
    pub fn register(&mut self, scheme: impl Into<String>, scope: Option<&str>, handler: H) {
        self.handlers
            .insert((scheme.into(), scope.map(str::to_string)), handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn resolve(&self, scheme: &str, scope: Option<&str>) -> Option<&H> {
        if let Some(scope) = scope {
            let exact = (scheme.to_string(), Some(scope.to_string()));
            if let Some(handler) = self.handlers.get(&exact) {
                return Some(handler);
            }
        }
        self.handlers.get(&(scheme.to_string(), None))
    }

    /// Handlers for every scheme and scope the route lists, in declaration order.
    ///
    /// A scheme without scopes needs its scheme-wide handler; a scheme with
    /// scopes needs one handler per scope (exact or scheme-wide).
    pub fn resolve_requirements(
        &self,
        requirements: &[SecurityRequirement],
    ) -> Result<Vec<&H>, SecurityError> {
        let mut resolved = Vec::new();
        for requirement in requirements {
            for (scheme, scopes) in &requirement.0 {
                if scopes.is_empty() {
                    let handler = self.resolve(scheme, None).ok_or_else(|| {
                        SecurityError::MissingSecurityHandler {
                            scheme: scheme.clone(),
                            scope: None,
                        }
                    })?;
                    resolved.push(handler);
                    continue;
                }
                for scope in scopes {
                    let handler = self.resolve(scheme, Some(scope)).ok_or_else(|| {
                        SecurityError::MissingSecurityHandler {
                            scheme: scheme.clone(),
                            scope: Some(scope.clone()),
                        }
                    })?;
                    resolved.push(handler);
                }
            }
        }
        Ok(resolved)
    }
}
