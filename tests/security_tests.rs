#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brrtrouter_params::security::{SecurityError, SecurityRegistry};
use common::routes;

const SPEC: &str = r#"openapi: 3.1.0
info:
  title: Secured
  version: "1.0.0"
security:
  - api_key: []
paths:
  /public:
    get:
      operationId: public
      security: []
      responses:
        "200":
          description: ok
  /reports:
    get:
      operationId: list_reports
      responses:
        "200":
          description: ok
    post:
      operationId: create_report
      security:
        - oauth: [reports:write, reports:read]
      responses:
        "201":
          description: created
"#;

fn handlers_for(registry: &SecurityRegistry<&'static str>, handler: &str) -> Result<Vec<&'static str>, SecurityError> {
    let routes = routes(SPEC);
    let route = routes.iter().find(|r| &*r.handler_name == handler).unwrap();
    registry
        .resolve_requirements(&route.security)
        .map(|hs| hs.into_iter().copied().collect())
}

#[test]
fn test_operation_security_overrides_document() {
    let mut registry = SecurityRegistry::new();
    registry.register("api_key", None, "key");
    registry.register("oauth", None, "oauth-any");
    registry.register("oauth", Some("reports:write"), "oauth-write");

    assert_eq!(handlers_for(&registry, "public").unwrap(), Vec::<&str>::new());
    assert_eq!(handlers_for(&registry, "list_reports").unwrap(), vec!["key"]);
    assert_eq!(
        handlers_for(&registry, "create_report").unwrap(),
        vec!["oauth-write", "oauth-any"]
    );
}

#[test]
fn test_missing_handler_is_reported() {
    let mut registry = SecurityRegistry::new();
    registry.register("oauth", Some("reports:write"), "oauth-write");

    let err = handlers_for(&registry, "create_report").unwrap_err();
    assert_eq!(
        err,
        SecurityError::MissingSecurityHandler {
            scheme: "oauth".into(),
            scope: Some("reports:read".into()),
        }
    );

    let err = handlers_for(&registry, "list_reports").unwrap_err();
    assert_eq!(err.to_string(), "Missing security handler for scheme \"api_key\"");
}
