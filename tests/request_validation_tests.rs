#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brrtrouter_params::request::{CustomValidator, UploadedFile};
use brrtrouter_params::{ErrorKind, ParameterLocation, RawRequest, RequestParameters, ValidationError};
use common::{compiled, document, single_route};
use http::header::{HeaderValue, CONTENT_TYPE};
use serde_json::json;
use std::sync::Arc;

const PETS: &str = r#"
  /pets/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema: { type: integer, minimum: 1 }
    get:
      operationId: get_pet
      parameters:
        - name: verbose
          in: query
          schema: { type: boolean, default: false }
        - name: limit
          in: query
          required: true
          schema: { type: integer, maximum: 50 }
        - name: X-Request-Id
          in: header
          required: true
          schema: { type: string, format: uuid }
        - name: session
          in: cookie
          schema: { type: string, pattern: "^[a-z]+$" }
      responses:
        "200":
          description: ok
"#;

const UUID: &str = "0e8f7a35-3c2a-4a3b-9b61-4d3fb1f3c2aa";

fn pets_request() -> RawRequest {
    RawRequest::new()
        .with_query_string("limit=10")
        .with_header("x-request-id", HeaderValue::from_static(UUID))
        .with_header("cookie", HeaderValue::from_static("session=abc; other=1"))
}

#[test]
fn test_all_locations_are_typed() {
    let route = single_route(&document(PETS));
    let params = route.validate("/pets/3", &pets_request()).unwrap();
    assert_eq!(
        params.to_json(),
        json!({
            "path": {"id": 3},
            "query": {"verbose": false, "limit": 10},
            "header": {"X-Request-Id": UUID},
            "cookie": {"session": "abc"},
            "form": {},
            "body": null
        })
    );
}

#[test]
fn test_required_query_absent_is_not_found() {
    let route = single_route(&document(PETS));
    let req = RawRequest::new().with_header("x-request-id", HeaderValue::from_static(UUID));
    let err = route.validate("/pets/3", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.parameter.as_deref(), Some("limit"));
    assert_eq!(err.location, Some(ParameterLocation::Query));
}

#[test]
fn test_path_is_checked_before_query() {
    let route = single_route(&document(PETS));
    let err = route.validate("/pets/0", &RawRequest::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoMatch);
    assert_eq!(err.location, Some(ParameterLocation::Path));
}

#[test]
fn test_header_format_and_cookie_pattern() {
    let route = single_route(&document(PETS));
    let req = RawRequest::new()
        .with_query_string("limit=10")
        .with_header("x-request-id", HeaderValue::from_static("not-a-uuid"));
    let err = route.validate("/pets/3", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoMatch);
    assert_eq!(err.parameter.as_deref(), Some("X-Request-Id"));

    let req = pets_request().with_header("cookie", HeaderValue::from_static("session=xyz"));
    let err = route.validate("/pets/3", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedArray);

    let req = RawRequest::new()
        .with_query_string("limit=10")
        .with_header("x-request-id", HeaderValue::from_static(UUID))
        .with_header("cookie", HeaderValue::from_static("session=ABC"));
    let err = route.validate("/pets/3", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoMatch);
    assert_eq!(err.location, Some(ParameterLocation::Cookie));
}

#[test]
fn test_repeated_single_valued_query() {
    let route = single_route(&document(PETS));
    let req = RawRequest::new()
        .with_query_string("limit=10&limit=20")
        .with_header("x-request-id", HeaderValue::from_static(UUID));
    let err = route.validate("/pets/3", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedArray);
}

#[test]
fn test_validation_is_repeatable() {
    let route = single_route(&document(PETS));
    let req = pets_request();
    let first = route.validate("/pets/3", &req).unwrap();
    let second = route.validate("/pets/3", &req).unwrap();
    assert_eq!(first, second);

    let bad = RawRequest::new();
    let a = route.validate("/pets/3", &bad).unwrap_err();
    let b = route.validate("/pets/3", &bad).unwrap_err();
    assert_eq!(a, b);
}

const UPLOAD: &str = r#"
  /profile:
    post:
      operationId: upload_profile
      requestBody:
        required: true
        content:
          multipart/form-data:
            schema:
              type: object
              required: [avatar]
              properties:
                name: { type: string, maxLength: 10 }
                avatar: { type: string, format: binary }
            encoding:
              avatar:
                contentType: image/*
      responses:
        "204":
          description: stored
"#;

fn multipart() -> RawRequest {
    RawRequest::new().with_header(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data; boundary=x"))
}

#[test]
fn test_multipart_missing_required_file() {
    let route = single_route(&document(UPLOAD));
    let req = multipart().with_form_field("name", "rex");
    let err = route.validate("/profile", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert_eq!(err.parameter.as_deref(), Some("avatar"));
}

#[test]
fn test_multipart_file_content_type_must_match() {
    let route = single_route(&document(UPLOAD));
    let req = multipart().with_file(UploadedFile::new("avatar", "a.txt", "text/plain"));
    let err = route.validate("/profile", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::FileNotFound);

    let req = multipart()
        .with_form_field("name", "rex")
        .with_file(UploadedFile::new("avatar", "a.png", "image/png"));
    let params = route.validate("/profile", &req).unwrap();
    assert_eq!(params.to_json()["form"], json!({"name": "rex", "avatar": "a.png"}));
}

#[test]
fn test_multipart_text_field_is_validated() {
    let route = single_route(&document(UPLOAD));
    let req = multipart()
        .with_form_field("name", "far-too-long-a-name")
        .with_file(UploadedFile::new("avatar", "a.png", "image/png"));
    let err = route.validate("/profile", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoMatch);
    assert_eq!(err.parameter.as_deref(), Some("name"));
}

#[test]
fn test_file_rules_need_multipart() {
    let route = single_route(&document(UPLOAD));
    let req = RawRequest::new().with_body(HeaderValue::from_static("application/json"), "{}");
    let err = route.validate("/profile", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::WrongContentType);
}

const BODIES: &str = r##"
  /pets:
    post:
      operationId: add_pet
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/Pet"
          application/xml:
            schema:
              $ref: "#/components/schemas/Pet"
          application/x-www-form-urlencoded:
            schema:
              type: object
              required: [name]
              properties:
                name: { type: string }
                age: { type: integer }
      responses:
        "201":
          description: created
components:
  schemas:
    Pet:
      type: object
      required: [name]
      xml:
        name: pet
      properties:
        name: { type: string }
        age: { type: integer, minimum: 0 }
"##;

fn body_route() -> brrtrouter_params::CompiledRoute {
    single_route(&document(BODIES))
}

#[test]
fn test_json_body() {
    let route = body_route();
    let req = RawRequest::new().with_body(
        HeaderValue::from_static("application/json; charset=utf-8"),
        r#"{"name":"rex","age":3}"#,
    );
    let params = route.validate("/pets", &req).unwrap();
    assert_eq!(params.to_json()["body"], json!({"name": "rex", "age": 3}));

    let req = RawRequest::new().with_body(HeaderValue::from_static("application/json"), r#"{"age":-1}"#);
    let err = route.validate("/pets", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidJsonBody);

    let req = RawRequest::new().with_body(HeaderValue::from_static("application/json"), "{not json");
    let err = route.validate("/pets", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidJsonBody);
}

#[test]
fn test_xml_body() {
    let route = body_route();
    let req = RawRequest::new().with_body(
        HeaderValue::from_static("application/xml"),
        "<pet><name>rex</name></pet>",
    );
    assert!(route.validate("/pets", &req).is_ok());

    let req = RawRequest::new().with_body(
        HeaderValue::from_static("application/xml"),
        "<dog><name>rex</name></dog>",
    );
    let err = route.validate("/pets", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidXmlBody);

    let req = RawRequest::new().with_body(
        HeaderValue::from_static("application/xml"),
        "<!DOCTYPE pet [<!ENTITY x \"y\">]><pet>&x;</pet>",
    );
    let err = route.validate("/pets", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidXmlBody);
}

#[test]
fn test_urlencoded_body() {
    let route = body_route();
    let req = RawRequest::new().with_body(
        HeaderValue::from_static("application/x-www-form-urlencoded"),
        "name=rex&age=3",
    );
    let params = route.validate("/pets", &req).unwrap();
    assert_eq!(params.to_json()["form"], json!({"name": "rex", "age": 3}));

    let req = RawRequest::new().with_body(
        HeaderValue::from_static("application/x-www-form-urlencoded"),
        "age=3",
    );
    let err = route.validate("/pets", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.parameter.as_deref(), Some("name"));
}

#[test]
fn test_required_body_wrong_or_missing_content_type() {
    let route = body_route();
    let err = route.validate("/pets", &RawRequest::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::WrongContentType);

    let req = RawRequest::new().with_body(HeaderValue::from_static("text/csv"), "name\nrex");
    let err = route.validate("/pets", &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::WrongContentType);
}

struct NoRootPets;

impl CustomValidator for NoRootPets {
    fn validate(&self, _req: &RawRequest, params: &RequestParameters) -> Result<(), ValidationError> {
        match params.get(ParameterLocation::Query, "limit") {
            Some(limit) if limit.to_json() == json!(13) => Err(ValidationError::new(
                ErrorKind::NoMatch,
                "unlucky limit",
            )
            .with_parameter("limit")),
            _ => Ok(()),
        }
    }
}

#[test]
fn test_custom_validator_runs_after_cookies() {
    let mut route = single_route(&document(PETS));
    route.validator = route.validator.clone().with_custom(Arc::new(NoRootPets));

    assert!(route.validate("/pets/3", &pets_request()).is_ok());

    let req = RawRequest::new()
        .with_query_string("limit=13")
        .with_header("x-request-id", HeaderValue::from_static(UUID));
    let err = route.validate("/pets/3", &req).unwrap_err();
    assert_eq!(err.message, "unlucky limit");
}

#[test]
fn test_routes_keep_document_order() {
    let yaml = document(&format!("{PETS}{UPLOAD}"));
    let routes = compiled(&yaml);
    let labels: Vec<String> = routes.iter().map(|r| r.label()).collect();
    assert_eq!(labels, vec!["GET /pets/{id}", "POST /profile"]);
}
