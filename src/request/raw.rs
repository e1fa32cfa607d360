use http::header::{IntoHeaderName, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;

/// Ordered key/value pairs; keys may repeat.
pub type Multimap = Vec<(String, String)>;

/// Every value recorded for `key`, in order.
pub fn values_for(map: &[(String, String)], key: &str) -> Option<Vec<String>> {
    let values: Vec<String> = map
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Parse a query string (without the leading `?`) into a multimap.
pub fn parse_query(query: &str) -> Multimap {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Parse a `Cookie` header into a multimap. Each `name=value` pair is form-decoded
/// (`+` is a space, `%XX` escapes are resolved); names and values are trimmed.
pub fn parse_cookies(header: &str) -> Multimap {
    header
        .split(';')
        .filter_map(|pair| {
            // `&` is a plain cookie octet, not a pair separator
            let pair = pair.trim().replace('&', "%26");
            let (name, value) = url::form_urlencoded::parse(pair.as_bytes()).next()?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// A multipart part that carried a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field name
    pub name: String,
    pub filename: String,
    pub content_type: String,
}

impl UploadedFile {
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        UploadedFile {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }
}

/// Everything the validator reads from one request, as handed over by the
/// HTTP layer. Path values are raw (still percent-encoded).
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub path_params: HashMap<String, String>,
    pub query: Multimap,
    pub headers: HeaderMap,
    pub form: Multimap,
    pub files: Vec<UploadedFile>,
    pub body: Vec<u8>,
}

impl RawRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_param(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), raw.into());
        self
    }

    /// Replace path values with those extracted by a compiled pattern.
    pub fn with_path_params<I, K>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, String)>,
        K: AsRef<str>,
    {
        self.path_params = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v))
            .collect();
        self
    }

    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query.extend(parse_query(query));
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_body(mut self, content_type: HeaderValue, body: impl Into<Vec<u8>>) -> Self {
        self.headers.insert(CONTENT_TYPE, content_type);
        self.body = body.into();
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// All `Cookie` headers joined with `; `.
    pub fn cookie_header(&self) -> String {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_multimap() {
        let q = parse_query("?color=blue&color=black&name=a%20b&flag");
        assert_eq!(values_for(&q, "color").unwrap(), vec!["blue", "black"]);
        assert_eq!(values_for(&q, "name").unwrap(), vec!["a b"]);
        assert_eq!(values_for(&q, "flag").unwrap(), vec![""]);
        assert!(values_for(&q, "Color").is_none());
    }

    #[test]
    fn test_parse_cookies() {
        let c = parse_cookies(" session = abc ; theme=dark%20mode;; empty=");
        assert_eq!(values_for(&c, "session").unwrap(), vec!["abc"]);
        assert_eq!(values_for(&c, "theme").unwrap(), vec!["dark mode"]);
        assert_eq!(values_for(&c, "empty").unwrap(), vec![""]);
    }

    #[test]
    fn test_cookie_values_are_form_decoded() {
        let c = parse_cookies("color=a+b; tags=x%2By; pair=k&v");
        assert_eq!(values_for(&c, "color").unwrap(), vec!["a b"]);
        assert_eq!(values_for(&c, "tags").unwrap(), vec!["x+y"]);
        assert_eq!(values_for(&c, "pair").unwrap(), vec!["k&v"]);
    }

    #[test]
    fn test_cookie_header_joined() {
        let req = RawRequest::new()
            .with_header(COOKIE, HeaderValue::from_static("a=1"))
            .with_header(COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(req.cookie_header(), "a=1; b=2");
    }
}
