//! Incoming HTTP request type.
//!
//! The request keeps three parts as JSON values so they can be validated and
//! rewritten in place by [`Schemas`](crate::Schemas):
//!
//! | Part | Shape |
//! |---|---|
//! | `headers` | object, lower-case name → string (repeats joined with `, `) |
//! | `query` | object, name → string, or array of strings for repeated keys |
//! | `body` | parsed per `content-type`; `null` when empty |
//!
//! Body parsing by `content-type`:
//! - `application/json`, `*/*+json` → JSON value (`400 Invalid JSON` otherwise)
//! - `application/x-www-form-urlencoded` → object, like the query
//! - anything else → UTF-8 string, or `null` for binary payloads
//!
//! The raw bytes stay available through [`Request::raw_body`].

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::api_error::ApiError;

/// An incoming HTTP request.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Value,
    pub(crate) query: Value,
    pub(crate) body: Value,
    pub(crate) raw_body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builds a request without a socket: for tests and embedding.
    ///
    /// ```rust
    /// use rested::Request;
    /// use serde_json::json;
    ///
    /// let req = Request::builder()
    ///     .method("POST")
    ///     .uri("/users?notify=true")
    ///     .header("X-Request-Id", "abc")
    ///     .json(json!({ "name": "alice" }))
    ///     .build();
    ///
    /// assert_eq!(req.header("x-request-id"), Some("abc"));
    /// assert_eq!(req.query()["notify"], "true");
    /// ```
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: "GET".to_owned(),
            uri: "/".to_owned(),
            headers: Vec::new(),
            body: Value::Null,
            raw_body: Bytes::new(),
        }
    }

    /// Converts a fully-read `http` request. Fails with `400` when the body
    /// does not parse as its declared content type.
    pub(crate) fn from_http(
        req: http::Request<Bytes>,
        params: HashMap<String, String>,
    ) -> Result<Self, ApiError> {
        let (parts, raw_body) = req.into_parts();

        let headers: Vec<(String, String)> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let headers = header_object(&headers);
        let content_type = headers.get("content-type").and_then(Value::as_str).unwrap_or("");
        let body = parse_body(content_type, &raw_body)?;

        Ok(Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            query: parse_query(parts.uri.query().unwrap_or("")),
            headers: Value::Object(headers),
            body,
            raw_body,
            params,
        })
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &Value { &self.headers }
    pub fn query(&self) -> &Value { &self.query }
    pub fn body(&self) -> &Value { &self.body }
    pub fn raw_body(&self) -> &Bytes { &self.raw_body }

    pub fn headers_mut(&mut self) -> &mut Value { &mut self.headers }
    pub fn query_mut(&mut self) -> &mut Value { &mut self.query }
    pub fn body_mut(&mut self) -> &mut Value { &mut self.body }

    /// Case-insensitive header lookup. `None` when the header is missing or
    /// validation turned it into something other than a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name.to_ascii_lowercase())?.as_str()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Deserializes the body into `T`, failing with `400` on mismatch.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.body)
            .map_err(|err| ApiError::bad_request(err.to_string()).with_source(err))
    }

    /// Deserializes the query into `T`, failing with `400` on mismatch.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.query)
            .map_err(|err| ApiError::bad_request(err.to_string()).with_source(err))
    }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
///
/// Defaults to `GET /` with no headers and a `null` body.
#[derive(Debug)]
pub struct RequestBuilder {
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    body: Value,
    raw_body: Bytes,
}

impl RequestBuilder {
    /// Any method string; unknown methods are kept verbatim.
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_owned();
        self
    }

    /// Path with an optional query string, e.g. `/users?page=2`.
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_owned();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// JSON body; also sets `content-type: application/json`.
    pub fn json(mut self, body: Value) -> Self {
        self.raw_body = Bytes::from(body.to_string());
        self.body = body;
        self.header("content-type", "application/json")
    }

    /// Form body; also sets `content-type: application/x-www-form-urlencoded`.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.body = parse_query(&encoded);
        self.raw_body = Bytes::from(encoded);
        self.header("content-type", "application/x-www-form-urlencoded")
    }

    pub fn build(self) -> Request {
        let (path, query) = match self.uri.split_once('?') {
            Some((path, query)) => (path.to_owned(), query),
            None => (self.uri.clone(), ""),
        };

        Request {
            method: self.method,
            path,
            headers: Value::Object(header_object(&self.headers)),
            query: parse_query(query),
            body: self.body,
            raw_body: self.raw_body,
            params: HashMap::new(),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

fn header_object(headers: &[(String, String)]) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        match out.get_mut(&name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                out.insert(name, Value::String(value.clone()));
            }
        }
    }
    out
}

/// Parses `a=1&b=2&b=3` into `{"a":"1","b":["2","3"]}`.
fn parse_query(query: &str) -> Value {
    let mut out = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match out.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(out)
}

fn parse_body(content_type: &str, raw: &[u8]) -> Result<Value, ApiError> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        return serde_json::from_slice(raw)
            .map_err(|err| ApiError::bad_request("Invalid JSON").with_source(err));
    }

    if mime == "application/x-www-form-urlencoded" {
        let raw = std::str::from_utf8(raw)
            .map_err(|err| ApiError::bad_request("Invalid form body").with_source(err))?;
        return Ok(parse_query(raw));
    }

    Ok(std::str::from_utf8(raw).map_or(Value::Null, |text| Value::String(text.to_owned())))
}
