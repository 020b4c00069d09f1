//! Outgoing HTTP response handle.
//!
//! Every request gets one [`Response`]. Handlers receive a clone of it and may
//! write to it directly (redirects, custom content types, streaming a file
//! they already have in memory), or simply return a value and let the
//! endpoint write it.
//!
//! A response is *sent* once [`json`](Response::json), [`end`](Response::end)
//! or [`redirect`](Response::redirect) is called. After that every further
//! write is ignored and logged: the wire gets exactly one response.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::api_error::ApiError;
use crate::status::Status;

/// `content-type` used for every JSON write.
pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A cheap, cloneable handle to the response of one request.
///
/// ```rust
/// use rested::{Response, Status};
///
/// let res = Response::new();
/// res.status(Status::Created).set_header("location", "/users/42");
/// res.json(&serde_json::json!({ "id": 42 })).unwrap();
///
/// assert!(res.headers_sent());
/// assert_eq!(res.status_code(), 201);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Response {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
    sent: bool,
}

impl Default for State {
    fn default() -> Self {
        Self { status: Status::Ok.into(), headers: Vec::new(), body: Bytes::new(), sent: false }
    }
}

impl Response {
    /// A fresh `200 OK` response with no headers and nothing sent.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets a header, replacing any existing value (names are case-insensitive).
    pub fn set_header(&self, name: &str, value: &str) -> &Self {
        let mut state = self.state();
        if state.sent {
            warn!(header = name, "header set after the response was sent; ignored");
            return self;
        }
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        state.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Sets the status code.
    pub fn status(&self, code: impl Into<u16>) -> &Self {
        let code = code.into();
        let mut state = self.state();
        if state.sent {
            warn!(status = code, "status set after the response was sent; ignored");
            return self;
        }
        state.status = code;
        self
    }

    /// Serializes `value` as the JSON body and sends the response.
    ///
    /// Sets `content-type: application/json; charset=utf-8` unless a
    /// content type was already set.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), ApiError> {
        let body = serde_json::to_vec(value)?;
        if self.header("content-type").is_none() {
            self.set_header("content-type", JSON_CONTENT_TYPE);
        }
        self.end(body);
        Ok(())
    }

    /// Sends `body` as-is with whatever headers were set.
    pub fn end(&self, body: impl Into<Bytes>) {
        let mut state = self.state();
        if state.sent {
            warn!("response already sent; body ignored");
            return;
        }
        state.body = body.into();
        state.sent = true;
    }

    /// Sends a redirect to `location` with the given `3xx` status.
    pub fn redirect(&self, status: Status, location: &str) {
        self.status(status).set_header("location", location);
        self.end(Bytes::new());
    }

    /// `true` once a body has been sent.
    pub fn headers_sent(&self) -> bool {
        self.state().sent
    }

    pub fn status_code(&self) -> u16 {
        self.state().status
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<String> {
        self.state()
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        self.state().headers.clone()
    }

    pub fn body(&self) -> Bytes {
        self.state().body.clone()
    }

    /// Converts into an `http` response for hyper.
    ///
    /// `content-length` always reflects the body. Headers that are not valid
    /// HTTP are dropped with a warning; an invalid status becomes `500`.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let state = std::mem::take(&mut *self.state());

        let mut response = http::Response::new(Full::new(state.body.clone()));
        *response.status_mut() = http::StatusCode::from_u16(state.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        let headers = response.headers_mut();
        for (name, value) in &state.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "invalid response header dropped"),
            }
        }
        headers.insert(http::header::CONTENT_LENGTH, http::HeaderValue::from(state.body.len()));

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_should_write_json_once() {
        let res = Response::new();
        res.json(&json!({ "first": true })).unwrap();
        res.json(&json!({ "second": true })).unwrap();
        res.status(Status::BadRequest);
        res.set_header("x-late", "1");

        assert_eq!(res.body(), Bytes::from_static(br#"{"first":true}"#));
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("x-late"), None);
        assert_eq!(res.header("Content-Type").as_deref(), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_should_keep_explicit_content_type() {
        let res = Response::new();
        res.set_header("Content-Type", "application/problem+json");
        res.json(&json!({})).unwrap();

        assert_eq!(res.header("content-type").as_deref(), Some("application/problem+json"));
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn test_should_replace_headers_case_insensitively() {
        let res = Response::new();
        res.set_header("X-Id", "1").set_header("x-id", "2");

        assert_eq!(res.headers(), vec![("x-id".to_owned(), "2".to_owned())]);
    }

    #[test]
    fn test_should_share_state_between_clones() {
        let res = Response::new();
        let handle = res.clone();
        handle.redirect(Status::SeeOther, "/login");

        assert!(res.headers_sent());
        assert_eq!(res.status_code(), 303);
        assert_eq!(res.header("location").as_deref(), Some("/login"));
    }

    #[test]
    fn test_should_convert_into_http_response() {
        let res = Response::new();
        res.status(Status::Created).set_header("x-bad\n", "1").set_header("x-ok", "yes");
        res.end("null");

        let http = res.into_inner();
        assert_eq!(http.status(), http::StatusCode::CREATED);
        assert_eq!(http.headers()["content-length"], "4");
        assert_eq!(http.headers()["x-ok"], "yes");
        assert_eq!(http.headers().len(), 2);
    }
}
