//! Structured HTTP errors.
//!
//! An [`ApiError`] carries everything needed to answer a failed request: the
//! status code, extra response headers, a message, and optionally the
//! original error that caused it. Its [`output`](ApiError::output) is the
//! standardized wire shape every error response uses:
//!
//! ```json
//! {"statusCode":404,"error":"Not Found","message":"no such user"}
//! ```
//!
//! Handlers return `Result<_, ApiError>`. Constructing an `ApiError`
//! explicitly keeps its status; any other `std::error::Error` that reaches it
//! through `?` becomes an internal `500` that remembers the original error
//! for logging but never shows it to the client.
//!
//! ```rust
//! use rested::ApiError;
//!
//! fn parse_id(raw: &str) -> Result<u64, ApiError> {
//!     raw.parse().map_err(|_| ApiError::bad_request(format!("`{raw}` is not an id")))
//! }
//!
//! fn read_config() -> Result<String, ApiError> {
//!     // io::Error → 500, message hidden from the client
//!     Ok(std::fs::read_to_string("/etc/app.toml")?)
//! }
//! # assert_eq!(parse_id("x").unwrap_err().status_code(), 400);
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::method::Method;
use crate::status::{self, Status};

/// The message every `500` payload carries, whatever the real cause was.
const INTERNAL_MESSAGE: &str = "An internal server error occurred";

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A structured HTTP error: status, headers, payload, and an optional cause.
///
/// Errors with a status of `500` or above are *server* errors
/// ([`is_server`](Self::is_server)); the default log strategy only reports
/// those.
#[derive(Debug)]
pub struct ApiError {
    status: u16,
    message: Option<String>,
    headers: Vec<(String, String)>,
    attributes: Map<String, Value>,
    source: Option<BoxError>,
    backtrace: Option<Backtrace>,
}

/// The standardized output of an [`ApiError`]: what gets written to the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorOutput {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub payload: Payload,
}

/// The JSON body of an error response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Payload {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ApiError {
    /// Creates an error with an arbitrary status.
    ///
    /// Statuses below `400` are not errors; they are turned into a `500`.
    pub fn new(status: impl Into<u16>, message: impl Into<String>) -> Self {
        let status = status.into();
        let status = if status < 400 { Status::InternalServerError.into() } else { status };
        let message = message.into();
        Self {
            status,
            message: (!message.is_empty()).then_some(message),
            headers: Vec::new(),
            attributes: Map::new(),
            source: None,
            backtrace: None,
        }
    }

    /// `400 Bad Request`
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, message)
    }

    /// `401 Unauthorized`
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, message)
    }

    /// `403 Forbidden`
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, message)
    }

    /// `404 Not Found`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, message)
    }

    /// `405 Method Not Allowed`, with an `Allow` header listing `allow`.
    pub fn method_not_allowed(message: impl Into<String>, allow: &[Method]) -> Self {
        let err = Self::new(Status::MethodNotAllowed, message);
        if allow.is_empty() {
            return err;
        }
        let allow: Vec<&str> = allow.iter().map(|m| m.as_str()).collect();
        err.with_header("allow", &allow.join(", "))
    }

    /// `409 Conflict`
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(Status::Conflict, message)
    }

    /// `422 Unprocessable Entity`
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(Status::UnprocessableContent, message)
    }

    /// `429 Too Many Requests`
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(Status::TooManyRequests, message)
    }

    /// `500 Internal Server Error`. The message is logged, never sent.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, message)
    }

    /// `501 Not Implemented`
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(Status::NotImplemented, message)
    }

    /// `503 Service Unavailable`
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(Status::ServiceUnavailable, message)
    }

    /// Adds a response header sent along with the error.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Adds a top-level key to the JSON payload.
    ///
    /// The reserved keys `statusCode`, `error` and `message` are ignored.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !matches!(key, "statusCode" | "error" | "message") {
            self.attributes.insert(key.to_owned(), value.into());
        }
        self
    }

    /// Attaches the error that caused this one. It is logged in place of the
    /// wrapper for server errors and is never sent to the client.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self.backtrace = Some(Backtrace::capture());
        self
    }

    /// Drops the backtrace captured by [`with_source`](Self::with_source).
    pub(crate) fn without_backtrace(mut self) -> Self {
        self.backtrace = None;
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// `true` for `5xx` errors: the server's fault, worth logging.
    pub fn is_server(&self) -> bool {
        self.status >= 500
    }

    /// The original error this one wraps, if any.
    pub fn source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Backtrace captured when the original error was attached. Only
    /// populated when `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE` enable capture.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace
            .as_ref()
            .filter(|bt| bt.status() == BacktraceStatus::Captured)
    }

    /// The standardized status, headers and JSON payload for this error.
    pub fn output(&self) -> ErrorOutput {
        let message = if self.status == u16::from(Status::InternalServerError) {
            Some(INTERNAL_MESSAGE.to_owned())
        } else {
            self.message.clone()
        };

        ErrorOutput {
            status_code: self.status,
            headers: self.headers.clone(),
            payload: Payload {
                status_code: self.status,
                error: status::reason(self.status).unwrap_or("Unknown").to_owned(),
                message,
                attributes: self.attributes.clone(),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = status::reason(self.status).unwrap_or("Unknown");
        match &self.message {
            Some(message) => write!(f, "{} {reason}: {message}", self.status),
            None => write!(f, "{} {reason}", self.status),
        }
    }
}

/// Any other error becomes an internal error that wraps it.
///
/// `ApiError` deliberately does not implement `std::error::Error`, so this
/// never swallows an already structured error.
impl<E> From<E> for ApiError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::new(Status::InternalServerError, "").with_source(err)
    }
}
