//! Request validation in front of a handler.
//!
//! [`Schemas`] holds one [`Schema`] per request part. Wrapping a handler with
//! it validates `headers`, `query` and `body` before the handler runs:
//!
//! - on failure the handler never runs and the client gets a `400` whose
//!   message is the validation message;
//! - on success the *normalized* values (converted numbers, filled-in
//!   defaults) replace the raw ones on the request, so the handler only ever
//!   sees validated data.
//!
//! ```rust
//! use rested::{ApiError, Endpoint, Json, Request, Response, Schemas, schema};
//!
//! async fn create(req: Request, _res: Response) -> Result<Json<String>, ApiError> {
//!     Ok(Json(req.body()["name"].as_str().unwrap_or_default().to_owned()))
//! }
//!
//! let users = Endpoint::builder()
//!     .post(
//!         Schemas::new()
//!             .body(schema::object().key("name", schema::string().max(200).required()))
//!             .wrap(create),
//!     )
//!     .build()
//!     .unwrap();
//! # let _ = users;
//! ```
//!
//! Parts without a schema pass through untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::api_error::ApiError;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// Future returned by [`Schema::validate`].
pub type ValidateFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ValidationError>> + Send + 'a>>;

/// A validation failure, with a message fit to show the client.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Dotted path of the offending value, e.g. `body.user.email`.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Validates, and may normalize, one request part.
///
/// `path` names the part (`"headers"`, `"query"`, `"body"`) and should prefix
/// error paths. Built-in rules live in [`schema`](crate::schema); any async
/// closure `Fn(Value) -> impl Future<Output = Result<Value, ValidationError>>`
/// is a schema too.
pub trait Schema: Send + Sync + 'static {
    fn validate<'a>(&'a self, value: Value, path: &'a str) -> ValidateFuture<'a>;
}

impl<F, Fut> Schema for F
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ValidationError>> + Send + 'static,
{
    fn validate<'a>(&'a self, value: Value, _path: &'a str) -> ValidateFuture<'a> {
        Box::pin(self(value))
    }
}

/// The schema map: an optional schema for each of `headers`, `query`, `body`.
#[derive(Clone, Default)]
pub struct Schemas {
    headers: Option<Arc<dyn Schema>>,
    query: Option<Arc<dyn Schema>>,
    body: Option<Arc<dyn Schema>>,
}

impl Schemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, schema: impl Schema) -> Self {
        self.headers = Some(Arc::new(schema));
        self
    }

    pub fn query(mut self, schema: impl Schema) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    pub fn body(mut self, schema: impl Schema) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// Validates the request and writes the normalized parts back onto it.
    ///
    /// Parts are checked in the order `headers`, `query`, `body`; the first
    /// failure aborts and leaves the request untouched.
    pub async fn apply(&self, req: &mut Request) -> Result<(), ApiError> {
        let headers = check(self.headers.as_deref(), &req.headers, "headers").await?;
        let query = check(self.query.as_deref(), &req.query, "query").await?;
        let body = check(self.body.as_deref(), &req.body, "body").await?;

        if let Some(headers) = headers {
            req.headers = headers;
        }
        if let Some(query) = query {
            req.query = query;
        }
        if let Some(body) = body {
            req.body = body;
        }
        Ok(())
    }

    /// Wraps `handler` so it only runs on requests that pass validation.
    pub fn wrap(self, handler: impl Handler) -> impl Handler {
        let schemas = Arc::new(self);
        let inner = handler.into_boxed_handler();

        move |mut req: Request, res: Response| {
            let schemas = Arc::clone(&schemas);
            let inner = Arc::clone(&inner);
            async move {
                schemas.apply(&mut req).await?;
                inner.call(req, res).await
            }
        }
    }
}

impl std::fmt::Debug for Schemas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schemas")
            .field("headers", &self.headers.is_some())
            .field("query", &self.query.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

async fn check(
    schema: Option<&dyn Schema>,
    value: &Value,
    path: &str,
) -> Result<Option<Value>, ApiError> {
    let Some(schema) = schema else {
        return Ok(None);
    };
    match schema.validate(value.clone(), path).await {
        Ok(normalized) => Ok(Some(normalized)),
        Err(err) => Err(ApiError::bad_request(err.message.clone()).with_source(err)),
    }
}
