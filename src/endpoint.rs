//! Per-method dispatch for one REST resource.
//!
//! An [`Endpoint`] owns a handler per HTTP method and turns every request into
//! exactly one response:
//!
//! ```text
//! request ─→ handler for req.method ─→ Ok(value)  ─→ JSON body (null → `null`)
//!                  │                 └→ Err(err)  ─→ log_error → send_error
//!                  └─ no handler ─────────────────→ 405 → log_error → send_error
//! ```
//!
//! ```rust
//! use rested::{ApiError, Endpoint, Json, Request, Response};
//! use serde_json::{Value, json};
//!
//! async fn list(_req: Request, _res: Response) -> Result<Value, ApiError> {
//!     Ok(json!([{ "id": 1 }]))
//! }
//!
//! async fn remove(req: Request, _res: Response) -> Result<Json<Option<u64>>, ApiError> {
//!     let id = req.param("id").ok_or_else(|| ApiError::bad_request("missing id"))?;
//!     Ok(Json(id.parse().ok()))
//! }
//!
//! let users = Endpoint::builder().get(list).delete(remove).build().unwrap();
//! # let _ = users;
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use bytes::Bytes;
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::api_error::ApiError;
use crate::config::Config;
use crate::error::Error;
use crate::handler::{Body, BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::{JSON_CONTENT_TYPE, Response};

/// Logged when a handler both sends the response itself and returns a value.
const SENT_AND_RETURNED: &str = "You have sent the response inside your handler but still returned something. \
    This error was not sent to the client, however you should probably not return a value in the handler.";

/// A set of method handlers behind one URL, plus the error strategies.
pub struct Endpoint {
    handlers: BTreeMap<Method, BoxedHandler>,
    config: Config,
}

/// Builder for [`Endpoint`]. Obtain via [`Endpoint::builder()`].
pub struct EndpointBuilder {
    handlers: BTreeMap<Method, BoxedHandler>,
    config: Config,
}

impl EndpointBuilder {
    /// Registers `handler` for `method`, replacing any earlier one.
    pub fn on(mut self, method: Method, handler: impl Handler) -> Self {
        self.handlers.insert(method, handler.into_boxed_handler());
        self
    }

    pub fn get(self, handler: impl Handler) -> Self { self.on(Method::Get, handler) }
    pub fn post(self, handler: impl Handler) -> Self { self.on(Method::Post, handler) }
    pub fn put(self, handler: impl Handler) -> Self { self.on(Method::Put, handler) }
    pub fn patch(self, handler: impl Handler) -> Self { self.on(Method::Patch, handler) }
    pub fn delete(self, handler: impl Handler) -> Self { self.on(Method::Delete, handler) }

    /// Replaces the default error strategies.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Fails with [`Error::NoHandlers`] when no method has a handler.
    pub fn build(self) -> Result<Endpoint, Error> {
        if self.handlers.is_empty() {
            return Err(Error::NoHandlers);
        }
        Ok(Endpoint { handlers: self.handlers, config: self.config })
    }
}

impl Endpoint {
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder { handlers: BTreeMap::new(), config: Config::default() }
    }

    /// Methods this endpoint answers, in a stable order.
    pub fn methods(&self) -> Vec<Method> {
        self.handlers.keys().copied().collect()
    }

    /// Runs the request through its method handler and returns the response.
    ///
    /// Never fails: every error, including a panicking handler, ends up as a
    /// structured error response.
    pub async fn handle(&self, req: Request) -> Response {
        let res = Response::new();
        if let Err(err) = self.dispatch(req, res.clone()).await {
            self.config.report(&res, &err);
        }
        res
    }

    async fn dispatch(&self, req: Request, res: Response) -> Result<(), ApiError> {
        let method = req.method().to_owned();
        let handler = method
            .parse::<Method>()
            .ok()
            .and_then(|m| self.handlers.get(&m))
            .ok_or_else(|| {
                ApiError::method_not_allowed(
                    format!("Method {method} is not supported for this endpoint"),
                    &self.methods(),
                )
            })?;

        debug!(method = %method, path = req.path(), "dispatching");

        // Deferred into the async block so a panic while building the
        // handler's future is caught too.
        let call = async { handler.call(req, res.clone()).await };
        let body = AssertUnwindSafe(call)
            .catch_unwind()
            .await
            .map_err(panic_error)??;

        if res.headers_sent() {
            if body != Body::Nothing {
                (self.config.log_error)(&ApiError::internal(SENT_AND_RETURNED));
            }
            return Ok(());
        }

        match body {
            Body::Json(Value::Null) => {
                res.set_header("content-type", JSON_CONTENT_TYPE);
                res.set_header("content-length", "4");
                res.end("null");
            }
            Body::Json(value) => res.json(&value)?,
            Body::Nothing => {
                if res.header("content-type").is_none() {
                    res.set_header("content-type", JSON_CONTENT_TYPE);
                }
                res.end(Bytes::new());
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").field("methods", &self.methods()).finish()
    }
}

/// Wraps a panic payload. No backtrace: one taken here would show the
/// dispatcher, not the panic site.
fn panic_error(payload: Box<dyn Any + Send>) -> ApiError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    ApiError::internal("handler panicked").with_source(message).without_backtrace()
}
