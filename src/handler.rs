//! Handler trait, reply bodies, and type erasure.
//!
//! # What a handler is
//!
//! Any async function taking the [`Request`] and a [`Response`] handle and
//! returning `Result<R, E>`:
//!
//! - `R` is anything implementing [`IntoBody`]: `()` for "nothing to send",
//!   [`Json<T>`] or [`serde_json::Value`] for a JSON body. A JSON `null` is a
//!   valid body and is sent as the literal `null`.
//! - `E` is anything that converts into an [`ApiError`]: the error itself, or
//!   any `std::error::Error` (which becomes a `500`).
//!
//! # How handlers are stored
//!
//! An endpoint holds handlers of *different* concrete types in one map, so
//! each is hidden behind a trait object:
//!
//! ```text
//! async fn get_user(req, res) -> Result<Json<User>, ApiError>   ← user writes this
//!        ↓ Endpoint::builder().get(get_user)
//! get_user.into_boxed_handler()                                 ← blanket impl
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req, res)                                        ← one vtable call
//!        ↓
//! Box::pin(async { get_user(req, res).await → Result<Body, ApiError> })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::api_error::ApiError;
use crate::request::Request;
use crate::response::Response;

// ── Reply bodies ──────────────────────────────────────────────────────────────

/// What a handler produced, after conversion.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// The handler returned nothing.
    Nothing,
    /// A JSON value, possibly `null`.
    Json(Value),
}

/// Serializes `T` as the JSON response body.
///
/// ```rust
/// use rested::{ApiError, Json, Request, Response};
///
/// #[derive(serde::Serialize)]
/// struct User { id: u64 }
///
/// async fn get_user(_req: Request, _res: Response) -> Result<Json<User>, ApiError> {
///     Ok(Json(User { id: 1 }))
/// }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Json<T>(pub T);

/// Conversion of a handler's return value into a reply [`Body`].
pub trait IntoBody {
    fn into_body(self) -> Result<Body, ApiError>;
}

impl IntoBody for Body {
    fn into_body(self) -> Result<Body, ApiError> {
        Ok(self)
    }
}

impl IntoBody for () {
    fn into_body(self) -> Result<Body, ApiError> {
        Ok(Body::Nothing)
    }
}

impl IntoBody for Value {
    fn into_body(self) -> Result<Body, ApiError> {
        Ok(Body::Json(self))
    }
}

impl<T: Serialize> IntoBody for Json<T> {
    fn into_body(self) -> Result<Body, ApiError> {
        Ok(Body::Json(serde_json::to_value(&self.0)?))
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased handler future.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Body, ApiError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, res: Response) -> BoxFuture;
}

/// A type-erased handler, shared by every request hitting its endpoint.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid method handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the shape
///
/// ```text
/// async fn name(req: Request, res: Response) -> Result<impl IntoBody, impl Into<ApiError>>
/// ```
///
/// and by the wrappers [`Schemas::wrap`](crate::Schemas::wrap) returns.
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R, E> private::Sealed for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoBody + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
}

impl<F, Fut, R, E> Handler for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoBody + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R, E> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoBody + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    fn call(&self, req: Request, res: Response) -> BoxFuture {
        let fut = (self.0)(req, res);
        Box::pin(async move {
            match fut.await {
                Ok(value) => value.into_body(),
                Err(err) => Err(err.into()),
            }
        })
    }
}
