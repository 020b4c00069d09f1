//! # rested
//!
//! Typed REST endpoints for Rust services behind a reverse proxy.
//!
//! ## The contract
//!
//! An [`Endpoint`] maps HTTP methods to async handlers. Everything between
//! the socket and the handler is the framework's job:
//!
//! - Method dispatch, with a `405` for methods the endpoint does not serve
//! - Optional validation of headers, query and body through [`Schemas`]
//! - Every failure, returned or panicked, turned into an [`ApiError`],
//!   logged, and sent as a Boom-style JSON payload
//! - Server errors never leak their message to the client
//!
//! Error logging and error sending are both swappable per endpoint through
//! [`Config`].
//!
//! What the reverse proxy already owns, rested ignores: TLS termination,
//! body-size limits, rate limiting, slow-client protection.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rested::schema::{integer, object, string};
//! use rested::{ApiError, Endpoint, Json, Request, Response, Router, Schemas, Server};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rested::Error> {
//!     let create = Schemas::new().body(
//!         object()
//!             .key("name", string().min(1).required())
//!             .key("age", integer().min(0)),
//!     );
//!
//!     let users = Endpoint::builder()
//!         .get(list_users)
//!         .post(create.wrap(create_user))
//!         .build()?;
//!
//!     let app = Router::new().route("/users", users)?;
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn list_users(_req: Request, _res: Response) -> Result<Json<Vec<Value>>, ApiError> {
//!     Ok(Json(vec![json!({ "id": 1, "name": "alice" })]))
//! }
//!
//! async fn create_user(req: Request, res: Response) -> Result<Value, ApiError> {
//!     res.status(201u16);
//!     Ok(json!({ "id": 2, "name": req.body()["name"] }))
//! }
//! ```

mod api_error;
mod config;
mod endpoint;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;
mod validate;

pub mod schema;

pub use api_error::{ApiError, ErrorOutput, Payload};
pub use config::{Config, LogError, SendError, default_log_error, default_send_error};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::Error;
pub use handler::{Body, Handler, IntoBody, Json};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use validate::{Schema, Schemas, ValidateFuture, ValidationError};
