//! Radix-tree path router.
//!
//! One tree, one [`Endpoint`] per path. The endpoint picks the handler for the
//! method, so a path that exists always answers: `405` for a method it does
//! not serve, never `404`.

use std::collections::HashMap;

use bytes::Bytes;
use http_body_util::Full;
use matchit::Router as MatchitRouter;

use crate::api_error::ApiError;
use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// The application router. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: MatchitRouter<Endpoint>,
    config: Config,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: MatchitRouter::new(), config: Config::default() }
    }

    /// Mounts `endpoint` at `path`. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use rested::{ApiError, Endpoint, Request, Response, Router};
    /// # async fn get_user(_: Request, _: Response) -> Result<(), ApiError> { Ok(()) }
    /// # async fn list_users(_: Request, _: Response) -> Result<(), ApiError> { Ok(()) }
    /// # fn main() -> Result<(), rested::Error> {
    /// let app = Router::new()
    ///     .route("/users", Endpoint::builder().get(list_users).build()?)?
    ///     .route("/users/{id}", Endpoint::builder().get(get_user).build()?)?;
    /// # let _ = app;
    /// # Ok(())
    /// # }
    /// ```
    pub fn route(mut self, path: &str, endpoint: Endpoint) -> Result<Self, Error> {
        self.routes
            .insert(path, endpoint)
            .map_err(|source| Error::InvalidRoute { path: path.to_owned(), source })?;
        Ok(self)
    }

    /// Error strategies for failures that happen before an endpoint is
    /// reached: unknown paths and unreadable bodies.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    fn lookup(&self, path: &str) -> Option<(&Endpoint, HashMap<String, String>)> {
        let matched = self.routes.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value, params))
    }

    /// Routes a fully-read request and produces its response.
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        let Some((endpoint, params)) = self.lookup(req.uri().path()) else {
            return self.reject(ApiError::not_found(""));
        };

        match Request::from_http(req, params) {
            Ok(req) => endpoint.handle(req).await.into_inner(),
            Err(err) => self.reject(err),
        }
    }

    /// Answers with `err` without involving any endpoint.
    pub(crate) fn reject(&self, err: ApiError) -> http::Response<Full<Bytes>> {
        let res = Response::new();
        self.config.report(&res, &err);
        res.into_inner()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
