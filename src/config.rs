//! Error strategies: how failures are logged and how they are sent.
//!
//! An [`Endpoint`](crate::Endpoint) never decides either on its own. It hands
//! every [`ApiError`] to the configured `log_error`, then to the configured
//! `send_error`. Override one and the other keeps its default:
//!
//! ```rust
//! use rested::Config;
//!
//! let cfg = Config::new().log_error(|err| {
//!     if err.is_server() {
//!         eprintln!("{err}");
//!     }
//! });
//! # let _ = cfg;
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::error;

use crate::api_error::{ApiError, ErrorOutput};
use crate::response::{JSON_CONTENT_TYPE, Response};

/// Decides whether and how to log an error.
pub type LogError = Arc<dyn Fn(&ApiError) + Send + Sync + 'static>;

/// Writes an error onto the response.
pub type SendError = Arc<dyn Fn(&Response, &ApiError) + Send + Sync + 'static>;

/// The pair of error strategies an endpoint uses.
#[derive(Clone)]
pub struct Config {
    pub(crate) log_error: LogError,
    pub(crate) send_error: SendError,
}

impl Config {
    /// The default strategies: [`default_log_error`] and [`default_send_error`].
    pub fn new() -> Self {
        Self {
            log_error: Arc::new(default_log_error),
            send_error: Arc::new(default_send_error),
        }
    }

    pub fn log_error(mut self, f: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.log_error = Arc::new(f);
        self
    }

    pub fn send_error(mut self, f: impl Fn(&Response, &ApiError) + Send + Sync + 'static) -> Self {
        self.send_error = Arc::new(f);
        self
    }

    /// Logs `err`, then sends it on `res`. A panicking strategy never stops
    /// the other one, and a panicking send falls back to
    /// [`default_send_error`] when nothing was sent yet.
    pub(crate) fn report(&self, res: &Response, err: &ApiError) {
        if catch_unwind(AssertUnwindSafe(|| (self.log_error)(err))).is_err() {
            error!(status = err.status_code(), "log_error strategy panicked");
        }

        if catch_unwind(AssertUnwindSafe(|| (self.send_error)(res, err))).is_err() {
            error!(status = err.status_code(), "send_error strategy panicked");
            if !res.headers_sent() {
                default_send_error(res, err);
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Config { .. }")
    }
}

// ── Default strategies ────────────────────────────────────────────────────────

/// Logs server (`5xx`) errors through `tracing`; client errors are ignored.
///
/// When the error wraps an original error, that one is logged (with its
/// cause chain and backtrace, when captured) instead of the wrapper.
pub fn default_log_error(err: &ApiError) {
    if !err.is_server() {
        return;
    }

    let status = err.status_code();
    match (err.source(), err.backtrace()) {
        (Some(source), Some(backtrace)) => {
            error!(status, error = %Chain(source), "request failed\n{backtrace}");
        }
        (Some(source), None) => error!(status, error = %Chain(source), "request failed"),
        (None, _) => error!(status, error = %err, "request failed"),
    }
}

/// Copies the error's headers onto `res`, sets its status and writes its
/// payload as JSON. The content type is always JSON, whatever the handler or
/// the error set before. Does not check whether `res` was already sent.
pub fn default_send_error(res: &Response, err: &ApiError) {
    let ErrorOutput { status_code, headers, payload } = err.output();

    for (name, value) in &headers {
        res.set_header(name, value);
    }
    res.set_header("content-type", JSON_CONTENT_TYPE);
    res.status(status_code);
    if let Err(e) = res.json(&payload) {
        error!(status = status_code, error = %e, "failed to serialize error payload");
    }
}

/// Displays an error followed by each of its causes: `outer: inner: root`.
struct Chain<'a>(&'a (dyn StdError + 'static));

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut cause = self.0.source();
        while let Some(err) = cause {
            write!(f, ": {err}")?;
            cause = err.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    use serde_json::{Value, json};

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("could not contact upstream")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_should_render_cause_chain() {
        let err = Outer(std::io::Error::other("connection refused"));
        assert_eq!(Chain(&err).to_string(), "could not contact upstream: connection refused");
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` under a subscriber that records formatted log lines.
    fn logs_of(f: impl FnOnce()) -> String {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_should_log_original_error_of_server_errors() {
        let logs = logs_of(|| {
            default_log_error(
                &ApiError::internal("Could not contact upstream")
                    .with_source(Outer(std::io::Error::other("refused"))),
            );
        });

        assert!(logs.contains("could not contact upstream: refused"));
        assert!(logs.contains("status=500"));
    }

    #[test]
    fn test_should_log_wrapper_without_original_error() {
        let logs = logs_of(|| default_log_error(&ApiError::internal("Could not contact upstream")));
        assert!(logs.contains("500 Internal Server Error: Could not contact upstream"));
    }

    #[test]
    fn test_should_not_log_client_errors() {
        let logs = logs_of(|| {
            for _ in 0..5 {
                default_log_error(
                    &ApiError::bad_request("Bad Request").with_source(std::io::Error::other("ignored")),
                );
                default_log_error(&ApiError::not_found("nope"));
            }
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn test_should_send_status_headers_and_payload() {
        let res = Response::new();
        let err = ApiError::too_many_requests("slow down").with_header("Retry-After", "30");

        default_send_error(&res, &err);

        let body: Value = serde_json::from_slice(&res.body()).unwrap();
        assert_eq!(body, json!({ "statusCode": 429, "error": "Too Many Requests", "message": "slow down" }));
        assert_eq!(res.status_code(), 429);
        assert_eq!(res.header("retry-after").as_deref(), Some("30"));
        assert_eq!(res.header("content-type").as_deref(), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_should_send_error_as_json_over_earlier_content_type() {
        let res = Response::new();
        res.set_header("Content-Type", "text/html");

        default_send_error(&res, &ApiError::bad_request("nope").with_header("content-type", "text/plain"));

        assert_eq!(res.header("content-type").as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn test_should_send_even_when_log_strategy_panics() {
        let cfg = Config::new().log_error(|_err| panic!("logger down"));
        let res = Response::new();

        cfg.report(&res, &ApiError::not_found(""));

        let body: Value = serde_json::from_slice(&res.body()).unwrap();
        assert_eq!(body, json!({ "statusCode": 404, "error": "Not Found" }));
    }

    #[test]
    fn test_should_fall_back_to_default_send_when_send_strategy_panics() {
        let cfg = Config::new().send_error(|_res, _err| panic!("sender down"));
        let res = Response::new();

        cfg.report(&res, &ApiError::conflict("taken"));

        let body: Value = serde_json::from_slice(&res.body()).unwrap();
        assert_eq!(body, json!({ "statusCode": 409, "error": "Conflict", "message": "taken" }));
        assert_eq!(res.status_code(), 409);
    }

    #[test]
    fn test_should_keep_partial_send_when_send_strategy_panics_after_sending() {
        let cfg = Config::new().send_error(|res, _err| {
            res.end("partial");
            panic!("sender down");
        });
        let res = Response::new();

        cfg.report(&res, &ApiError::conflict("taken"));

        assert_eq!(res.body().as_ref(), b"partial");
    }

    #[test]
    fn test_should_override_one_strategy_and_keep_the_other() {
        let cfg = Config::new().send_error(|res, _err| res.end("custom"));
        let res = Response::new();

        (cfg.send_error)(&res, &ApiError::not_found(""));
        (cfg.log_error)(&ApiError::internal("still the default"));

        assert_eq!(res.body().as_ref(), b"custom");
    }
}
