//! Infrastructure error type.

/// The error type returned by rested's fallible setup and serving operations.
///
/// Application-level failures (404, 422, etc.) are expressed as
/// [`ApiError`](crate::ApiError) values and sent to the client, never as
/// `Error`s. This type surfaces failures of composing endpoints, binding to a
/// port, or accepting a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket-level failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The bind address is not a valid `host:port` pair.
    #[error("invalid socket address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    /// An endpoint was built without a single method handler.
    #[error("an endpoint needs a handler for at least one method")]
    NoHandlers,

    /// A route path was rejected by the path router.
    #[error("invalid route `{path}`: {source}")]
    InvalidRoute {
        path: String,
        source: matchit::InsertError,
    },
}
