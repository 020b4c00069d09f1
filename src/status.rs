//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: [`Response::status`],
//! [`ApiError::new`], or [`Response::redirect`].
//!
//! ```rust
//! use rested::{ApiError, Status};
//!
//! let err = ApiError::new(Status::Conflict, "user already exists");
//! assert_eq!(err.status_code(), 409);
//! ```
//!
//! [`Response::status`]: crate::Response::status
//! [`Response::redirect`]: crate::Response::redirect
//! [`ApiError::new`]: crate::ApiError::new

macro_rules! status_codes {
    ($( $variant:ident = $code:literal, $reason:literal; )+) => {
        /// HTTP status codes, with the reason phrases Node.js reports for them.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[allow(clippy::enum_variant_names)]
        pub enum Status {
            $( $variant, )+
        }

        impl From<Status> for u16 {
            fn from(s: Status) -> u16 {
                match s {
                    $( Status::$variant => $code, )+
                }
            }
        }

        /// Reason phrase for a numeric status code, `None` when unregistered.
        pub(crate) fn reason(code: u16) -> Option<&'static str> {
            match code {
                $( $code => Some($reason), )+
                _ => None,
            }
        }
    };
}

status_codes! {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok                            = 200, "OK";
    Created                       = 201, "Created";
    Accepted                      = 202, "Accepted";
    NoContent                     = 204, "No Content";

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently              = 301, "Moved Permanently";
    Found                         = 302, "Found";
    SeeOther                      = 303, "See Other";
    NotModified                   = 304, "Not Modified";
    TemporaryRedirect             = 307, "Temporary Redirect";
    PermanentRedirect             = 308, "Permanent Redirect";

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest                    = 400, "Bad Request";
    Unauthorized                  = 401, "Unauthorized";
    PaymentRequired               = 402, "Payment Required";
    Forbidden                     = 403, "Forbidden";
    NotFound                      = 404, "Not Found";
    MethodNotAllowed              = 405, "Method Not Allowed";
    NotAcceptable                 = 406, "Not Acceptable";
    ProxyAuthenticationRequired   = 407, "Proxy Authentication Required";
    RequestTimeout                = 408, "Request Timeout";
    Conflict                      = 409, "Conflict";
    Gone                          = 410, "Gone";
    LengthRequired                = 411, "Length Required";
    PreconditionFailed            = 412, "Precondition Failed";
    ContentTooLarge               = 413, "Payload Too Large";
    UriTooLong                    = 414, "URI Too Long";
    UnsupportedMediaType          = 415, "Unsupported Media Type";
    RangeNotSatisfiable           = 416, "Range Not Satisfiable";
    ExpectationFailed             = 417, "Expectation Failed";
    ImATeapot                     = 418, "I'm a Teapot";
    MisdirectedRequest            = 421, "Misdirected Request";
    UnprocessableContent          = 422, "Unprocessable Entity";
    Locked                        = 423, "Locked";
    FailedDependency              = 424, "Failed Dependency";
    TooEarly                      = 425, "Too Early";
    UpgradeRequired               = 426, "Upgrade Required";
    PreconditionRequired          = 428, "Precondition Required";
    TooManyRequests               = 429, "Too Many Requests";
    RequestHeaderFieldsTooLarge   = 431, "Request Header Fields Too Large";
    UnavailableForLegalReasons    = 451, "Unavailable For Legal Reasons";

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError           = 500, "Internal Server Error";
    NotImplemented                = 501, "Not Implemented";
    BadGateway                    = 502, "Bad Gateway";
    ServiceUnavailable            = 503, "Service Unavailable";
    GatewayTimeout                = 504, "Gateway Timeout";
    HttpVersionNotSupported       = 505, "HTTP Version Not Supported";
    VariantAlsoNegotiates         = 506, "Variant Also Negotiates";
    InsufficientStorage           = 507, "Insufficient Storage";
    LoopDetected                  = 508, "Loop Detected";
    BandwidthLimitExceeded        = 509, "Bandwidth Limit Exceeded";
    NotExtended                   = 510, "Not Extended";
    NetworkAuthenticationRequired = 511, "Network Authentication Required";
}
