//! HTTP status codes as a typed enum.
//!
//! Every variant's discriminant is its IANA-assigned code, so
//! `Status::NotFound as u16 == 404` holds by construction. Use [`Status`]
//! wherever a handler picks a response code instead of a bare integer.
//!
//! ```rust
//! use switchyard::Status;
//!
//! assert_eq!(Status::TooManyRequests.as_u16(), 429);
//! assert_eq!(Status::from_u16(404), Some(Status::NotFound));
//! assert_eq!(Status::NotFound.to_string(), "404 Not Found");
//! ```

use std::fmt;

/// All IANA-registered HTTP status codes.
#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u16)]
pub enum Status {
    // ── 1xx Informational ─────────────────────────────────────────────────────
    Continue                      = 100,
    SwitchingProtocols            = 101,
    Processing                    = 102,
    EarlyHints                    = 103,

    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok                            = 200,
    Created                       = 201,
    Accepted                      = 202,
    NonAuthoritativeInformation   = 203,
    NoContent                     = 204,
    ResetContent                  = 205,
    PartialContent                = 206,
    MultiStatus                   = 207,
    AlreadyReported               = 208,
    ImUsed                        = 226,

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MultipleChoices               = 300,
    MovedPermanently              = 301,
    Found                         = 302,
    SeeOther                      = 303,
    NotModified                   = 304,
    UseProxy                      = 305,
    TemporaryRedirect             = 307,
    PermanentRedirect             = 308,

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest                    = 400,
    Unauthorized                  = 401,
    PaymentRequired               = 402,
    Forbidden                     = 403,
    NotFound                      = 404,
    MethodNotAllowed              = 405,
    NotAcceptable                 = 406,
    ProxyAuthenticationRequired   = 407,
    RequestTimeout                = 408,
    Conflict                      = 409,
    Gone                          = 410,
    LengthRequired                = 411,
    PreconditionFailed            = 412,
    ContentTooLarge               = 413,
    UriTooLong                    = 414,
    UnsupportedMediaType          = 415,
    RangeNotSatisfiable           = 416,
    ExpectationFailed             = 417,
    ImATeapot                     = 418,
    MisdirectedRequest            = 421,
    UnprocessableContent          = 422,
    Locked                        = 423,
    FailedDependency              = 424,
    TooEarly                      = 425,
    UpgradeRequired               = 426,
    PreconditionRequired          = 428,
    TooManyRequests               = 429,
    RequestHeaderFieldsTooLarge   = 431,
    UnavailableForLegalReasons    = 451,

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError           = 500,
    NotImplemented                = 501,
    BadGateway                    = 502,
    ServiceUnavailable            = 503,
    GatewayTimeout                = 504,
    HttpVersionNotSupported       = 505,
    VariantAlsoNegotiates         = 506,
    InsufficientStorage           = 507,
    LoopDetected                  = 508,
    NotExtended                   = 510,
    NetworkAuthenticationRequired = 511,
}

impl Status {
    /// Every registered status, in ascending numeric order.
    pub const ALL: [Status; 62] = [
        Self::Continue,
        Self::SwitchingProtocols,
        Self::Processing,
        Self::EarlyHints,
        Self::Ok,
        Self::Created,
        Self::Accepted,
        Self::NonAuthoritativeInformation,
        Self::NoContent,
        Self::ResetContent,
        Self::PartialContent,
        Self::MultiStatus,
        Self::AlreadyReported,
        Self::ImUsed,
        Self::MultipleChoices,
        Self::MovedPermanently,
        Self::Found,
        Self::SeeOther,
        Self::NotModified,
        Self::UseProxy,
        Self::TemporaryRedirect,
        Self::PermanentRedirect,
        Self::BadRequest,
        Self::Unauthorized,
        Self::PaymentRequired,
        Self::Forbidden,
        Self::NotFound,
        Self::MethodNotAllowed,
        Self::NotAcceptable,
        Self::ProxyAuthenticationRequired,
        Self::RequestTimeout,
        Self::Conflict,
        Self::Gone,
        Self::LengthRequired,
        Self::PreconditionFailed,
        Self::ContentTooLarge,
        Self::UriTooLong,
        Self::UnsupportedMediaType,
        Self::RangeNotSatisfiable,
        Self::ExpectationFailed,
        Self::ImATeapot,
        Self::MisdirectedRequest,
        Self::UnprocessableContent,
        Self::Locked,
        Self::FailedDependency,
        Self::TooEarly,
        Self::UpgradeRequired,
        Self::PreconditionRequired,
        Self::TooManyRequests,
        Self::RequestHeaderFieldsTooLarge,
        Self::UnavailableForLegalReasons,
        Self::InternalServerError,
        Self::NotImplemented,
        Self::BadGateway,
        Self::ServiceUnavailable,
        Self::GatewayTimeout,
        Self::HttpVersionNotSupported,
        Self::VariantAlsoNegotiates,
        Self::InsufficientStorage,
        Self::LoopDetected,
        Self::NotExtended,
        Self::NetworkAuthenticationRequired,
    ];

    /// The numeric code as sent on the wire.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Looks up the variant registered for `code`.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL
            .binary_search_by_key(&code, |s| s.as_u16())
            .ok()
            .map(|i| Self::ALL[i])
    }

    pub const fn is_informational(self) -> bool { matches!(self.as_u16(), 100..=199) }
    pub const fn is_success(self) -> bool       { matches!(self.as_u16(), 200..=299) }
    pub const fn is_redirection(self) -> bool   { matches!(self.as_u16(), 300..=399) }
    pub const fn is_client_error(self) -> bool  { matches!(self.as_u16(), 400..=499) }
    pub const fn is_server_error(self) -> bool  { matches!(self.as_u16(), 500..=599) }

    /// Canonical reason phrase (RFC 9110 wording where it differs from older RFCs).
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Continue                      => "Continue",
            Self::SwitchingProtocols            => "Switching Protocols",
            Self::Processing                    => "Processing",
            Self::EarlyHints                    => "Early Hints",
            Self::Ok                            => "OK",
            Self::Created                       => "Created",
            Self::Accepted                      => "Accepted",
            Self::NonAuthoritativeInformation   => "Non-Authoritative Information",
            Self::NoContent                     => "No Content",
            Self::ResetContent                  => "Reset Content",
            Self::PartialContent                => "Partial Content",
            Self::MultiStatus                   => "Multi-Status",
            Self::AlreadyReported               => "Already Reported",
            Self::ImUsed                        => "IM Used",
            Self::MultipleChoices               => "Multiple Choices",
            Self::MovedPermanently              => "Moved Permanently",
            Self::Found                         => "Found",
            Self::SeeOther                      => "See Other",
            Self::NotModified                   => "Not Modified",
            Self::UseProxy                      => "Use Proxy",
            Self::TemporaryRedirect             => "Temporary Redirect",
            Self::PermanentRedirect             => "Permanent Redirect",
            Self::BadRequest                    => "Bad Request",
            Self::Unauthorized                  => "Unauthorized",
            Self::PaymentRequired               => "Payment Required",
            Self::Forbidden                     => "Forbidden",
            Self::NotFound                      => "Not Found",
            Self::MethodNotAllowed              => "Method Not Allowed",
            Self::NotAcceptable                 => "Not Acceptable",
            Self::ProxyAuthenticationRequired   => "Proxy Authentication Required",
            Self::RequestTimeout                => "Request Timeout",
            Self::Conflict                      => "Conflict",
            Self::Gone                          => "Gone",
            Self::LengthRequired                => "Length Required",
            Self::PreconditionFailed            => "Precondition Failed",
            Self::ContentTooLarge               => "Content Too Large",
            Self::UriTooLong                    => "URI Too Long",
            Self::UnsupportedMediaType          => "Unsupported Media Type",
            Self::RangeNotSatisfiable           => "Range Not Satisfiable",
            Self::ExpectationFailed             => "Expectation Failed",
            Self::ImATeapot                     => "I'm a Teapot",
            Self::MisdirectedRequest            => "Misdirected Request",
            Self::UnprocessableContent          => "Unprocessable Content",
            Self::Locked                        => "Locked",
            Self::FailedDependency              => "Failed Dependency",
            Self::TooEarly                      => "Too Early",
            Self::UpgradeRequired               => "Upgrade Required",
            Self::PreconditionRequired          => "Precondition Required",
            Self::TooManyRequests               => "Too Many Requests",
            Self::RequestHeaderFieldsTooLarge   => "Request Header Fields Too Large",
            Self::UnavailableForLegalReasons    => "Unavailable For Legal Reasons",
            Self::InternalServerError           => "Internal Server Error",
            Self::NotImplemented                => "Not Implemented",
            Self::BadGateway                    => "Bad Gateway",
            Self::ServiceUnavailable            => "Service Unavailable",
            Self::GatewayTimeout                => "Gateway Timeout",
            Self::HttpVersionNotSupported       => "HTTP Version Not Supported",
            Self::VariantAlsoNegotiates         => "Variant Also Negotiates",
            Self::InsufficientStorage           => "Insufficient Storage",
            Self::LoopDetected                  => "Loop Detected",
            Self::NotExtended                   => "Not Extended",
            Self::NetworkAuthenticationRequired => "Network Authentication Required",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.as_u16()
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        // Every registered code lies in 100..=599, which `http` always accepts.
        http::StatusCode::from_u16(s.as_u16()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Returned by `Status::try_from` for codes with no IANA registration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unregistered status code {0}")]
pub struct UnknownStatus(pub u16);

impl TryFrom<u16> for Status {
    type Error = UnknownStatus;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_u16(code).ok_or(UnknownStatus(code))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}
