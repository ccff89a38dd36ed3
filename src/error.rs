//! Error taxonomy shared by every contract.
//!
//! Each failure kind is a distinct variant so callers can branch on it
//! without string matching. Nothing here retries or logs; errors go back to
//! the immediate caller.

use crate::server::ServerState;
use crate::status::Status;

/// Boxed error accepted from application code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by every fallible contract operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body could not be decoded into the requested shape.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// A response write was rejected.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The server could not begin listening.
    #[error(transparent)]
    Start(#[from] StartError),

    /// Graceful shutdown did not complete cleanly.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),

    /// A handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("invalid header: {0}")]
    Header(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an application error returned from a handler.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(HandlerError { status: None, source: err.into() })
    }

    /// A handler error that asks the adapter to answer with `status`.
    ///
    /// ```rust
    /// use switchyard::{Error, Status};
    ///
    /// let err = Error::with_status(Status::NotFound, "no such user");
    /// assert_eq!(err.to_string(), "no such user");
    /// ```
    pub fn with_status(status: Status, message: impl Into<String>) -> Self {
        Self::Handler(HandlerError { status: Some(status), source: message.into().into() })
    }

    /// `true` for a shutdown that ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Shutdown(ShutdownError::Timeout { .. }))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed form data: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("cannot bind content type `{0}`")]
    UnsupportedMediaType(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("response already committed")]
    Committed,

    #[error("response body could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The request this context belonged to has already been answered.
    #[error("request is no longer active")]
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("cannot start a server that is {0}")]
    InvalidState(ServerState),

    #[error("start cancelled before the listener was bound")]
    Cancelled,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("cannot stop a server that is {0}")]
    InvalidState(ServerState),

    #[error("shutdown deadline elapsed with {in_flight} request(s) in flight")]
    Timeout { in_flight: usize },

    #[error("server task ended abnormally: {0}")]
    Abnormal(String),
}

/// An error returned by a handler, optionally carrying the status the
/// adapter should answer with.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct HandlerError {
    status: Option<Status>,
    source: BoxError,
}

impl HandlerError {
    pub fn status(&self) -> Option<Status> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        let err: Error = WriteError::Committed.into();
        assert!(matches!(err, Error::Write(WriteError::Committed)));

        let err: Error = ShutdownError::Timeout { in_flight: 2 }.into();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "shutdown deadline elapsed with 2 request(s) in flight");

        let err: Error = StartError::InvalidState(ServerState::Running).into();
        assert_eq!(err.to_string(), "cannot start a server that is running");
    }

    #[test]
    fn handler_errors_keep_source_and_status() {
        let io = std::io::Error::other("disk on fire");
        let err = Error::handler(io);
        assert_eq!(err.to_string(), "disk on fire");
        assert!(matches!(&err, Error::Handler(h) if h.status().is_none()));
        assert!(std::error::Error::source(&err).is_some());

        let err = Error::with_status(Status::Conflict, "duplicate name");
        assert!(matches!(&err, Error::Handler(h) if h.status() == Some(Status::Conflict)));
    }

    #[test]
    fn bind_errors_wrap_decoder_failures() {
        let decode = serde_json::from_str::<u32>("{").unwrap_err();
        let err: Error = BindError::from(decode).into();
        assert!(matches!(err, Error::Bind(BindError::Json(_))));
    }
}
