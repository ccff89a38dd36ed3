//! Server lifecycle contract.
//!
//! A server moves through three states, never backwards:
//!
//! ```text
//! Unstarted ──start()──▶ Running ──stop()──▶ Stopped
//! ```
//!
//! Calling `start` on a running or stopped server, or `stop` on one that never
//! started, is an error rather than undefined behaviour.

use std::fmt;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Where a [`Server`] is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ServerState {
    Unstarted,
    Running,
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unstarted => "unstarted",
            Self::Running   => "running",
            Self::Stopped   => "stopped",
        })
    }
}

/// Something that listens for HTTP traffic and can be stopped.
///
/// Object-safe, so a composition root can hold a `Box<dyn Server>` and stay
/// ignorant of the framework behind it.
#[async_trait]
pub trait Server: Send + Sync {
    /// Binds the listener and returns without waiting for traffic; requests
    /// are served on a separately spawned task.
    ///
    /// Cancelling `cancel` before the bind completes fails the start with
    /// [`StartError::Cancelled`](crate::StartError::Cancelled); cancelling it
    /// later stops the server from accepting new connections.
    async fn start(&self, cancel: CancellationToken) -> Result<(), Error>;

    /// Stops accepting connections and waits for in-flight requests to finish,
    /// but no later than `deadline`.
    ///
    /// Connections are never cut before the deadline. A deadline that has
    /// already passed yields [`ShutdownError::Timeout`](crate::ShutdownError::Timeout)
    /// without waiting.
    async fn stop(&self, deadline: Instant) -> Result<(), Error>;

    /// The address the server listens on (e.g. `"127.0.0.1:8080"`).
    ///
    /// Only meaningful once `start` has succeeded.
    fn addr(&self) -> String;
}
