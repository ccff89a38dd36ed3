//! Reference implementation of the contracts on hyper + matchit + tokio.
//!
//! Enabled by the `adapter` feature (on by default). Applications that bring
//! their own framework can turn it off and keep only the contracts.
//!
//! | Contract | Implementation |
//! |---|---|
//! | [`Server`](crate::Server) | [`HyperServer`] |
//! | [`Router`](crate::Router) | [`RouteTable`] |
//! | [`Context`](crate::Context) | [`RequestContext`] |
//!
//! Handler errors are translated as follows: bind failures answer
//! `400 Bad Request` with the error message, handler errors answer their
//! explicit status (or `500`), anything else answers `500`. Server-error
//! bodies carry only the reason phrase. An error returned after the response
//! was committed is logged and the committed response stands.
//!
//! Path parameters reach handlers percent-decoded. A parameter that does not
//! decode to UTF-8 answers `400 Bad Request` before any handler runs.

mod context;
mod response;
mod routes;
mod server;

pub use context::RequestContext;
pub use routes::RouteTable;
pub use server::{HyperServer, shutdown_signal};
