//! # switchyard
//!
//! Framework-agnostic contracts for serving HTTP. Application code is
//! written once against these traits; the framework behind them can be
//! swapped without touching a handler.
//!
//! ## The contracts
//!
//! - [`Server`]: start without blocking, stop gracefully within a deadline.
//! - [`Context`]: one request/response pair. Params, query, headers, binding,
//!   and a response that commits exactly once.
//! - [`Router`] / [`HandlerFunc`] / [`Handler`]: per-method routes under
//!   nestable prefixes, mounted by the components that own them.
//! - [`Config`]: host and port.
//! - [`Status`]: every IANA-registered status code.
//!
//! The [`adapter`] module (feature `adapter`, on by default) implements all
//! of them on hyper.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use serde::Serialize;
//! use switchyard::adapter::{HyperServer, RouteTable};
//! use switchyard::{
//!     BoxContext, CancellationToken, Config, Context, ContextExt, Error, Handler, Router,
//!     RouterExt, Server, Status,
//! };
//!
//! #[derive(Serialize)]
//! struct User { id: String }
//!
//! struct Users;
//!
//! impl Handler for Users {
//!     fn register_routes(&self, router: &mut dyn Router) {
//!         router.group("/api").get("/users/{id}", get_user);
//!     }
//! }
//!
//! async fn get_user(mut ctx: BoxContext) -> Result<(), Error> {
//!     let user = User { id: ctx.param("id").to_owned() };
//!     ctx.json(Status::Ok, &user)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let mut routes = RouteTable::new();
//!     Users.register_routes(&mut routes);
//!
//!     let server = HyperServer::new(Config::from_env()?, routes);
//!     server.start(CancellationToken::new()).await?;
//!     switchyard::adapter::shutdown_signal().await;
//!     server.stop(tokio::time::Instant::now() + Duration::from_secs(25)).await
//! }
//! ```

mod config;
mod context;
mod error;
mod handler;
mod method;
mod server;
mod status;

pub mod health;
pub mod router;

#[cfg(feature = "adapter")]
pub mod adapter;

pub use config::{Config, DEFAULT_PORT};
pub use context::{BoxContext, Context, ContextExt, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use error::{BindError, BoxError, Error, HandlerError, ShutdownError, StartError, WriteError};
pub use handler::{BoxFuture, BoxedHandler, Handler, HandlerFunc};
#[doc(hidden)]
pub use handler::ErasedHandler;
pub use method::{Method, UnknownMethod};
pub use router::{Router, RouterExt};
pub use server::{Server, ServerState};
pub use status::{Status, UnknownStatus};
pub use tokio_util::sync::CancellationToken;
