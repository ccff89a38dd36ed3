//! Handler functions, their type erasure, and route-owning handlers.
//!
//! # How async handlers are stored
//!
//! A router holds handlers of *different* types in one table, so every
//! handler is hidden behind a trait object (`dyn ErasedHandler`):
//!
//! ```text
//! async fn hello(ctx: BoxContext) -> Result<(), Error> { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! hello.into_boxed_handler()                                  ← HandlerFunc blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                                  ← stored as BoxedHandler
//!        ↓
//! handler.call(ctx) at request time                           ← one vtable dispatch
//! ```
//!
//! The per-request cost is one `Arc` clone plus one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::BoxContext;
use crate::error::Error;
use crate::router::Router;

/// A heap-allocated, type-erased handler future.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in [`BoxedHandler`], which router
/// implementations in other crates must be able to store and call.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: BoxContext) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// The shape of a function that serves one matched route.
///
/// You never implement this yourself. It is satisfied by any `async fn` (or
/// closure returning a future) with the signature:
///
/// ```text
/// async fn name(ctx: BoxContext) -> Result<(), Error>
/// ```
///
/// Returning `Err` asks the adapter to turn the error into an HTTP error
/// response; which status it picks is the adapter's policy.
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait HandlerFunc: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(BoxContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
}

impl<F, Fut> HandlerFunc for F
where
    F: Fn(BoxContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(BoxContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn call(&self, ctx: BoxContext) -> BoxFuture {
        Box::pin((self.0)(ctx))
    }
}

/// A component that registers its own routes.
///
/// The composition root hands each `Handler` a [`Router`] without knowing
/// which paths it serves:
///
/// ```rust
/// use switchyard::{BoxContext, Context, Error, Handler, Router, RouterExt, Status};
///
/// struct Users;
///
/// impl Handler for Users {
///     fn register_routes(&self, router: &mut dyn Router) {
///         let mut users = router.group("/users");
///         users.get("/{id}", show);
///     }
/// }
///
/// async fn show(mut ctx: BoxContext) -> Result<(), Error> {
///     let id = ctx.param("id").to_owned();
///     ctx.string(Status::Ok, &id)
/// }
/// ```
pub trait Handler: Send + Sync {
    fn register_routes(&self, router: &mut dyn Router);
}
