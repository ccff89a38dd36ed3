//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Mount both through the [`Health`] handler, or register the functions
//! yourself to swap in a readiness check that gates on dependencies:
//!
//! ```rust
//! use switchyard::{BoxContext, Context, Error, Router, RouterExt, Status, health};
//!
//! fn mount(router: &mut dyn Router) {
//!     router.get("/healthz", health::liveness).get("/readyz", readiness);
//! }
//!
//! async fn readiness(mut ctx: BoxContext) -> Result<(), Error> {
//!     if dependencies_are_healthy().await {
//!         ctx.string(Status::Ok, "ready")
//!     } else {
//!         ctx.string(Status::ServiceUnavailable, "warming up")
//!     }
//! }
//!
//! async fn dependencies_are_healthy() -> bool { true }
//! ```

use crate::context::BoxContext;
use crate::error::Error;
use crate::handler::Handler;
use crate::router::{Router, RouterExt};
use crate::status::Status;

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub async fn liveness(mut ctx: BoxContext) -> Result<(), Error> {
    ctx.string(Status::Ok, "ok")
}

/// Readiness probe (default implementation). Always `200 OK` with body `"ready"`.
pub async fn readiness(mut ctx: BoxContext) -> Result<(), Error> {
    ctx.string(Status::Ok, "ready")
}

/// Registers `/healthz` and `/readyz`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Health;

impl Handler for Health {
    fn register_routes(&self, router: &mut dyn Router) {
        router.get("/healthz", liveness).get("/readyz", readiness);
    }
}
